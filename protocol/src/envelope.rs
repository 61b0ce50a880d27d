//! The message envelope all client/server frames are wrapped in.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// The three wire message types this protocol knows about.
pub const CONNECT: &str = "CONNECT";
pub const MOVE: &str = "MOVE";
pub const STATE_UPDATE: &str = "STATE_UPDATE";

/// `{ type, payload, timestamp, clientId? }` as specified on the wire.
///
/// `payload` is kept as a raw [`serde_json::Value`] here; the typed
/// [`crate::message::ClientMessage`] / [`crate::message::ServerMessage`]
/// conversions select the concrete payload shape from `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub payload: serde_json::Value,
    pub timestamp: i64,
    #[serde(rename = "clientId", skip_serializing_if = "Option::is_none", default)]
    pub client_id: Option<String>,
}

/// Failures decoding a raw frame into an [`Envelope`].
///
/// Every case here maps to the single `ProtocolParseError` kind: the
/// frame is logged and dropped, nothing propagates past the caller.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl Envelope {
    /// Parses a raw text frame. Fails if the JSON is invalid, the
    /// top-level value isn't an object, or `type`/`payload`/`timestamp`
    /// are missing or wrong-typed — all of which `serde_json` already
    /// rejects for this struct shape.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(text).map_err(EnvelopeError::InvalidJson)
    }

    /// Builds an envelope, always stamping `timestamp = now_ms()`.
    pub fn build(message_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
            timestamp: now_ms(),
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::InvalidJson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_type_payload_timestamp() {
        let env = Envelope::build(MOVE, serde_json::json!({"dx": 1, "dy": 0}));
        let text = env.to_json().unwrap();
        let decoded = Envelope::parse(&text).unwrap();
        assert_eq!(decoded.message_type, env.message_type);
        assert_eq!(decoded.payload, env.payload);
        assert_eq!(decoded.timestamp, env.timestamp);
    }

    #[test]
    fn rejects_non_object_top_level() {
        assert!(Envelope::parse("[1,2,3]").is_err());
    }

    #[test]
    fn rejects_missing_required_field() {
        assert!(Envelope::parse(r#"{"type":"MOVE","payload":{}}"#).is_err());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(Envelope::parse("{not json").is_err());
    }
}
