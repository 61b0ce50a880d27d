//! Typed payload variants selected by an [`Envelope`]'s `type` field.
//!
//! The original wire format is dynamically shaped JSON; per the redesign
//! note in the spec this module gives each message a concrete Rust type
//! instead of passing `serde_json::Value` past the envelope boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::{CONNECT, Envelope, MOVE, STATE_UPDATE};

/// Failures turning a parsed [`Envelope`] into a typed message.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("invalid payload for {message_type}: {source}")]
    InvalidPayload {
        message_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Client -> server CONNECT payload. Both fields are optional: a fresh
/// client sends `{}`, a reconnecting client includes its known `playerId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectRequest {
    #[serde(rename = "playerId", default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
}

/// Client -> server MOVE payload.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovePayload {
    pub dx: i32,
    pub dy: i32,
}

/// A single accumulated collision event, included in `STATE_UPDATE`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollisionDto {
    pub kind: CollisionKind,
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CollisionKind {
    #[serde(rename = "PLAYER_COLLISION")]
    PlayerCollision,
    #[serde(rename = "WALL_COLLISION")]
    WallCollision,
}

/// One player's view in a game state / world update snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerDto {
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub x: Option<i32>,
    pub y: Option<i32>,
    #[serde(rename = "playerName")]
    pub player_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
}

/// Board dimensions + grid as included in a game state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardDto {
    pub width: u32,
    pub height: u32,
    pub grid: Vec<Vec<char>>,
}

/// Full authoritative game state: the payload of both `STATE_UPDATE` and
/// the `CONNECT` acknowledgement sent to a client that was spawned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStateDto {
    pub board: BoardDto,
    pub players: Vec<PlayerDto>,
    pub score: i64,
    #[serde(rename = "hasCollisions")]
    pub has_collisions: bool,
    pub collisions: Vec<CollisionDto>,
}

/// Server -> client CONNECT acknowledgement: either the client was
/// spawned immediately, or it is held waiting for a free spawn point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConnectAck {
    Spawned {
        #[serde(rename = "clientId")]
        client_id: String,
        #[serde(rename = "playerId")]
        player_id: String,
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(rename = "gameState")]
        game_state: GameStateDto,
    },
    Waiting {
        #[serde(rename = "clientId")]
        client_id: String,
        #[serde(rename = "waitingForSpawn")]
        waiting_for_spawn: bool,
        message: String,
    },
}

/// Typed client -> server messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Connect(ConnectRequest),
    Move(MovePayload),
}

impl ClientMessage {
    /// Decodes a parsed envelope's payload according to its `type`.
    /// Unknown types are the caller's responsibility to log-and-ignore.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, MessageError> {
        match envelope.message_type.as_str() {
            CONNECT => {
                // An empty object is a valid CONNECT payload.
                let request = if envelope.payload.is_null() {
                    ConnectRequest::default()
                } else {
                    serde_json::from_value(envelope.payload.clone()).map_err(|source| {
                        MessageError::InvalidPayload {
                            message_type: CONNECT,
                            source,
                        }
                    })?
                };
                Ok(ClientMessage::Connect(request))
            }
            MOVE => serde_json::from_value(envelope.payload.clone())
                .map(ClientMessage::Move)
                .map_err(|source| MessageError::InvalidPayload {
                    message_type: MOVE,
                    source,
                }),
            other => Err(MessageError::UnknownType(other.to_string())),
        }
    }
}

/// Typed server -> client messages, each knowing its own envelope type.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Connect(ConnectAck),
    StateUpdate(GameStateDto),
}

impl ServerMessage {
    pub fn to_envelope(&self) -> Envelope {
        let (message_type, payload) = match self {
            ServerMessage::Connect(ack) => (CONNECT, serde_json::to_value(ack)),
            ServerMessage::StateUpdate(state) => (STATE_UPDATE, serde_json::to_value(state)),
        };
        // Constructing these DTOs from our own typed data can't fail to
        // serialize; an error here would be a programming mistake.
        let payload = payload.expect("server message payload always serializes");
        Envelope::build(message_type, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_request_defaults_to_empty() {
        let env = Envelope::build(CONNECT, serde_json::Value::Null);
        let msg = ClientMessage::from_envelope(&env).unwrap();
        assert_eq!(msg, ClientMessage::Connect(ConnectRequest::default()));
    }

    #[test]
    fn connect_request_with_reconnect_id() {
        let env = Envelope::build(CONNECT, serde_json::json!({"playerId": "p1"}));
        let msg = ClientMessage::from_envelope(&env).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Connect(ConnectRequest {
                player_id: Some("p1".to_string())
            })
        );
    }

    #[test]
    fn move_payload_round_trips() {
        let env = Envelope::build(MOVE, serde_json::json!({"dx": -1, "dy": 1}));
        let msg = ClientMessage::from_envelope(&env).unwrap();
        assert_eq!(msg, ClientMessage::Move(MovePayload { dx: -1, dy: 1 }));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let env = Envelope::build("PING", serde_json::json!({}));
        assert!(matches!(
            ClientMessage::from_envelope(&env),
            Err(MessageError::UnknownType(t)) if t == "PING"
        ));
    }

    #[test]
    fn connect_ack_waiting_serializes_flat() {
        let ack = ConnectAck::Waiting {
            client_id: "c1".to_string(),
            waiting_for_spawn: true,
            message: "hold on".to_string(),
        };
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value["clientId"], "c1");
        assert_eq!(value["waitingForSpawn"], true);
        assert_eq!(value["message"], "hold on");
    }
}
