//! `ClientSession`: the WebSocket connection to the server, with an
//! outbound queue for frames sent while the socket isn't OPEN and an
//! exponential-backoff reconnect loop (spec §4.8).
//!
//! Built over `tokio-tungstenite`, matching the teacher's WebSocket
//! stack on the server side. Observers replace the source's callback
//! chains with a single trait (spec §9, "Callback chains").

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use protocol::{ClientMessage as WireClientMessage, CONNECT, ConnectAck, Envelope, GameStateDto, MOVE, STATE_UPDATE};

use crate::config::{backoff_delay, ClientConfig};

/// Callbacks a terminal UI (or any other collaborator) implements to
/// react to session lifecycle events. Every method has a default no-op
/// body, so implementers only override what they need.
pub trait SessionObserver: Send + Sync {
    fn on_open(&self) {}
    fn on_connect_response(&self, _ack: &ConnectAck) {}
    fn on_state_update(&self, _state: &GameStateDto) {}
    fn on_close(&self) {}
    fn on_error(&self, _message: &str) {}
}

enum Command {
    Send(String),
    Close,
}

/// A handle to a running session task. Cloning shares the same
/// outbound mailbox; dropping every handle does not close the socket
/// (call [`ClientSession::close`] explicitly).
#[derive(Clone)]
pub struct ClientSession {
    commands: mpsc::UnboundedSender<Command>,
}

impl ClientSession {
    /// Spawns the connect/reconnect loop on the current Tokio runtime
    /// and returns immediately with a handle to it.
    pub fn connect(config: ClientConfig, observer: Arc<dyn SessionObserver>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(config, observer, rx));
        Self { commands: tx }
    }

    /// Queues a raw envelope for delivery. If the socket is not
    /// currently OPEN the frame waits in the session's outbound queue
    /// and is flushed FIFO once it reconnects (spec §4.8, "Outbound
    /// queue").
    pub fn send(&self, envelope: &Envelope) {
        match envelope.to_json() {
            Ok(text) => {
                let _ = self.commands.send(Command::Send(text));
            }
            Err(err) => warn!(error = %err, "failed to serialize outgoing envelope"),
        }
    }

    pub fn send_move(&self, dx: i32, dy: i32) {
        let envelope = Envelope::build(MOVE, serde_json::json!({ "dx": dx, "dy": dy }));
        self.send(&envelope);
    }

    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

async fn run(config: ClientConfig, observer: Arc<dyn SessionObserver>, mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut pending: VecDeque<String> = VecDeque::new();
    let mut known_player_id: Option<String> = None;
    let mut attempt: u32 = 0;

    loop {
        match tokio_tungstenite::connect_async(&config.server_url).await {
            Ok((stream, _response)) => {
                info!(url = %config.server_url, "websocket connected");
                observer.on_open();

                let connect_payload = match &known_player_id {
                    Some(player_id) => serde_json::json!({ "playerId": player_id }),
                    None => serde_json::json!({}),
                };
                if let Ok(text) = Envelope::build(CONNECT, connect_payload).to_json() {
                    pending.push_back(text);
                }

                let closed_cleanly = run_connection(
                    stream,
                    &mut pending,
                    &mut commands,
                    observer.as_ref(),
                    &mut known_player_id,
                    &mut attempt,
                )
                .await;

                if closed_cleanly {
                    observer.on_close();
                    return;
                }
            }
            Err(err) => {
                observer.on_error(&err.to_string());
            }
        }

        if !config.reconnect.enabled {
            observer.on_close();
            return;
        }

        attempt += 1;
        if attempt > config.reconnect.max_attempts {
            warn!(attempts = attempt - 1, "giving up after exhausting reconnect attempts");
            observer.on_close();
            return;
        }

        let delay = backoff_delay(&config.reconnect, attempt);
        debug!(attempt, delay_ms = delay.as_millis(), "reconnecting after backoff");
        tokio::time::sleep(delay).await;
    }
}

/// Drives one live connection until it closes (by the peer, by error,
/// or by an explicit `Command::Close`). Returns `true` if the caller
/// asked to close (no reconnect should follow), `false` if the socket
/// dropped unexpectedly (the caller should reconnect).
async fn run_connection(
    stream: tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    pending: &mut VecDeque<String>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    observer: &dyn SessionObserver,
    known_player_id: &mut Option<String>,
    attempt: &mut u32,
) -> bool {
    let (mut write, mut read) = stream.split();

    loop {
        while let Some(text) = pending.pop_front() {
            if let Err(err) = write.send(WsMessage::Text(text.clone().into())).await {
                observer.on_error(&err.to_string());
                pending.push_front(text);
                return false;
            }
        }

        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(Command::Send(text)) => pending.push_back(text),
                    Some(Command::Close) | None => {
                        let _ = write.close().await;
                        return true;
                    }
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_incoming(&text, observer, known_player_id, attempt);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return false,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        observer.on_error(&err.to_string());
                        return false;
                    }
                }
            }
        }
    }
}

fn handle_incoming(
    text: &str,
    observer: &dyn SessionObserver,
    known_player_id: &mut Option<String>,
    attempt: &mut u32,
) {
    let envelope = match Envelope::parse(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "dropping unparseable frame from server");
            return;
        }
    };

    match envelope.message_type.as_str() {
        CONNECT => match serde_json::from_value::<ConnectAck>(envelope.payload.clone()) {
            Ok(ack) => {
                if let ConnectAck::Spawned { player_id, .. } = &ack {
                    *known_player_id = Some(player_id.clone());
                }
                // A handshake reply of any kind confirms the session is
                // alive; reset the backoff counter (spec §4.8, "Reset
                // the attempt counter on successful reconnect").
                *attempt = 0;
                observer.on_connect_response(&ack);
            }
            Err(err) => warn!(error = %err, "invalid CONNECT payload from server"),
        },
        STATE_UPDATE => match serde_json::from_value::<GameStateDto>(envelope.payload.clone()) {
            Ok(state) => observer.on_state_update(&state),
            Err(err) => warn!(error = %err, "invalid STATE_UPDATE payload from server"),
        },
        other => {
            // Client messages reaching this point would just be echoes;
            // anything the server shouldn't be sending is logged and
            // dropped, matching the unknown-type policy in spec §4.5.
            debug!(message_type = other, "ignoring unexpected message type from server");
        }
    }
}

/// Builds the client's own `ClientMessage::Move` for symmetry with the
/// server's typed decode path; primarily useful in tests that assert
/// what gets sent without going through JSON.
pub fn move_message(dx: i32, dy: i32) -> WireClientMessage {
    WireClientMessage::Move(protocol::MovePayload { dx, dy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        opens: AtomicUsize,
        closes: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl SessionObserver for RecordingObserver {
        fn on_open(&self) {
            self.opens.fetch_add(1, Ordering::SeqCst);
        }
        fn on_close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    #[tokio::test]
    async fn exhausting_reconnect_attempts_reports_close_without_a_reachable_server() {
        let observer = Arc::new(RecordingObserver::default());
        let config = ClientConfig {
            server_url: "ws://127.0.0.1:1/ws".to_string(),
            reconnect: crate::config::ReconnectConfig {
                enabled: true,
                max_attempts: 2,
                retry_delay: std::time::Duration::from_millis(1),
                max_retry_delay: std::time::Duration::from_millis(2),
                exponential_backoff: false,
            },
            interpolation_delay: std::time::Duration::from_millis(150),
            interpolation_tick: std::time::Duration::from_millis(50),
            periodic_reconciliation_interval: std::time::Duration::from_millis(5000),
            display_easing: true,
        };

        run(config, observer.clone(), mpsc::unbounded_channel().1).await;

        assert_eq!(observer.closes.load(Ordering::SeqCst), 1);
        assert!(observer.errors.lock().unwrap().len() >= 3);
    }

    #[test]
    fn move_message_builds_the_expected_payload() {
        assert_eq!(
            move_message(1, -1),
            WireClientMessage::Move(protocol::MovePayload { dx: 1, dy: -1 })
        );
    }
}
