//! The WebSocket route: per-connection socket plumbing that forwards
//! parsed client frames to the orchestrator actor and forwards the
//! actor's outbound queue back out over the socket.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::SinkExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, info_span, warn};

use protocol::{ClientMessage, Envelope};

use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rand_client_id;
use crate::use_cases::ActorMessage;

/// Outbound mailbox capacity per connection. A slow client can fall
/// behind by this many queued frames before new ones are dropped
/// (spec §6, "Backpressure" — dropping a stale STATE_UPDATE is fine,
/// the next broadcast is authoritative).
const OUTBOX_CAPACITY: usize = 32;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let client_id = rand_client_id();
    let span = info_span!("conn", client_id = %client_id);
    let _enter = span.enter();

    let (outbox_tx, mut outbox_rx) = mpsc::channel::<String>(OUTBOX_CAPACITY);
    let mut connected = false;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(incoming) = incoming else {
                    break;
                };
                let Ok(incoming) = incoming else {
                    break;
                };
                match incoming {
                    Message::Text(text) => {
                        if !connected {
                            if !handle_first_message(&text, &client_id, &state, &outbox_tx, &mut socket).await {
                                continue;
                            }
                            connected = true;
                        } else {
                            handle_subsequent_message(&text, &client_id, &state).await;
                        }
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
                }
            }
            outgoing = outbox_rx.recv() => {
                let Some(outgoing) = outgoing else {
                    break;
                };
                if socket.send(Message::Text(outgoing.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    if connected {
        let _ = state
            .actor_tx
            .send(ActorMessage::Disconnect {
                client_id: client_id.clone(),
            })
            .await;
    }
    info!("socket closed");
}

/// The connection is only "live" (eligible for MOVE / broadcasts) once
/// the client has sent its first CONNECT frame (spec §4.6, "assign a
/// fresh clientId; send an initial CONNECT ack only in response to the
/// client's CONNECT message"). Returns whether a CONNECT was accepted.
async fn handle_first_message(
    text: &str,
    client_id: &str,
    state: &Arc<AppState>,
    outbox_tx: &mpsc::Sender<String>,
    socket: &mut WebSocket,
) -> bool {
    let envelope = match Envelope::parse(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "dropping unparseable frame before CONNECT");
            return false;
        }
    };

    let message = match ClientMessage::from_envelope(&envelope) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "dropping invalid frame before CONNECT");
            return false;
        }
    };

    let ClientMessage::Connect(request) = message else {
        warn!("first message from client was not CONNECT; dropping");
        return false;
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    if state
        .actor_tx
        .send(ActorMessage::Connect {
            client_id: client_id.to_string(),
            requested_player_id: request.player_id,
            outbox: outbox_tx.clone(),
            reply: reply_tx,
        })
        .await
        .is_err()
    {
        warn!("orchestrator mailbox closed; cannot complete CONNECT");
        return false;
    }

    let Ok(reply) = reply_rx.await else {
        warn!("orchestrator dropped the CONNECT reply");
        return false;
    };

    let ack = match reply {
        crate::use_cases::ConnectReply::Spawned {
            player_id,
            player_name,
            game_state,
        } => protocol::ConnectAck::Spawned {
            client_id: client_id.to_string(),
            player_id,
            player_name,
            game_state,
        },
        crate::use_cases::ConnectReply::Waiting { message } => protocol::ConnectAck::Waiting {
            client_id: client_id.to_string(),
            waiting_for_spawn: true,
            message,
        },
    };

    match protocol::ServerMessage::Connect(ack).to_envelope().to_json() {
        Ok(text) => {
            if socket.send(Message::Text(text.into())).await.is_err() {
                return false;
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to serialize CONNECT acknowledgement");
            return false;
        }
    }

    info!("client connected");
    true
}

async fn handle_subsequent_message(text: &str, client_id: &str, state: &Arc<AppState>) {
    let envelope = match Envelope::parse(text) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "dropping unparseable frame");
            return;
        }
    };

    match ClientMessage::from_envelope(&envelope) {
        Ok(ClientMessage::Move(mv)) => {
            let _ = state
                .actor_tx
                .send(ActorMessage::Move {
                    client_id: client_id.to_string(),
                    dx: mv.dx,
                    dy: mv.dy,
                })
                .await;
        }
        Ok(ClientMessage::Connect(_)) => {
            // Duplicate CONNECTs after the handshake are ignored; the
            // session is already established.
            warn!("ignoring duplicate CONNECT after handshake");
        }
        Err(err) => {
            warn!(error = %err, "dropping frame of unknown or invalid type");
        }
    }
}
