//! The single task that owns [`GameCore`] and [`ConnectionRegistry`]
//! exclusively. Every mutation of game state and every broadcast flows
//! through this actor's mailbox, so no mutex is needed (spec §6,
//! "Server scheduling model").

use std::time::Duration;

use protocol::ServerMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::interface_adapters::registry::ConnectionRegistry;
use crate::interface_adapters::utils::{default_player_name, rand_player_id};
use crate::use_cases::game_core::GameCore;
use crate::use_cases::types::{ActorMessage, ConnectReply};

pub const BROADCAST_INTERVAL: Duration = Duration::from_millis(250);

fn state_update_text(game: &GameCore) -> Option<String> {
    let state = game.serialize_state();
    match ServerMessage::StateUpdate(state).to_envelope().to_json() {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(error = %err, "failed to serialize STATE_UPDATE");
            None
        }
    }
}

fn connect_envelope_text(client_id: &str, reply: &ConnectReply) -> Option<String> {
    let ack = match reply {
        ConnectReply::Spawned {
            player_id,
            player_name,
            game_state,
        } => protocol::ConnectAck::Spawned {
            client_id: client_id.to_string(),
            player_id: player_id.clone(),
            player_name: player_name.clone(),
            game_state: game_state.clone(),
        },
        ConnectReply::Waiting { message } => protocol::ConnectAck::Waiting {
            client_id: client_id.to_string(),
            waiting_for_spawn: true,
            message: message.clone(),
        },
    };
    match ServerMessage::Connect(ack).to_envelope().to_json() {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(error = %err, "failed to serialize CONNECT acknowledgement");
            None
        }
    }
}

fn broadcast(game: &mut GameCore, registry: &ConnectionRegistry) {
    if registry.is_empty() {
        return;
    }
    let Some(text) = state_update_text(game) else {
        return;
    };

    let mut sent = 0usize;
    for conn in registry.all() {
        conn.send(text.clone());
        sent += 1;
    }
    debug!(connections = sent, "broadcast STATE_UPDATE");
    game.clear_collisions();
}

/// Notifies a client that was waiting for a spawn that it can now play,
/// mirroring the initial CONNECT acknowledgement shape (spec §4.6,
/// "On socket close").
fn notify_newly_spawned(game: &GameCore, registry: &ConnectionRegistry, player_id: &str) {
    let Some(conn) = registry.by_player_id(player_id) else {
        return;
    };
    let player_name = game.player_name(player_id).unwrap_or_default();
    let reply = ConnectReply::Spawned {
        player_id: player_id.to_string(),
        player_name,
        game_state: game.serialize_state(),
    };
    if let Some(text) = connect_envelope_text(&conn.client_id, &reply) {
        conn.send(text);
    }
}

pub async fn run(
    mut game: GameCore,
    mut mailbox: mpsc::Receiver<ActorMessage>,
    broadcast_interval: Duration,
) {
    let mut registry = ConnectionRegistry::new();
    let mut ticker = tokio::time::interval(broadcast_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = mailbox.recv() => {
                let Some(message) = message else {
                    info!("orchestrator mailbox closed; shutting down");
                    break;
                };
                handle_message(&mut game, &mut registry, message);
            }
            _ = ticker.tick() => {
                broadcast(&mut game, &registry);
            }
        }
    }
}

fn handle_message(game: &mut GameCore, registry: &mut ConnectionRegistry, message: ActorMessage) {
    match message {
        ActorMessage::Connect {
            client_id,
            requested_player_id,
            outbox,
            reply,
        } => {
            registry.add(client_id.clone(), outbox);

            let player_id = match requested_player_id {
                Some(id) if !game.has_player(&id) => id,
                Some(_) | None => rand_player_id(),
            };
            let player_name = default_player_name();

            let outcome = game.add_player(player_id.clone(), player_name.clone());
            registry.set_player_id(&client_id, player_id.clone());

            let connect_reply = if outcome.spawned {
                ConnectReply::Spawned {
                    player_id,
                    player_name,
                    game_state: game.serialize_state(),
                }
            } else {
                ConnectReply::Waiting {
                    message: game.wait_message().to_string(),
                }
            };

            let _ = reply.send(connect_reply);
        }
        ActorMessage::Move { client_id, dx, dy } => {
            let Some(player_id) = registry
                .by_client_id(&client_id)
                .and_then(|c| c.player_id.clone())
            else {
                warn!(client_id = %client_id, "MOVE from a client with no assigned player");
                return;
            };
            let _ = game.validate_and_apply(&player_id, dx, dy);
        }
        ActorMessage::Disconnect { client_id } => {
            let player_id = registry.remove(&client_id);
            if let Some(player_id) = &player_id {
                game.remove_player(player_id);
            }
            info!(client_id = %client_id, player_id = ?player_id, "client disconnected");

            for newly_spawned in game.try_spawn_waiting() {
                notify_newly_spawned(game, registry, &newly_spawned);
            }
        }
    }
}
