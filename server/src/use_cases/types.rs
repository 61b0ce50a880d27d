//! Commands accepted by the orchestrator actor, and its replies.

use protocol::GameStateDto;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum ActorMessage {
    Connect {
        client_id: String,
        requested_player_id: Option<String>,
        outbox: mpsc::Sender<String>,
        reply: oneshot::Sender<ConnectReply>,
    },
    Move {
        client_id: String,
        dx: i32,
        dy: i32,
    },
    Disconnect {
        client_id: String,
    },
}

#[derive(Debug, Clone)]
pub enum ConnectReply {
    Spawned {
        player_id: String,
        player_name: String,
        game_state: GameStateDto,
    },
    Waiting {
        message: String,
    },
}
