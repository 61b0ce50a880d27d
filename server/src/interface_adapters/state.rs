use tokio::sync::mpsc;

use crate::use_cases::ActorMessage;

/// Shared axum state: a handle to the orchestrator actor's mailbox.
#[derive(Clone)]
pub struct AppState {
    pub actor_tx: mpsc::Sender<ActorMessage>,
}
