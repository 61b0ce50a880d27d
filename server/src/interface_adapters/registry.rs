//! Tracks which socket belongs to which client, and which client has
//! which player. Owned exclusively by the orchestrator actor alongside
//! [`crate::use_cases::GameCore`] — no locking, single-writer discipline
//! (spec §6, "Server scheduling model").

use std::collections::HashMap;

use tokio::sync::mpsc;

/// A connected socket's outbound half: framed JSON strings pushed here
/// are forwarded to the client by its connection task. Also doubles as
/// the "queue while not yet OPEN" slot — axum only ever hands us an
/// already-open socket, so in practice this just buffers if the
/// connection task is momentarily behind on draining its mailbox.
pub struct Connection {
    pub client_id: String,
    pub player_id: Option<String>,
    outbox: mpsc::Sender<String>,
}

impl Connection {
    pub fn send(&self, text: String) {
        if self.outbox.try_send(text).is_err() {
            tracing::warn!(client_id = %self.client_id, "outbound queue full or closed; dropping message");
        }
    }
}

#[derive(Default)]
pub struct ConnectionRegistry {
    by_client: HashMap<String, Connection>,
    client_of_player: HashMap<String, String>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, client_id: String, outbox: mpsc::Sender<String>) {
        self.by_client.insert(
            client_id.clone(),
            Connection {
                client_id,
                player_id: None,
                outbox,
            },
        );
    }

    /// Removing a clientId also clears its playerId mapping.
    pub fn remove(&mut self, client_id: &str) -> Option<String> {
        let conn = self.by_client.remove(client_id)?;
        if let Some(player_id) = &conn.player_id {
            self.client_of_player.remove(player_id);
        }
        conn.player_id
    }

    pub fn set_player_id(&mut self, client_id: &str, player_id: String) {
        if let Some(conn) = self.by_client.get_mut(client_id) {
            if let Some(old) = conn.player_id.replace(player_id.clone()) {
                self.client_of_player.remove(&old);
            }
            self.client_of_player.insert(player_id, client_id.to_string());
        }
    }

    pub fn by_client_id(&self, client_id: &str) -> Option<&Connection> {
        self.by_client.get(client_id)
    }

    pub fn by_player_id(&self, player_id: &str) -> Option<&Connection> {
        let client_id = self.client_of_player.get(player_id)?;
        self.by_client.get(client_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Connection> {
        self.by_client.values()
    }

    pub fn len(&self) -> usize {
        self.by_client.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_client.is_empty()
    }
}
