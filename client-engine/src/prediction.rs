//! Client-side optimistic movement for the local player, reconciled
//! against the authoritative position on every `STATE_UPDATE` and on a
//! periodic fallback timer (spec §4.9).

use protocol::GameStateDto;

use crate::board_view::BoardView;

/// Outcome of reconciling predicted state against a fresh server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// The predicted position snapped to the server's authoritative
    /// value because the two disagreed.
    pub snapped: bool,
    /// The server reported a collision this tick; the caller should
    /// force a redraw of every remote player even if their cell didn't
    /// move, so none of them visually disappear (spec §4.9, item 2).
    pub force_redraw_remotes: bool,
}

/// Tracks the local player's predicted position and the latest position
/// the server has confirmed, applying one-cell-at-a-time optimistic
/// moves ahead of the server's acknowledgement.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    local_player_id: Option<String>,
    predicted: Option<(i32, i32)>,
    server_position: Option<(i32, i32)>,
    board: Option<BoardView>,
    enabled: bool,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionEngine {
    pub fn new() -> Self {
        Self {
            local_player_id: None,
            predicted: None,
            server_position: None,
            board: None,
            enabled: true,
        }
    }

    /// Disabling prediction makes `apply_state_update` always snap to
    /// the server position (useful for a "no prediction" debug mode).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_local_player(&mut self, player_id: impl Into<String>) {
        self.local_player_id = Some(player_id.into());
    }

    pub fn predicted_position(&self) -> Option<(i32, i32)> {
        self.predicted
    }

    /// Validates a movement input against the locally held board and
    /// the server-known positions of other players, exactly mirroring
    /// `GameCore::validate_and_apply`'s bounds/wall/occupancy checks
    /// (spec §4.9, transition 1). Returns the new predicted position
    /// when the move is accepted locally and should be sent to the
    /// server; returns `None` (and leaves state untouched) otherwise.
    pub fn try_move(&mut self, dx: i32, dy: i32, other_positions: &[(i32, i32)]) -> Option<(i32, i32)> {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            return None;
        }
        let (x, y) = self.predicted?;
        let (nx, ny) = (x + dx, y + dy);

        let board = self.board.as_ref()?;
        if !board.in_bounds(nx, ny) || board.is_wall(nx, ny) {
            return None;
        }
        if other_positions.contains(&(nx, ny)) {
            return None;
        }

        self.predicted = Some((nx, ny));
        Some((nx, ny))
    }

    /// Folds a fresh `STATE_UPDATE` (or join-time `gameState`) into the
    /// engine: updates the locally held board, the server's reported
    /// local-player position, and reconciles the prediction against it.
    pub fn apply_state_update(&mut self, state: &GameStateDto) -> ReconcileOutcome {
        self.board = Some(BoardView::from_dto(&state.board));

        let force_redraw_remotes = state.has_collisions || !state.collisions.is_empty();

        let Some(local_id) = &self.local_player_id else {
            return ReconcileOutcome {
                snapped: false,
                force_redraw_remotes,
            };
        };

        let Some(player) = state.players.iter().find(|p| &p.player_id == local_id) else {
            return ReconcileOutcome {
                snapped: false,
                force_redraw_remotes,
            };
        };

        let server_position = match (player.x, player.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        };
        self.server_position = server_position;

        if self.predicted.is_none() {
            self.predicted = server_position;
            return ReconcileOutcome {
                snapped: false,
                force_redraw_remotes,
            };
        }

        let snapped = self.enabled && server_position.is_some() && server_position != self.predicted;
        if !self.enabled || snapped {
            self.predicted = server_position;
        }

        ReconcileOutcome {
            snapped,
            force_redraw_remotes,
        }
    }

    /// The periodic reconciliation fallback (spec §4.9, transition 3):
    /// compares predicted to the last-known server position even when
    /// no `STATE_UPDATE` triggered a mismatch, to recover from drift.
    pub fn reconcile_periodic(&mut self) -> ReconcileOutcome {
        let snapped = self.enabled
            && self.server_position.is_some()
            && self.server_position != self.predicted;
        if snapped {
            self.predicted = self.server_position;
        }
        ReconcileOutcome {
            snapped,
            force_redraw_remotes: false,
        }
    }
}
