//! A connected player and its position on the board.

/// Opaque unique identifier assigned by [`crate::use_cases::game_core::GameCore`]
/// on join (or supplied by a reconnecting client).
pub type PlayerId = String;

#[derive(Debug, Clone)]
pub struct Player {
    pub player_id: PlayerId,
    pub player_name: String,
    /// `None` while waiting for a free spawn point.
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub last_x: Option<i32>,
    pub last_y: Option<i32>,
    /// Epoch milliseconds of the last accepted move, used to derive velocity.
    pub last_t: Option<i64>,
}

impl Player {
    pub fn waiting(player_id: PlayerId, player_name: String) -> Self {
        Self {
            player_id,
            player_name,
            x: None,
            y: None,
            last_x: None,
            last_y: None,
            last_t: None,
        }
    }

    pub fn is_spawned(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    pub fn occupies(&self, x: i32, y: i32) -> bool {
        self.x == Some(x) && self.y == Some(y)
    }
}
