//! Collision events recorded when a move is rejected against a wall or
//! another player. Cleared from [`crate::use_cases::game_core::GameCore`]
//! only after a successful broadcast (see spec §8, "collision clearing").

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    PlayerCollision,
    WallCollision,
}

#[derive(Debug, Clone)]
pub struct CollisionEvent {
    pub kind: CollisionKind,
    pub player_id: String,
    /// The cell the move attempted to enter.
    pub x: i32,
    pub y: i32,
}
