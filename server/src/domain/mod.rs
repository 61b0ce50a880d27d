// Domain layer: the board, players, and collision events that make up
// the authoritative game world. No I/O, no async, no wire formats.

pub mod board;
pub mod collision;
pub mod player;

pub use board::{Board, Cell, SpawnPoint};
pub use collision::{CollisionEvent, CollisionKind};
pub use player::{Player, PlayerId};
