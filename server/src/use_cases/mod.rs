// Application logic: the game rules and orchestration that sit between
// the domain model and the network/framework adapters.

pub mod event_bus;
pub mod game_core;
pub mod orchestrator;
pub mod spawn_admission;
pub mod types;

pub use event_bus::{BusEvent, EventBus, Scope};
pub use game_core::{AddPlayerOutcome, GameCore, MoveOutcome, MoveRejectReason};
pub use spawn_admission::SpawnConfig;
pub use types::{ActorMessage, ConnectReply};
