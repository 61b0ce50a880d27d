//! Client-side pieces that are in scope for this spec: the WebSocket
//! session with reconnect, local-player prediction/reconciliation, and
//! remote-entity interpolation. Terminal rendering itself is the only
//! externally owned collaborator (spec §1).

pub mod board_view;
pub mod config;
pub mod interpolation;
pub mod prediction;
pub mod session;

pub use board_view::BoardView;
pub use config::{backoff_delay, ClientConfig, ReconnectConfig};
pub use interpolation::{InterpolationEngine, RemoteRenderUpdate, Snapshot};
pub use prediction::{PredictionEngine, ReconcileOutcome};
pub use session::{ClientSession, SessionObserver};
