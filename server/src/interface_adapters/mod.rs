// Adapters between the outside world (WebSocket sockets) and the
// use-case layer: connection bookkeeping and the axum route handler.

pub mod net;
pub mod registry;
pub mod state;
pub mod utils;

pub use state::AppState;
