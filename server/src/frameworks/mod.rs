// Outermost layer: process bootstrap, configuration, and disk I/O.

pub mod board_loader;
pub mod config;
pub mod server;

pub use config::Config;
