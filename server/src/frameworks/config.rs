//! Runtime configuration, read once at startup from environment
//! variables (with an optional `.env` file) plus the `--board` flag.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::use_cases::SpawnConfig;

pub const DEFAULT_BOARD_PATH: &str = "assets/boards/classic.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub board_path: PathBuf,
    pub spawn: SpawnConfig,
    pub broadcast_interval: Duration,
}

impl Config {
    /// Reads configuration from the environment, applying `board_path`
    /// on top of `GRID_SERVER_BOARD` if the caller passed `--board` on
    /// the command line.
    pub fn from_env(board_path_override: Option<PathBuf>) -> Self {
        let host = env::var("GAME_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("GAME_SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3030);

        let board_path = board_path_override
            .or_else(|| env::var("GRID_SERVER_BOARD").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOARD_PATH));

        let max_count = env::var("GRID_SERVER_SPAWN_MAX_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(25);
        let clear_radius = env::var("GRID_SERVER_SPAWN_CLEAR_RADIUS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let wait_message = env::var("GRID_SERVER_WAIT_MESSAGE")
            .unwrap_or_else(|_| "Waiting for a free spawn point...".to_string());

        let broadcast_interval_ms = env::var("BROADCAST_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(250);

        Self {
            host,
            port,
            board_path,
            spawn: SpawnConfig {
                max_count,
                clear_radius,
                wait_message,
            },
            broadcast_interval: Duration::from_millis(broadcast_interval_ms),
        }
    }
}
