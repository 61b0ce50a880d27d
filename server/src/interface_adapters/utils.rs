//! Process-unique id generation for clients and freshly spawned players.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// A monotonically increasing counter seeded from wall-clock time, so ids
/// stay unique even when several are minted within the same instant.
fn next_sequence() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(now_nanos()));
    counter.fetch_add(1, Ordering::Relaxed)
}

pub fn rand_client_id() -> String {
    format!("c{:x}", next_sequence())
}

pub fn rand_player_id() -> String {
    format!("p{:x}", next_sequence())
}

/// The wire protocol has no client-supplied display name (spec §4.5);
/// the server mints one so `playerName` is always present.
pub fn default_player_name() -> String {
    format!("Player-{}", next_sequence() % 10_000)
}
