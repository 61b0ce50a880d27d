//! Decides whether a spawn cell is currently usable.

use std::collections::HashMap;

use crate::domain::{Board, Player, PlayerId, SpawnPoint};

/// Tunables for spawn placement, loaded once at startup.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub max_count: usize,
    pub clear_radius: i32,
    pub wait_message: String,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_count: 25,
            clear_radius: 3,
            wait_message: "Waiting for a free spawn point...".to_string(),
        }
    }
}

/// `spawnPoints[:maxCount]`, falling back to the board center when that
/// slice is empty (spec §3, Spawn Configuration).
pub fn effective_spawn_list(board: &Board, config: &SpawnConfig) -> Vec<SpawnPoint> {
    let truncated: Vec<SpawnPoint> = board
        .spawn_points
        .iter()
        .take(config.max_count)
        .copied()
        .collect();

    if truncated.is_empty() {
        vec![board.center()]
    } else {
        truncated
    }
}

/// A spawn at `(sx, sy)` is available iff every in-bounds cell within
/// Manhattan distance `r` is not a wall and not occupied by a
/// currently-spawned player; disk cells that fall outside the board are
/// skipped rather than disqualifying the spawn. Waiting players (null
/// coordinates) never block a spawn.
fn is_available(sx: i32, sy: i32, board: &Board, players: &HashMap<PlayerId, Player>, r: i32) -> bool {
    for dx in -r..=r {
        for dy in -r..=r {
            if dx.abs() + dy.abs() > r {
                continue;
            }
            let x = sx + dx;
            let y = sy + dy;
            // The disk is clipped to the board: a cell outside the grid
            // has nothing to be a wall or occupied, so it can't block a
            // spawn. Without this, R=3 (the default) would make every
            // spawn on a board with any dimension narrower than 7
            // unavailable, which would contradict the spec's own
            // worked example of a 1-row board admitting a spawn at R=3.
            if !board.in_bounds(x, y) {
                continue;
            }
            if board.is_wall(x, y) {
                return false;
            }
            if players.values().any(|p| p.occupies(x, y)) {
                return false;
            }
        }
    }
    true
}

/// Scans `spawn_list` in order and returns the first available spawn.
pub fn first_available(
    spawn_list: &[SpawnPoint],
    board: &Board,
    players: &HashMap<PlayerId, Player>,
    r: i32,
) -> Option<SpawnPoint> {
    spawn_list
        .iter()
        .copied()
        .find(|sp| is_available(sp.x, sp.y, board, players, r))
}
