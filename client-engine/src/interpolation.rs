//! Per-remote-entity jitter buffers: ingest server snapshots, lerp at
//! `renderTime = now - INTERPOLATION_DELAY_MS`, clamp to the board, and
//! ease the drawn cell toward the target one step per tick (spec §4.10).

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use protocol::{GameStateDto, PlayerDto};

use crate::board_view::BoardView;

/// Capacity of each per-player ring buffer (spec §3, "remoteBuffers").
const BUFFER_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub t: i64,
    pub x: i32,
    pub y: i32,
    pub player_name: String,
    /// Accepted on the wire and stored, but unused by the MVP lerp
    /// (spec §9 open question: extrapolation is a future enhancement).
    pub vx: Option<f64>,
    pub vy: Option<f64>,
}

/// A cell the caller should paint this tick, and the cell it previously
/// occupied (so the caller can restore the board's base character there).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRenderUpdate {
    pub player_id: String,
    pub player_name: String,
    pub cell: (i32, i32),
    pub previous_cell: Option<(i32, i32)>,
}

#[derive(Debug, Clone)]
pub struct InterpolationEngine {
    delay: Duration,
    display_easing: bool,
    buffers: HashMap<String, VecDeque<Snapshot>>,
    /// The drawn (eased) position per player; `None` until the first
    /// tick renders that player.
    last_drawn: HashMap<String, (i32, i32)>,
}

impl InterpolationEngine {
    pub fn new(delay: Duration, display_easing: bool) -> Self {
        Self {
            delay,
            display_easing,
            buffers: HashMap::new(),
            last_drawn: HashMap::new(),
        }
    }

    /// Appends a snapshot for every remote player in `players` (skipping
    /// `local_player_id`), stamped with the envelope timestamp `t`. Any
    /// player present in the previous tick's buffer set but absent from
    /// `players` now has its buffer and drawn state removed; the caller
    /// should clear that player's cell on screen. Returns the ids that
    /// were removed.
    pub fn ingest(&mut self, t: i64, players: &[PlayerDto], local_player_id: Option<&str>) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();

        for player in players {
            if Some(player.player_id.as_str()) == local_player_id {
                continue;
            }
            seen.insert(player.player_id.clone());

            let (Some(x), Some(y)) = (player.x, player.y) else {
                continue;
            };

            let buffer = self.buffers.entry(player.player_id.clone()).or_default();
            buffer.push_back(Snapshot {
                t,
                x,
                y,
                player_name: player.player_name.clone(),
                vx: player.vx,
                vy: player.vy,
            });
            while buffer.len() > BUFFER_CAPACITY {
                buffer.pop_front();
            }
        }

        let stale: Vec<String> = self
            .buffers
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        for id in &stale {
            self.buffers.remove(id);
            self.last_drawn.remove(id);
        }
        stale
    }

    /// Folds a full `STATE_UPDATE`/`gameState` payload in one call.
    pub fn ingest_state(&mut self, t: i64, state: &GameStateDto, local_player_id: Option<&str>) -> Vec<String> {
        self.ingest(t, &state.players, local_player_id)
    }

    /// Computes this tick's render updates: lerp each buffer at
    /// `renderTime`, clamp to the board, ease the drawn cell one step
    /// toward the target, and report the entities whose drawn cell
    /// changed. `now_ms` is the caller's clock at tick time.
    pub fn tick(&mut self, now_ms: i64, board: &BoardView) -> Vec<RemoteRenderUpdate> {
        let render_time = now_ms - self.delay.as_millis() as i64;
        let mut updates = Vec::new();

        for (player_id, buffer) in self.buffers.iter() {
            let Some((target, latest, name)) = interpolated_target(buffer, render_time, board) else {
                continue;
            };
            let _ = latest;

            let previous = self.last_drawn.get(player_id).copied();
            let drawn = if self.display_easing {
                ease_toward(previous, target)
            } else {
                target
            };

            if previous != Some(drawn) {
                updates.push(RemoteRenderUpdate {
                    player_id: player_id.clone(),
                    player_name: name,
                    cell: drawn,
                    previous_cell: previous,
                });
                self.last_drawn.insert(player_id.clone(), drawn);
            }
        }

        updates
    }
}

/// Linearly interpolates within `buffer` at `render_time`, clamps the
/// rounded result to the board (falling back to the latest snapshot's
/// cell if the interpolated cell is out of bounds or a wall), and
/// returns `(cell, latest_cell, player_name)`. `None` if the buffer is
/// empty.
fn interpolated_target(
    buffer: &VecDeque<Snapshot>,
    render_time: i64,
    board: &BoardView,
) -> Option<((i32, i32), (i32, i32), String)> {
    let latest = buffer.back()?;
    let latest_cell = (latest.x, latest.y);
    let name = latest.player_name.clone();

    if buffer.len() == 1 {
        return Some((latest_cell, latest_cell, name));
    }

    let (fx, fy) = lerp(buffer, render_time);
    let rounded = (fx.round() as i32, fy.round() as i32);

    let clamped = if board.in_bounds(rounded.0, rounded.1) && !board.is_wall(rounded.0, rounded.1) {
        rounded
    } else {
        latest_cell
    };

    Some((clamped, latest_cell, name))
}

/// Finds adjacent snapshots A,B with `A.t <= render_time <= B.t` and
/// lerps between them. Holds at the latest snapshot if the buffer ran
/// dry (`render_time` past the last entry) rather than extrapolating;
/// holds at the earliest if `render_time` is before the buffer's start.
fn lerp(buffer: &VecDeque<Snapshot>, render_time: i64) -> (f64, f64) {
    let earliest = buffer.front().expect("buffer has at least 2 entries");
    let latest = buffer.back().expect("buffer has at least 2 entries");

    if render_time >= latest.t {
        return (latest.x as f64, latest.y as f64);
    }
    if render_time <= earliest.t {
        return (earliest.x as f64, earliest.y as f64);
    }

    for pair in buffer.iter().collect::<Vec<_>>().windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.t <= render_time && render_time <= b.t {
            let span = (b.t - a.t) as f64;
            let alpha = if span > 0.0 { (render_time - a.t) as f64 / span } else { 0.0 };
            return (
                a.x as f64 + (b.x as f64 - a.x as f64) * alpha,
                a.y as f64 + (b.y as f64 - a.y as f64) * alpha,
            );
        }
    }

    (latest.x as f64, latest.y as f64)
}

/// One cell per axis per tick, toward `target` (spec §4.10, "Display
/// easing"). `None` previous position means this is the entity's first
/// tick, so it's drawn directly at the target.
fn ease_toward(previous: Option<(i32, i32)>, target: (i32, i32)) -> (i32, i32) {
    let Some((px, py)) = previous else {
        return target;
    };
    (
        px + (target.0 - px).clamp(-1, 1),
        py + (target.1 - py).clamp(-1, 1),
    )
}
