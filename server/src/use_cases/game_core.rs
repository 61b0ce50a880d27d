//! The authoritative game state: players, move validation, and
//! serialization into the wire `GameStateDto` shape.

use std::collections::HashMap;

use protocol::{BoardDto, CollisionDto, CollisionKind as WireCollisionKind, GameStateDto, PlayerDto};

use crate::domain::{Board, CollisionEvent, CollisionKind, Player, PlayerId};
use crate::use_cases::event_bus::{BusEvent, EventBus, Scope};
use crate::use_cases::spawn_admission::{self, SpawnConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddPlayerOutcome {
    pub spawned: bool,
    pub waiting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejectReason {
    NoSuchPlayer,
    NotSpawned,
    DeltaOutOfRange,
    OutOfBounds,
    Wall,
    PlayerCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied,
    Rejected(MoveRejectReason),
}

pub struct GameCore {
    board: Board,
    players: HashMap<PlayerId, Player>,
    /// Insertion order, so `try_spawn_waiting` processes waiting players
    /// in the order they joined.
    join_order: Vec<PlayerId>,
    spawn_config: SpawnConfig,
    effective_spawns: Vec<crate::domain::SpawnPoint>,
    collisions: Vec<CollisionEvent>,
    events: EventBus,
}

fn now_ms() -> i64 {
    protocol::now_ms()
}

impl GameCore {
    pub fn new(board: Board, spawn_config: SpawnConfig) -> Self {
        let effective_spawns = spawn_admission::effective_spawn_list(&board, &spawn_config);
        Self {
            board,
            players: HashMap::new(),
            join_order: Vec::new(),
            spawn_config,
            effective_spawns,
            collisions: Vec::new(),
            events: EventBus::new(),
        }
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn wait_message(&self) -> &str {
        &self.spawn_config.wait_message
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn player_name(&self, player_id: &str) -> Option<String> {
        self.players.get(player_id).map(|p| p.player_name.clone())
    }

    pub fn add_player(&mut self, player_id: PlayerId, player_name: String) -> AddPlayerOutcome {
        let mut player = Player::waiting(player_id.clone(), player_name);

        if let Some(sp) = spawn_admission::first_available(
            &self.effective_spawns,
            &self.board,
            &self.players,
            self.spawn_config.clear_radius,
        ) {
            player.x = Some(sp.x);
            player.y = Some(sp.y);
        }

        let spawned = player.is_spawned();
        self.players.insert(player_id.clone(), player);
        self.join_order.push(player_id.clone());
        self.events
            .emit(&Scope::Global, &BusEvent::Join { player_id });

        AddPlayerOutcome {
            spawned,
            waiting: !spawned,
        }
    }

    pub fn remove_player(&mut self, player_id: &str) {
        if self.players.remove(player_id).is_some() {
            self.join_order.retain(|id| id != player_id);
            self.events.emit(
                &Scope::Global,
                &BusEvent::Leave {
                    player_id: player_id.to_string(),
                },
            );
        }
    }

    /// Attempts to spawn every still-waiting player, in join order.
    /// Returns the ids that just transitioned from waiting to spawned.
    pub fn try_spawn_waiting(&mut self) -> Vec<PlayerId> {
        let mut newly_spawned = Vec::new();
        for player_id in self.join_order.clone() {
            let already_spawned = self
                .players
                .get(&player_id)
                .map(|p| p.is_spawned())
                .unwrap_or(true);
            if already_spawned {
                continue;
            }

            if let Some(sp) = spawn_admission::first_available(
                &self.effective_spawns,
                &self.board,
                &self.players,
                self.spawn_config.clear_radius,
            ) {
                if let Some(player) = self.players.get_mut(&player_id) {
                    player.x = Some(sp.x);
                    player.y = Some(sp.y);
                    newly_spawned.push(player_id);
                }
            }
        }
        newly_spawned
    }

    pub fn validate_and_apply(&mut self, player_id: &str, dx: i32, dy: i32) -> MoveOutcome {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            return MoveOutcome::Rejected(MoveRejectReason::DeltaOutOfRange);
        }

        let Some(player) = self.players.get(player_id) else {
            return MoveOutcome::Rejected(MoveRejectReason::NoSuchPlayer);
        };

        let (Some(x), Some(y)) = (player.x, player.y) else {
            return MoveOutcome::Rejected(MoveRejectReason::NotSpawned);
        };

        let (nx, ny) = (x + dx, y + dy);

        if !self.board.in_bounds(nx, ny) {
            return MoveOutcome::Rejected(MoveRejectReason::OutOfBounds);
        }

        if self.board.is_wall(nx, ny) {
            self.collisions.push(CollisionEvent {
                kind: CollisionKind::WallCollision,
                player_id: player_id.to_string(),
                x: nx,
                y: ny,
            });
            self.events.emit(
                &Scope::Global,
                &BusEvent::Collision(CollisionEvent {
                    kind: CollisionKind::WallCollision,
                    player_id: player_id.to_string(),
                    x: nx,
                    y: ny,
                }),
            );
            return MoveOutcome::Rejected(MoveRejectReason::Wall);
        }

        if self
            .players
            .iter()
            .any(|(id, p)| id != player_id && p.occupies(nx, ny))
        {
            self.collisions.push(CollisionEvent {
                kind: CollisionKind::PlayerCollision,
                player_id: player_id.to_string(),
                x: nx,
                y: ny,
            });
            self.events.emit(
                &Scope::Global,
                &BusEvent::Collision(CollisionEvent {
                    kind: CollisionKind::PlayerCollision,
                    player_id: player_id.to_string(),
                    x: nx,
                    y: ny,
                }),
            );
            return MoveOutcome::Rejected(MoveRejectReason::PlayerCollision);
        }

        let player = self.players.get_mut(player_id).expect("checked above");
        player.last_x = player.x;
        player.last_y = player.y;
        player.last_t = Some(now_ms());
        player.x = Some(nx);
        player.y = Some(ny);

        MoveOutcome::Applied
    }

    /// Returns a value copy of the authoritative state: board, players
    /// (with derived velocity), accumulated collisions since the last
    /// clear, and score. Does not clear collisions — the caller clears
    /// them strictly after a successful broadcast.
    pub fn serialize_state(&self) -> GameStateDto {
        let grid = self
            .board
            .grid
            .iter()
            .map(|row| row.iter().map(|c| c.as_char()).collect())
            .collect();

        let now = now_ms();
        let players = self
            .players
            .values()
            .map(|p| {
                let (vx, vy) = match (p.last_x, p.last_y, p.last_t, p.x, p.y) {
                    (Some(lx), Some(ly), Some(lt), Some(x), Some(y)) => {
                        let dt_sec = (now - lt) as f64 / 1000.0;
                        if dt_sec > 0.0 {
                            (
                                Some((x - lx) as f64 / dt_sec),
                                Some((y - ly) as f64 / dt_sec),
                            )
                        } else {
                            (Some(0.0), Some(0.0))
                        }
                    }
                    _ => (Some(0.0), Some(0.0)),
                };
                PlayerDto {
                    player_id: p.player_id.clone(),
                    x: p.x,
                    y: p.y,
                    player_name: p.player_name.clone(),
                    vx,
                    vy,
                }
            })
            .collect();

        let collisions: Vec<CollisionDto> = self
            .collisions
            .iter()
            .map(|c| CollisionDto {
                kind: match c.kind {
                    CollisionKind::PlayerCollision => WireCollisionKind::PlayerCollision,
                    CollisionKind::WallCollision => WireCollisionKind::WallCollision,
                },
                player_id: c.player_id.clone(),
                x: c.x,
                y: c.y,
            })
            .collect();

        GameStateDto {
            board: BoardDto {
                width: self.board.width,
                height: self.board.height,
                grid,
            },
            players,
            // No scoring rule is defined by the spec; reserved for a
            // future scoring feature (see DESIGN.md open questions).
            score: 0,
            has_collisions: !collisions.is_empty(),
            collisions,
        }
    }

    pub fn clear_collisions(&mut self) {
        self.collisions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::Cell as BoardCell;
    use crate::domain::SpawnPoint;

    fn board_with_wall_at(width: u32, height: u32, wall: (i32, i32)) -> Board {
        let mut grid = vec![vec![BoardCell::Empty; width as usize]; height as usize];
        grid[wall.1 as usize][wall.0 as usize] = BoardCell::Wall;
        Board {
            width,
            height,
            grid,
            spawn_points: vec![SpawnPoint { x: 1, y: 1 }],
        }
    }

    fn core() -> GameCore {
        GameCore::new(
            board_with_wall_at(3, 3, (2, 1)),
            SpawnConfig {
                max_count: 25,
                clear_radius: 0,
                wait_message: "wait".to_string(),
            },
        )
    }

    #[test]
    fn single_player_move_into_wall_is_rejected_with_collision() {
        let mut game = core();
        let outcome = game.add_player("p1".to_string(), "Alice".to_string());
        assert!(outcome.spawned);

        let move_outcome = game.validate_and_apply("p1", 1, 0);
        assert_eq!(
            move_outcome,
            MoveOutcome::Rejected(MoveRejectReason::Wall)
        );

        let state = game.serialize_state();
        assert!(state.has_collisions);
        assert_eq!(state.collisions.len(), 1);
        // position did not change
        let player = state.players.iter().find(|p| p.player_id == "p1").unwrap();
        assert_eq!((player.x, player.y), (Some(1), Some(1)));
    }

    #[test]
    fn out_of_range_delta_is_rejected_without_mutation_or_collision() {
        let mut game = core();
        game.add_player("p1".to_string(), "Alice".to_string());
        let outcome = game.validate_and_apply("p1", 2, 0);
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(MoveRejectReason::DeltaOutOfRange)
        );
        assert!(game.serialize_state().collisions.is_empty());
    }

    #[test]
    fn spawn_queue_fills_in_join_order_after_disconnect() {
        let board = Board {
            width: 5,
            height: 1,
            grid: vec![vec![BoardCell::Empty, BoardCell::Empty, BoardCell::Empty, BoardCell::Empty, BoardCell::Empty]],
            spawn_points: vec![SpawnPoint { x: 1, y: 0 }, SpawnPoint { x: 3, y: 0 }],
        };
        let mut game = GameCore::new(
            board,
            SpawnConfig {
                max_count: 25,
                clear_radius: 3,
                wait_message: "wait".to_string(),
            },
        );

        let a = game.add_player("a".to_string(), "A".to_string());
        assert!(a.spawned);
        let b = game.add_player("b".to_string(), "B".to_string());
        assert!(b.waiting);

        let respawned = game.try_spawn_waiting();
        assert!(respawned.is_empty());

        game.remove_player("a");
        let respawned = game.try_spawn_waiting();
        assert_eq!(respawned, vec!["b".to_string()]);

        // idempotent: a second call with no change spawns nobody new.
        assert!(game.try_spawn_waiting().is_empty());
    }

    #[test]
    fn player_collision_is_rejected_and_reported() {
        let board = Board {
            width: 3,
            height: 1,
            grid: vec![vec![BoardCell::Empty, BoardCell::Empty, BoardCell::Empty]],
            spawn_points: vec![SpawnPoint { x: 0, y: 0 }, SpawnPoint { x: 1, y: 0 }],
        };
        let mut game = GameCore::new(
            board,
            SpawnConfig {
                max_count: 25,
                clear_radius: 0,
                wait_message: "wait".to_string(),
            },
        );
        game.add_player("a".to_string(), "A".to_string());
        game.add_player("b".to_string(), "B".to_string());

        let outcome = game.validate_and_apply("a", 1, 0);
        assert_eq!(
            outcome,
            MoveOutcome::Rejected(MoveRejectReason::PlayerCollision)
        );
    }

    #[test]
    fn clear_collisions_resets_has_collisions() {
        let mut game = core();
        game.add_player("p1".to_string(), "Alice".to_string());
        let _ = game.validate_and_apply("p1", 1, 0);
        assert!(game.serialize_state().has_collisions);
        game.clear_collisions();
        let state = game.serialize_state();
        assert!(!state.has_collisions);
        assert!(state.collisions.is_empty());
    }
}
