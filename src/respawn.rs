use tracing::{error, warn};

use crate::collision::{in_bounds, occupied_by_living};
use crate::constants::{
    safe_harbors, RESPAWN_CLEAR_RADIUS, RESPAWN_MARGIN, RESPAWN_SAMPLE_ATTEMPTS,
};
use crate::economy::FoodSpawner;
use crate::rng::Rng;
use crate::snake::Snake;
use crate::types::{Direction, Position};

#[derive(Clone, Debug, PartialEq)]
struct PendingRespawn {
    agent: usize,
    remaining_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RespawnPlacement {
    pub head: Position,
    pub direction: Direction,
    /// Set when every search failed and the first harbour was used blindly.
    pub forced: bool,
}

#[derive(Clone, Debug)]
pub struct RespawnManager {
    queue: Vec<PendingRespawn>,
    delay_ms: u64,
}

impl RespawnManager {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            queue: Vec::new(),
            delay_ms,
        }
    }

    pub fn schedule(&mut self, agent: usize) {
        self.queue.retain(|pending| pending.agent != agent);
        self.queue.push(PendingRespawn {
            agent,
            remaining_ms: self.delay_ms,
        });
    }

    /// Advances every countdown and hands back the agents whose time is up.
    pub fn tick(&mut self, dt_ms: u64) -> Vec<usize> {
        let mut ready = Vec::new();
        for pending in &mut self.queue {
            pending.remaining_ms = pending.remaining_ms.saturating_sub(dt_ms);
            if pending.remaining_ms == 0 {
                ready.push(pending.agent);
            }
        }
        self.queue.retain(|pending| pending.remaining_ms > 0);
        ready
    }

    pub fn remaining_ms(&self, agent: usize) -> Option<u64> {
        self.queue
            .iter()
            .find(|pending| pending.agent == agent)
            .map(|pending| pending.remaining_ms)
    }

    pub fn is_pending(&self, agent: usize) -> bool {
        self.remaining_ms(agent).is_some()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

/// A full initial body fits on free cells and the head has an exit.
pub fn is_valid_spawn(
    head: Position,
    direction: Direction,
    length: usize,
    grid_size: i32,
    snakes: &[Snake],
    food: &FoodSpawner,
) -> bool {
    let back = direction.opposite();
    for i in 0..length.max(1) {
        let segment = head.offset(back, i as i32);
        if !in_bounds(segment, grid_size)
            || occupied_by_living(snakes, segment)
            || food.food_at(segment).is_some()
        {
            return false;
        }
    }
    head.neighbors()
        .iter()
        .any(|cell| in_bounds(*cell, grid_size) && !occupied_by_living(snakes, *cell))
}

/// Random interior sampling, then the fixed harbours, then a full scan, and
/// as a last resort the first harbour regardless of overlap. Clearing food
/// around a harbour or scan hit is part of the search.
pub fn find_spawn(
    length: usize,
    grid_size: i32,
    snakes: &[Snake],
    food: &mut FoodSpawner,
    rng: &mut Rng,
) -> RespawnPlacement {
    let low = RESPAWN_MARGIN;
    let high = grid_size - 1 - RESPAWN_MARGIN;
    for _ in 0..RESPAWN_SAMPLE_ATTEMPTS {
        let head = Position::new(rng.int(low, high), rng.int(low, high));
        let direction = Direction::ALL[rng.pick_index(Direction::ALL.len())];
        if is_valid_spawn(head, direction, length, grid_size, snakes, food) {
            return RespawnPlacement {
                head,
                direction,
                forced: false,
            };
        }
    }

    warn!(grid_size, "random respawn search exhausted, trying harbours");
    let harbors = safe_harbors(grid_size);
    for (x, y, direction) in harbors {
        let head = Position::new(x, y);
        food.clear_around(head, RESPAWN_CLEAR_RADIUS);
        if is_valid_spawn(head, direction, length, grid_size, snakes, food) {
            return RespawnPlacement {
                head,
                direction,
                forced: false,
            };
        }
    }

    for x in 2..(grid_size - 2) {
        for y in 2..(grid_size - 2) {
            for direction in Direction::ALL {
                let head = Position::new(x, y);
                if is_valid_spawn(head, direction, length, grid_size, snakes, food) {
                    food.clear_around(head, RESPAWN_CLEAR_RADIUS);
                    return RespawnPlacement {
                        head,
                        direction,
                        forced: false,
                    };
                }
            }
        }
    }

    let (x, y, direction) = harbors[0];
    error!(x, y, "no valid respawn cell, forcing first harbour");
    RespawnPlacement {
        head: Position::new(x, y),
        direction,
        forced: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::types::FoodType;

    #[test]
    fn countdown_releases_agent_once() {
        let mut manager = RespawnManager::new(2_000);
        manager.schedule(1);
        assert!(manager.tick(1_500).is_empty());
        assert_eq!(manager.remaining_ms(1), Some(500));
        assert_eq!(manager.tick(500), vec![1]);
        assert!(!manager.is_pending(1));
        assert!(manager.tick(5_000).is_empty());
    }

    #[test]
    fn rescheduling_replaces_the_countdown() {
        let mut manager = RespawnManager::new(2_000);
        manager.schedule(0);
        manager.tick(1_000);
        manager.schedule(0);
        assert_eq!(manager.remaining_ms(0), Some(2_000));
    }

    #[test]
    fn spawn_check_rejects_food_and_bodies() {
        let config = GameConfig::default();
        let mut food = FoodSpawner::new(&config);
        let mut rng = Rng::new(4);
        let blocker = vec![Snake::new(Position::new(10, 12), Direction::Right, 3)];
        assert!(is_valid_spawn(
            Position::new(10, 10),
            Direction::Right,
            3,
            32,
            &blocker,
            &food
        ));
        food.spawn_at(Position::new(9, 10), Some(FoodType::Normal), &blocker, &mut rng);
        assert!(!is_valid_spawn(
            Position::new(10, 10),
            Direction::Right,
            3,
            32,
            &blocker,
            &food
        ));
        assert!(!is_valid_spawn(
            Position::new(10, 12),
            Direction::Up,
            3,
            32,
            &blocker,
            &food
        ));
        assert!(!is_valid_spawn(
            Position::new(1, 10),
            Direction::Right,
            3,
            32,
            &blocker,
            &food
        ));
    }

    #[test]
    fn random_search_finds_interior_spot() {
        let config = GameConfig::default();
        let mut food = FoodSpawner::new(&config);
        let mut rng = Rng::new(11);
        let placement = find_spawn(3, 32, &[], &mut food, &mut rng);
        assert!(!placement.forced);
        assert!((3..=28).contains(&placement.head.x));
        assert!((3..=28).contains(&placement.head.y));
    }

    #[test]
    fn crowded_grid_still_finds_the_free_row() {
        // every row but y=4 is filled by a body
        let config = GameConfig {
            grid_size: 10,
            ..GameConfig::default()
        };
        let mut food = FoodSpawner::new(&config);
        let mut rng = Rng::new(21);
        let mut walls = Vec::new();
        for y in 0..10 {
            if y == 4 {
                continue;
            }
            walls.push(Snake::new(Position::new(9, y), Direction::Right, 10));
        }
        let placement = find_spawn(3, 10, &walls, &mut food, &mut rng);
        assert!(!placement.forced);
        assert_eq!(placement.head.y, 4);
        assert!(is_valid_spawn(
            placement.head,
            placement.direction,
            3,
            10,
            &walls,
            &food
        ));
    }

    #[test]
    fn harbour_clears_food_before_validating() {
        let config = GameConfig {
            grid_size: 10,
            ..GameConfig::default()
        };
        let mut food = FoodSpawner::new(&config);
        let mut rng = Rng::new(6);
        // food on every head cell the random search can sample
        for x in 3..=6 {
            for y in 3..=6 {
                food.spawn_at(Position::new(x, y), Some(FoodType::Normal), &[], &mut rng)
                    .expect("free cell");
            }
        }

        let placement = find_spawn(3, 10, &[], &mut food, &mut rng);
        assert!(!placement.forced);
        assert_eq!(placement.head, Position::new(3, 3));
        assert_eq!(placement.direction, Direction::Right);
        assert!(food.food_at(Position::new(3, 3)).is_none());
        assert!(food.food_at(Position::new(3, 5)).is_none());
        assert!(food.food_at(Position::new(6, 6)).is_some());
        assert_eq!(food.len(), 10);
    }

    #[test]
    fn full_grid_forces_first_harbour() {
        let mut food = FoodSpawner::new(&GameConfig {
            grid_size: 8,
            ..GameConfig::default()
        });
        let mut rng = Rng::new(3);
        let walls: Vec<Snake> = (0..8)
            .map(|y| Snake::new(Position::new(7, y), Direction::Right, 8))
            .collect();
        let placement = find_spawn(3, 8, &walls, &mut food, &mut rng);
        assert!(placement.forced);
        assert_eq!(placement.head, Position::new(3, 3));
        assert_eq!(placement.direction, Direction::Right);
    }
}
