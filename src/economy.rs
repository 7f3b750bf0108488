use tracing::debug;

use crate::collision::{food_at, in_bounds, occupied_by_living};
use crate::config::GameConfig;
use crate::constants::PLACEMENT_ATTEMPTS_PER_ITEM;
use crate::food::{Food, FoodFactory};
use crate::rng::Rng;
use crate::snake::Snake;
use crate::types::{FoodType, Position};

/// Owns the food on the board: population cap, placement, timed top-ups and
/// death drops.
#[derive(Clone, Debug)]
pub struct FoodSpawner {
    foods: Vec<Food>,
    factory: FoodFactory,
    grid_size: i32,
    max_food: usize,
    spawn_interval_ms: u64,
    spawn_count: usize,
    replenish_accumulator_ms: u64,
}

impl FoodSpawner {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            foods: Vec::new(),
            factory: FoodFactory::new(config.food_weights.clone()),
            grid_size: config.grid_size,
            max_food: config.max_food,
            spawn_interval_ms: config.food_spawn_interval_ms.max(1),
            spawn_count: config.food_spawn_count,
            replenish_accumulator_ms: 0,
        }
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn max_food(&self) -> usize {
        self.max_food
    }

    pub fn headroom(&self) -> usize {
        self.max_food.saturating_sub(self.foods.len())
    }

    pub fn food_at(&self, pos: Position) -> Option<&Food> {
        food_at(&self.foods, pos)
    }

    pub fn is_valid_position(&self, pos: Position, snakes: &[Snake]) -> bool {
        in_bounds(pos, self.grid_size)
            && !occupied_by_living(snakes, pos)
            && self.food_at(pos).is_none()
    }

    /// Places up to `count` random items (clipped to the headroom). Returns how
    /// many actually landed; a crowded board yields fewer.
    pub fn spawn(&mut self, count: usize, snakes: &[Snake], rng: &mut Rng) -> usize {
        let wanted = count.min(self.headroom());
        if wanted == 0 {
            return 0;
        }
        let mut placed = 0;
        let mut attempts = wanted * PLACEMENT_ATTEMPTS_PER_ITEM;
        while placed < wanted && attempts > 0 {
            attempts -= 1;
            let pos = Position::new(
                rng.int(0, self.grid_size - 1),
                rng.int(0, self.grid_size - 1),
            );
            if !self.is_valid_position(pos, snakes) {
                continue;
            }
            let food = self.factory.create_random(pos, rng);
            self.foods.push(food);
            placed += 1;
        }
        if placed < wanted {
            debug!(wanted, placed, "food placement saturated");
        }
        placed
    }

    pub fn spawn_at(
        &mut self,
        pos: Position,
        food_type: Option<FoodType>,
        snakes: &[Snake],
        rng: &mut Rng,
    ) -> Option<u64> {
        if self.headroom() == 0 || !self.is_valid_position(pos, snakes) {
            return None;
        }
        let food = match food_type {
            Some(food_type) => self.factory.create(pos, food_type),
            None => self.factory.create_random(pos, rng),
        };
        let id = food.id;
        self.foods.push(food);
        Some(id)
    }

    /// Adds `spawn_count` items for every full interval of play time.
    pub fn replenish(&mut self, dt_ms: u64, snakes: &[Snake], rng: &mut Rng) -> usize {
        self.replenish_accumulator_ms = self.replenish_accumulator_ms.saturating_add(dt_ms);
        let mut spawned = 0;
        while self.replenish_accumulator_ms >= self.spawn_interval_ms {
            self.replenish_accumulator_ms -= self.spawn_interval_ms;
            spawned += self.spawn(self.spawn_count, snakes, rng);
        }
        spawned
    }

    pub fn remove(&mut self, id: u64) -> Option<Food> {
        let idx = self.foods.iter().position(|food| food.id == id)?;
        Some(self.foods.remove(idx))
    }

    /// Ids of non-hazard items inside the square around `center`, the centre
    /// cell itself excluded.
    pub fn pickup_ids_around(&self, center: Position, radius: i32) -> Vec<u64> {
        center
            .surrounding(radius)
            .into_iter()
            .filter_map(|cell| self.food_at(cell))
            .filter(|food| !food.food_type.is_hazard())
            .map(|food| food.id)
            .collect()
    }

    pub fn clear_around(&mut self, center: Position, radius: i32) -> usize {
        let before = self.foods.len();
        self.foods
            .retain(|food| food.position.manhattan(center) > radius);
        before - self.foods.len()
    }

    pub fn clear(&mut self) {
        self.foods.clear();
        self.replenish_accumulator_ms = 0;
    }
}
