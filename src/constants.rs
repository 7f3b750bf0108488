use crate::types::Direction;

pub const STEP_MS: u64 = 16;

pub const GRID_SIZE: i32 = 32;
pub const INITIAL_LENGTH: usize = 3;
pub const MOVE_INTERVAL_MS: f64 = 120.0;
pub const GAME_DURATION_S: u32 = 120;
pub const RESPAWN_DELAY_MS: u64 = 2_000;

pub const MAX_FOOD: usize = 20;
pub const FOOD_SPAWN_INTERVAL_MS: u64 = 1_000;
pub const FOOD_SPAWN_COUNT: usize = 2;
pub const INITIAL_FOOD: usize = 5;
pub const FOOD_DROP_RATE: usize = 3;
pub const PLACEMENT_ATTEMPTS_PER_ITEM: usize = 10;

pub const WEIGHT_NORMAL: f32 = 80.0;
pub const WEIGHT_SPEED: f32 = 5.0;
pub const WEIGHT_SUPER: f32 = 5.0;
pub const WEIGHT_MINE: f32 = 5.0;
pub const WEIGHT_MAGNET: f32 = 5.0;

pub const SPEED_EFFECT_DURATION_MS: u64 = 5_000;
pub const SPEED_MULTIPLIER: f64 = 2.0;
pub const MAGNET_EFFECT_DURATION_MS: u64 = 20_000;
pub const MAGNET_RANGE: i32 = 1;
pub const SUPER_FOOD_VALUE: u32 = 5;

pub const SCORE_PER_FOOD: u64 = 50;
pub const SCORE_PER_LENGTH: u64 = 100;

pub const EASY_REACTION_MS: u64 = 200;
pub const EASY_ERROR_RATE: f32 = 0.08;
pub const NORMAL_REACTION_MS: u64 = 100;
pub const NORMAL_ERROR_RATE: f32 = 0.02;
pub const HARD_REACTION_MS: u64 = 50;
pub const HARD_ERROR_RATE: f32 = 0.0;
pub const HARD_LOOKAHEAD_DEPTH: u32 = 2;

pub const DANGER_FATAL: i32 = 1_000;
pub const PRIORITY_FLOOR: f64 = -500.0;

pub const RESPAWN_SAMPLE_ATTEMPTS: usize = 100;
pub const RESPAWN_MARGIN: i32 = 3;
pub const RESPAWN_CLEAR_RADIUS: i32 = 2;

/// Movement rounds one engine step may run before the excess is dropped.
pub const MAX_MOVE_ROUNDS_PER_STEP: usize = 4;

/// Undrained runtime events kept between snapshots; the oldest go first.
pub const MAX_PENDING_EVENTS: usize = 1_024;

pub fn spawn_layout(grid_size: i32) -> [(i32, i32, Direction); 2] {
    [
        (5, grid_size / 2, Direction::Right),
        (grid_size - 6, grid_size / 2, Direction::Left),
    ]
}

pub fn safe_harbors(grid_size: i32) -> [(i32, i32, Direction); 4] {
    [
        (3, 3, Direction::Right),
        (grid_size - 4, grid_size - 4, Direction::Left),
        (grid_size / 2, 3, Direction::Down),
        (grid_size / 2, grid_size - 4, Direction::Up),
    ]
}
