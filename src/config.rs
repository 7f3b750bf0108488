use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{
    EASY_ERROR_RATE, EASY_REACTION_MS, FOOD_DROP_RATE, FOOD_SPAWN_COUNT, FOOD_SPAWN_INTERVAL_MS,
    GAME_DURATION_S, GRID_SIZE, HARD_ERROR_RATE, HARD_LOOKAHEAD_DEPTH, HARD_REACTION_MS,
    INITIAL_FOOD, INITIAL_LENGTH, MAGNET_EFFECT_DURATION_MS, MAGNET_RANGE, MAX_FOOD,
    MOVE_INTERVAL_MS, NORMAL_ERROR_RATE, NORMAL_REACTION_MS, RESPAWN_DELAY_MS, SCORE_PER_FOOD,
    SCORE_PER_LENGTH, SPEED_EFFECT_DURATION_MS, SPEED_MULTIPLIER, SUPER_FOOD_VALUE,
    WEIGHT_MAGNET, WEIGHT_MINE, WEIGHT_NORMAL, WEIGHT_SPEED, WEIGHT_SUPER,
};
use crate::error::ConfigError;
use crate::types::{Difficulty, FoodType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodWeights {
    pub normal: f32,
    pub speed: f32,
    #[serde(rename = "super")]
    pub super_food: f32,
    pub mine: f32,
    pub magnet: f32,
}

impl Default for FoodWeights {
    fn default() -> Self {
        Self {
            normal: WEIGHT_NORMAL,
            speed: WEIGHT_SPEED,
            super_food: WEIGHT_SUPER,
            mine: WEIGHT_MINE,
            magnet: WEIGHT_MAGNET,
        }
    }
}

impl FoodWeights {
    pub fn only(food_type: FoodType) -> Self {
        let mut weights = Self {
            normal: 0.0,
            speed: 0.0,
            super_food: 0.0,
            mine: 0.0,
            magnet: 0.0,
        };
        weights.set(food_type, 100.0);
        weights
    }

    pub fn weight(&self, food_type: FoodType) -> f32 {
        match food_type {
            FoodType::Normal => self.normal,
            FoodType::Speed => self.speed,
            FoodType::Super => self.super_food,
            FoodType::Mine => self.mine,
            FoodType::Magnet => self.magnet,
        }
    }

    pub fn set(&mut self, food_type: FoodType, value: f32) {
        match food_type {
            FoodType::Normal => self.normal = value,
            FoodType::Speed => self.speed = value,
            FoodType::Super => self.super_food = value,
            FoodType::Mine => self.mine = value,
            FoodType::Magnet => self.magnet = value,
        }
    }

    pub fn total(&self) -> f32 {
        FoodType::ALL.iter().map(|t| self.weight(*t)).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTierSettings {
    pub reaction_delay_ms: u64,
    pub error_rate: f32,
    #[serde(default)]
    pub lookahead_depth: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub easy: AiTierSettings,
    pub normal: AiTierSettings,
    pub hard: AiTierSettings,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            easy: AiTierSettings {
                reaction_delay_ms: EASY_REACTION_MS,
                error_rate: EASY_ERROR_RATE,
                lookahead_depth: 0,
            },
            normal: AiTierSettings {
                reaction_delay_ms: NORMAL_REACTION_MS,
                error_rate: NORMAL_ERROR_RATE,
                lookahead_depth: 0,
            },
            hard: AiTierSettings {
                reaction_delay_ms: HARD_REACTION_MS,
                error_rate: HARD_ERROR_RATE,
                lookahead_depth: HARD_LOOKAHEAD_DEPTH,
            },
        }
    }
}

/// Every tunable of a match. Built once by the host and handed to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub grid_size: i32,
    pub initial_length: usize,
    pub move_interval_ms: f64,
    pub game_duration_s: u32,
    pub respawn_delay_ms: u64,
    pub max_food: usize,
    pub food_spawn_interval_ms: u64,
    pub food_spawn_count: usize,
    pub initial_food: usize,
    pub food_drop_rate: usize,
    pub food_weights: FoodWeights,
    pub speed_effect_duration_ms: u64,
    pub speed_multiplier: f64,
    pub magnet_effect_duration_ms: u64,
    pub magnet_range: i32,
    pub super_food_value: u32,
    pub score_per_food: u64,
    pub score_per_length: u64,
    pub ai: AiSettings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            initial_length: INITIAL_LENGTH,
            move_interval_ms: MOVE_INTERVAL_MS,
            game_duration_s: GAME_DURATION_S,
            respawn_delay_ms: RESPAWN_DELAY_MS,
            max_food: MAX_FOOD,
            food_spawn_interval_ms: FOOD_SPAWN_INTERVAL_MS,
            food_spawn_count: FOOD_SPAWN_COUNT,
            initial_food: INITIAL_FOOD,
            food_drop_rate: FOOD_DROP_RATE,
            food_weights: FoodWeights::default(),
            speed_effect_duration_ms: SPEED_EFFECT_DURATION_MS,
            speed_multiplier: SPEED_MULTIPLIER,
            magnet_effect_duration_ms: MAGNET_EFFECT_DURATION_MS,
            magnet_range: MAGNET_RANGE,
            super_food_value: SUPER_FOOD_VALUE,
            score_per_food: SCORE_PER_FOOD,
            score_per_length: SCORE_PER_LENGTH,
            ai: AiSettings::default(),
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Hard errors for values the simulation cannot run with; weights that do
    /// not sum to 100 are only reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 8 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.initial_length == 0 {
            return Err(ConfigError::ZeroInitialLength);
        }
        if !(self.move_interval_ms.is_finite() && self.move_interval_ms > 0.0) {
            return Err(ConfigError::InvalidMoveInterval);
        }
        let total = self.food_weights.total();
        if (total - 100.0).abs() > f32::EPSILON * 100.0 {
            warn!(total, "food weights do not sum to 100");
        }
        Ok(())
    }

    pub fn ai_settings(&self, difficulty: Difficulty) -> &AiTierSettings {
        match difficulty {
            Difficulty::Easy => &self.ai.easy,
            Difficulty::Normal => &self.ai.normal,
            Difficulty::Hard => &self.ai.hard,
        }
    }

    pub fn game_duration_ms(&self) -> u64 {
        self.game_duration_s as u64 * 1_000
    }
}
