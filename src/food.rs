use crate::config::{FoodWeights, GameConfig};
use crate::effects::StatusEffect;
use crate::rng::Rng;
use crate::types::{FoodType, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct Food {
    pub id: u64,
    pub position: Position,
    pub food_type: FoodType,
}

/// What one consumed item grants.
#[derive(Clone, Debug, PartialEq)]
pub struct FoodReward {
    pub growth: u32,
    pub food_value: u32,
    pub effect: Option<StatusEffect>,
    pub fatal: bool,
}

impl FoodType {
    pub fn reward(self, config: &GameConfig, now_ms: u64) -> FoodReward {
        match self {
            FoodType::Normal => FoodReward {
                growth: 1,
                food_value: 1,
                effect: None,
                fatal: false,
            },
            FoodType::Speed => FoodReward {
                growth: 1,
                food_value: 1,
                effect: Some(StatusEffect::speed(
                    now_ms,
                    config.speed_effect_duration_ms,
                    config.speed_multiplier,
                )),
                fatal: false,
            },
            FoodType::Super => FoodReward {
                growth: 1,
                food_value: config.super_food_value,
                effect: None,
                fatal: false,
            },
            FoodType::Magnet => FoodReward {
                growth: 1,
                food_value: 1,
                effect: Some(StatusEffect::magnet(
                    now_ms,
                    config.magnet_effect_duration_ms,
                    config.magnet_range,
                )),
                fatal: false,
            },
            FoodType::Mine => FoodReward {
                growth: 0,
                food_value: 0,
                effect: None,
                fatal: true,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct FoodFactory {
    weights: FoodWeights,
    next_id: u64,
}

impl FoodFactory {
    pub fn new(weights: FoodWeights) -> Self {
        Self { weights, next_id: 1 }
    }

    pub fn weights(&self) -> &FoodWeights {
        &self.weights
    }

    /// One draw in `[0, 100)` walked against cumulative thresholds; anything
    /// past the last threshold is normal food.
    pub fn draw_type(&self, rng: &mut Rng) -> FoodType {
        let roll = rng.percent();
        let mut threshold = 0.0;
        for food_type in FoodType::ALL {
            threshold += self.weights.weight(food_type);
            if roll < threshold {
                return food_type;
            }
        }
        FoodType::Normal
    }

    pub fn create(&mut self, position: Position, food_type: FoodType) -> Food {
        let id = self.next_id;
        self.next_id += 1;
        Food {
            id,
            position,
            food_type,
        }
    }

    pub fn create_random(&mut self, position: Position, rng: &mut Rng) -> Food {
        let food_type = self.draw_type(rng);
        self.create(position, food_type)
    }
}
