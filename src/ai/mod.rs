use crate::config::AiTierSettings;
use crate::rng::Rng;
use crate::types::{Difficulty, Direction};

mod adversarial;
mod balanced;
pub mod evaluator;
mod reactive;

pub use self::evaluator::ArenaView;

/// Everything a tier may look at for one decision.
#[derive(Clone, Copy, Debug)]
pub struct DecisionContext<'a> {
    pub view: ArenaView<'a>,
    pub own_score: u64,
    pub opponent_score: u64,
}

/// Drives one agent. Decisions are rate-limited by the tier's reaction delay;
/// the first one after a reset is never delayed.
#[derive(Clone, Debug)]
pub struct AiController {
    agent: usize,
    difficulty: Difficulty,
    settings: AiTierSettings,
    last_decision_ms: Option<u64>,
}

impl AiController {
    pub fn new(agent: usize, difficulty: Difficulty, settings: AiTierSettings) -> Self {
        Self {
            agent,
            difficulty,
            settings,
            last_decision_ms: None,
        }
    }

    pub fn agent(&self) -> usize {
        self.agent
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn reset(&mut self) {
        self.last_decision_ms = None;
    }

    pub fn decide(
        &mut self,
        ctx: &DecisionContext<'_>,
        now_ms: u64,
        rng: &mut Rng,
    ) -> Option<Direction> {
        if let Some(last) = self.last_decision_ms {
            if now_ms.saturating_sub(last) < self.settings.reaction_delay_ms {
                return None;
            }
        }
        self.last_decision_ms = Some(now_ms);

        let snake = ctx.view.snake()?;
        if !snake.is_alive() {
            return None;
        }
        let choice = match self.difficulty {
            Difficulty::Easy => reactive::decide(ctx, &self.settings, rng),
            Difficulty::Normal => balanced::decide(ctx, &self.settings, rng),
            Difficulty::Hard => adversarial::decide(ctx, &self.settings, rng),
        };
        choice.filter(|dir| !dir.is_opposite(snake.direction()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::food::Food;
    use crate::snake::Snake;
    use crate::types::{FoodType, Position};

    fn arena(head: Position, dir: Direction, foods: Vec<Food>) -> (Vec<Snake>, Vec<Food>) {
        let snakes = vec![
            Snake::new(head, dir, 3),
            Snake::new(Position::new(26, 28), Direction::Left, 3),
        ];
        (snakes, foods)
    }

    fn food_at(x: i32, y: i32) -> Food {
        Food {
            id: 1,
            position: Position::new(x, y),
            food_type: FoodType::Normal,
        }
    }

    #[test]
    fn reaction_delay_throttles_decisions() {
        let config = GameConfig::default();
        let (snakes, foods) = arena(Position::new(10, 10), Direction::Right, vec![food_at(10, 4)]);
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 0,
            opponent_score: 0,
        };
        let mut ai = AiController::new(0, Difficulty::Normal, config.ai.normal.clone());
        let mut rng = Rng::new(1);
        assert!(ai.decide(&ctx, 0, &mut rng).is_some());
        assert!(ai.decide(&ctx, 99, &mut rng).is_none());
        assert!(ai.decide(&ctx, 100, &mut rng).is_some());
    }

    #[test]
    fn no_tier_ever_reverses() {
        let config = GameConfig::default();
        // food straight behind the head
        let (snakes, foods) = arena(Position::new(10, 10), Direction::Right, vec![food_at(4, 10)]);
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 400,
            opponent_score: 300,
        };
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            let mut rng = Rng::new(5);
            for step in 0..200u64 {
                let mut ai = AiController::new(
                    0,
                    difficulty,
                    config.ai_settings(difficulty).clone(),
                );
                if let Some(dir) = ai.decide(&ctx, step * 1_000, &mut rng) {
                    assert_ne!(dir, Direction::Left, "{difficulty:?} reversed");
                }
            }
        }
    }

    #[test]
    fn dead_agent_makes_no_decision() {
        let config = GameConfig::default();
        let (mut snakes, foods) = arena(Position::new(10, 10), Direction::Right, vec![]);
        snakes[0].die();
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 0,
            opponent_score: 0,
        };
        let mut ai = AiController::new(0, Difficulty::Hard, config.ai.hard.clone());
        assert_eq!(ai.decide(&ctx, 0, &mut Rng::new(2)), None);
    }
}
