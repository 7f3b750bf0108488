use super::DecisionContext;
use crate::config::AiTierSettings;
use crate::rng::Rng;
use crate::types::Direction;

/// Greedy axis-by-axis chase of the nearest food with one safety check.
pub(super) fn decide(
    ctx: &DecisionContext<'_>,
    settings: &AiTierSettings,
    rng: &mut Rng,
) -> Option<Direction> {
    let view = &ctx.view;
    let snake = view.snake()?;
    let head = snake.head();
    let current = snake.direction();

    if rng.bool(settings.error_rate) {
        if let Some(dir) = rng.pick(&view.safe_directions(head, current)) {
            return Some(dir);
        }
    }

    let Some(food) = view.nearest_food(head) else {
        return view.safe_directions(head, current).first().copied();
    };

    let target = food.position;
    let dir = if target.x > head.x && current != Direction::Left {
        Direction::Right
    } else if target.x < head.x && current != Direction::Right {
        Direction::Left
    } else if target.y > head.y && current != Direction::Up {
        Direction::Down
    } else if target.y < head.y && current != Direction::Down {
        Direction::Up
    } else {
        current
    };

    if view.is_fatal(head.step(dir)) {
        return rng.pick(&view.safe_directions(head, current));
    }
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ArenaView;
    use crate::food::Food;
    use crate::snake::Snake;
    use crate::types::{FoodType, Position};

    fn settings(error_rate: f32) -> AiTierSettings {
        AiTierSettings {
            reaction_delay_ms: 200,
            error_rate,
            lookahead_depth: 0,
        }
    }

    #[test]
    fn steps_along_x_first() {
        let snakes = vec![Snake::new(Position::new(10, 10), Direction::Up, 3)];
        let foods = vec![Food {
            id: 1,
            position: Position::new(14, 3),
            food_type: FoodType::Normal,
        }];
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 0,
            opponent_score: 0,
        };
        assert_eq!(decide(&ctx, &settings(0.0), &mut Rng::new(1)), Some(Direction::Right));
    }

    #[test]
    fn fatal_greedy_step_falls_back_to_safe_direction() {
        let snakes = vec![
            Snake::new(Position::new(10, 10), Direction::Right, 3),
            Snake::new(Position::new(11, 10), Direction::Up, 3),
        ];
        let foods = vec![Food {
            id: 1,
            position: Position::new(15, 10),
            food_type: FoodType::Normal,
        }];
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 0,
            opponent_score: 0,
        };
        let dir = decide(&ctx, &settings(0.0), &mut Rng::new(1)).expect("a safe turn exists");
        assert!(dir == Direction::Up || dir == Direction::Down);
    }

    #[test]
    fn no_food_takes_first_safe_direction() {
        let snakes = vec![Snake::new(Position::new(10, 10), Direction::Right, 3)];
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &[], 0),
            own_score: 0,
            opponent_score: 0,
        };
        assert_eq!(decide(&ctx, &settings(0.0), &mut Rng::new(1)), Some(Direction::Up));
    }

    #[test]
    fn error_roll_without_safe_turns_keeps_the_greedy_path() {
        // walls above and left, the other body below
        let snakes = vec![
            Snake::new(Position::new(0, 0), Direction::Left, 3),
            Snake::new(Position::new(0, 1), Direction::Left, 3),
        ];
        let foods = vec![Food {
            id: 1,
            position: Position::new(5, 5),
            food_type: FoodType::Normal,
        }];
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 0,
            opponent_score: 0,
        };
        assert!(ctx.view.safe_directions(Position::new(0, 0), Direction::Left).is_empty());
        assert_eq!(
            decide(&ctx, &settings(1.0), &mut Rng::new(3)),
            decide(&ctx, &settings(0.0), &mut Rng::new(3))
        );
    }

    #[test]
    fn error_roll_picks_a_safe_turn_when_one_exists() {
        let snakes = vec![Snake::new(Position::new(0, 0), Direction::Left, 3)];
        let foods = vec![Food {
            id: 1,
            position: Position::new(5, 5),
            food_type: FoodType::Normal,
        }];
        let ctx = DecisionContext {
            view: ArenaView::new(32, &snakes, &foods, 0),
            own_score: 0,
            opponent_score: 0,
        };
        assert_eq!(decide(&ctx, &settings(1.0), &mut Rng::new(3)), Some(Direction::Down));
    }
}
