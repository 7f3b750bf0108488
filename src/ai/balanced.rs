use super::evaluator::ArenaView;
use super::DecisionContext;
use crate::config::AiTierSettings;
use crate::constants::{DANGER_FATAL, PRIORITY_FLOOR};
use crate::food::Food;
use crate::rng::Rng;
use crate::types::{Direction, Position};

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

    let Some(target) = best_food(view, head) else {
        return view.best_direction_toward(head, current, view.center(), true);
    };

    let here = head.manhattan(target.position);
    let mut best: Option<(Direction, f64)> = None;
    for dir in view.legal_directions(current) {
        let next = head.step(dir);
        let danger = view.danger(next);
        let improvement = (here - next.manhattan(target.position)) as f64;
        let mut priority =
            improvement * 10.0 - danger as f64 * 3.0 + view.strategic_value(next) * 2.0;
        if danger >= DANGER_FATAL {
            priority -= 500.0;
        }
        if best.is_none_or(|(_, p)| priority > p) {
            best = Some((dir, priority));
        }
    }
    best.filter(|(_, p)| *p > PRIORITY_FLOOR).map(|(dir, _)| dir)
}

/// Cheapest reachable food by estimated path with danger weighted double.
pub(super) fn best_food<'a>(view: &ArenaView<'a>, head: Position) -> Option<&'a Food> {
    let mut best: Option<(&'a Food, i32)> = None;
    for food in view.foods.iter().filter(|f| !f.food_type.is_hazard()) {
        let score = -view.estimate_path_length(head, food.position) - view.danger(food.position) * 2;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((food, score));
        }
    }
    best.map(|(food, _)| food)
}
