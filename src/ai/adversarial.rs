use super::evaluator::ArenaView;
use super::DecisionContext;
use crate::config::AiTierSettings;
use crate::constants::{DANGER_FATAL, PRIORITY_FLOOR};
use crate::food::Food;
use crate::rng::Rng;
use crate::types::{Direction, Position};

const LOOKAHEAD_FATAL: f64 = -50.0;
const LOOKAHEAD_DISCOUNT: f64 = 0.5;

/// Score-aware play: risk-averse and centre-holding while ahead, space-seeking
/// while behind, with a short straight-line lookahead.
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

    let leading = ctx.own_score > ctx.opponent_score;
    let Some(target) = select_food(view, head, leading) else {
        if leading {
            return view.best_direction_toward(head, current, view.center(), true);
        }
        return most_open_direction(view, head, current);
    };

    let danger_weight = if leading { 4.0 } else { 2.0 };
    let here = head.manhattan(target.position);
    let mut best: Option<(Direction, f64)> = None;
    for dir in view.legal_directions(current) {
        let next = head.step(dir);
        let danger = view.danger(next);
        let improvement = (here - next.manhattan(target.position)) as f64;
        let mut priority = improvement * 10.0 - danger as f64 * danger_weight
            + view.strategic_value(next) * 3.0
            + lookahead(view, next, dir, settings.lookahead_depth);
        if danger >= DANGER_FATAL {
            priority -= 500.0;
        }
        if best.is_none_or(|(_, p)| priority > p) {
            best = Some((dir, priority));
        }
    }
    best.filter(|(_, p)| *p > PRIORITY_FLOOR).map(|(dir, _)| dir)
}

fn select_food<'a>(view: &ArenaView<'a>, head: Position, leading: bool) -> Option<&'a Food> {
    let opponent_head = view
        .opponent()
        .filter(|opponent| opponent.is_alive())
        .map(|opponent| opponent.head());
    let danger_weight = if leading { 3.0 } else { 2.0 };
    let half = (view.grid_size / 2) as f64;
    let center = view.center();

    let mut best: Option<(&'a Food, f64)> = None;
    for food in view.foods.iter().filter(|f| !f.food_type.is_hazard()) {
        let mut score = -(view.estimate_path_length(head, food.position) as f64);
        if let Some(theirs) = opponent_head {
            if theirs.manhattan(food.position) < head.manhattan(food.position) {
                score -= 5.0;
            }
        }
        score -= view.danger(food.position) as f64 * danger_weight;
        score += (half - food.position.euclidean(center)) * 0.4;
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((food, score));
        }
    }
    best.map(|(food, _)| food)
}

fn most_open_direction(view: &ArenaView<'_>, head: Position, current: Direction) -> Option<Direction> {
    let mut best: Option<(Direction, usize)> = None;
    for dir in view.safe_directions(head, current) {
        let open = view.openness(head.step(dir));
        if best.is_none_or(|(_, o)| open > o) {
            best = Some((dir, open));
        }
    }
    best.map(|(dir, _)| dir)
}

/// Keeps going straight for `depth` plies; a blocked ply ends the line hard.
fn lookahead(view: &ArenaView<'_>, pos: Position, dir: Direction, depth: u32) -> f64 {
    if depth == 0 {
        return 0.0;
    }
    let next = pos.step(dir);
    if view.is_fatal(next) {
        return LOOKAHEAD_FATAL;
    }
    view.strategic_value(next) + LOOKAHEAD_DISCOUNT * lookahead(view, next, dir, depth - 1)
}
