use crate::config::GameConfig;
use crate::snake::Snake;

pub fn score_of(snake: &Snake, config: &GameConfig) -> u64 {
    snake.food_eaten() as u64 * config.score_per_food + snake.len() as u64 * config.score_per_length
}

pub fn scores(snakes: &[Snake], config: &GameConfig) -> Vec<u64> {
    snakes.iter().map(|snake| score_of(snake, config)).collect()
}

/// Index of the strictly highest score; `None` when the top is shared.
pub fn determine_winner(scores: &[u64]) -> Option<usize> {
    let best = *scores.iter().max()?;
    let mut leaders = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score == best)
        .map(|(idx, _)| idx);
    let first = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(first)
}
