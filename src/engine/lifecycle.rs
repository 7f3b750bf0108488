use tracing::{debug, info};

use super::*;

impl GameEngine {
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.state != GameState::Ready {
            debug!(state = ?self.state, "start ignored");
            return Ok(());
        }
        if !self.has_valid_session() {
            return Err(SessionError::InvalidSession);
        }

        let initial_length = self.config.initial_length;
        for player in self.seats.iter_mut().flatten() {
            player.stats.reset_session();
            player.stats.record_length(initial_length);
        }
        self.reset_agents_and_clocks();
        let missing = self.config.initial_food.saturating_sub(self.food.len());
        self.food.spawn(missing, &self.snakes, &mut self.rng);

        self.state = GameState::Playing;
        info!(mode = ?self.mode, seed_food = self.food.len(), "match started");
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state != GameState::Playing {
            debug!(state = ?self.state, "pause ignored");
            return;
        }
        self.state = GameState::Paused;
    }

    /// Movement restarts from a clean accumulator so no burst of moves is
    /// replayed after the pause.
    pub fn resume(&mut self) {
        if self.state != GameState::Paused {
            debug!(state = ?self.state, "resume ignored");
            return;
        }
        for snake in &mut self.snakes {
            snake.move_accumulator_ms = 0.0;
        }
        self.state = GameState::Playing;
    }

    pub fn end(&mut self) {
        if !matches!(self.state, GameState::Playing | GameState::Paused) {
            debug!(state = ?self.state, "end ignored");
            return;
        }
        self.finish();
    }

    /// Back to a fresh board with the same seats.
    pub fn reset(&mut self) {
        self.prepare_arena();
        info!("match reset");
    }

    pub(super) fn prepare_arena(&mut self) {
        self.reset_agents_and_clocks();
        self.unlocks.clear();
        self.food.clear();
        self.food
            .spawn(self.config.initial_food, &self.snakes, &mut self.rng);
        self.state = GameState::Ready;
    }

    fn reset_agents_and_clocks(&mut self) {
        let length = self.config.initial_length;
        for (snake, (x, y, dir)) in self
            .snakes
            .iter_mut()
            .zip(spawn_layout(self.config.grid_size))
        {
            snake.reset_for_session(Position::new(x, y), dir, length);
        }
        if let Some(ai) = self.ai.as_mut() {
            ai.reset();
        }
        self.respawn.clear();
        self.outcome = None;
        self.tick_counter = 0;
        self.elapsed_ms = 0;
        self.second_accumulator_ms = 0;
        self.time_remaining_s = self.config.game_duration_s;
    }
}
