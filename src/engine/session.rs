use tracing::info;

use super::*;

impl GameEngine {
    /// Seats the players for the next match. In versus-AI mode the computer
    /// takes agent 1 and `player2` is ignored.
    pub fn setup_session(
        &mut self,
        mode: GameMode,
        player1: Option<PlayerRecord>,
        player2: Option<PlayerRecord>,
        difficulty: Difficulty,
    ) -> Result<(), SessionError> {
        if matches!(self.state, GameState::Playing | GameState::Paused) {
            return Err(SessionError::MatchInProgress);
        }
        let player1 = player1.ok_or(SessionError::MissingFirstPlayer)?;
        let player2 = match mode {
            GameMode::TwoPlayer => {
                let player2 = player2.ok_or(SessionError::MissingSecondPlayer)?;
                if player2.user_id == player1.user_id {
                    return Err(SessionError::SamePlayerTwice);
                }
                Some(player2)
            }
            GameMode::VersusAi => None,
        };

        self.mode = mode;
        self.ai = match mode {
            GameMode::VersusAi => Some(AiController::new(
                AI_AGENT,
                difficulty,
                self.config.ai_settings(difficulty).clone(),
            )),
            GameMode::TwoPlayer => None,
        };
        self.seats = [Some(player1), player2];
        for player in self.seats.iter_mut().flatten() {
            player.sync_catalog();
        }
        info!(?mode, ?difficulty, "session prepared");
        self.prepare_arena();
        Ok(())
    }

    pub(super) fn has_valid_session(&self) -> bool {
        if self.seats[0].is_none() {
            return false;
        }
        match self.mode {
            GameMode::TwoPlayer => self.seats[1].is_some(),
            GameMode::VersusAi => self.ai.is_some(),
        }
    }

    /// Buffers a turn for a human-controlled agent.
    pub fn change_direction(&mut self, agent: usize, dir: Direction) -> bool {
        if self.state != GameState::Playing || self.is_ai_agent(agent) {
            return false;
        }
        self.snakes
            .get_mut(agent)
            .is_some_and(|snake| snake.is_alive() && snake.change_direction(dir))
    }

    /// Unlocks `class` achievements for every seated player and queues them.
    pub(super) fn evaluate_seats(&mut self, class: AchievementClass) {
        for (agent, seat) in self.seats.iter_mut().enumerate() {
            let Some(player) = seat.as_mut() else {
                continue;
            };
            for def in player.evaluate_achievements(class) {
                info!(agent, user = %player.user_name, achievement = def.id, "achievement unlocked");
                self.unlocks.push(UnlockEvent {
                    agent,
                    user_id: player.user_id.clone(),
                    achievement_id: def.id,
                    name: def.name,
                    class,
                });
            }
        }
    }

    /// Ends the match: outcome, session achievements, fold into lifetime
    /// totals, then cumulative achievements.
    pub(super) fn finish(&mut self) {
        self.state = GameState::Over;
        let scores = scores(&self.snakes, &self.config);
        let winner = determine_winner(&scores);

        for (agent, seat) in self.seats.iter_mut().enumerate() {
            if let Some(player) = seat {
                player.stats.session.won = winner == Some(agent);
            }
        }
        self.evaluate_seats(AchievementClass::Session);
        for (agent, seat) in self.seats.iter_mut().enumerate() {
            if let Some(player) = seat {
                player.stats.end_game(winner == Some(agent));
            }
        }
        self.evaluate_seats(AchievementClass::Cumulative);
        for player in self.seats.iter_mut().flatten() {
            player.touch();
        }

        info!(?winner, ?scores, elapsed_ms = self.elapsed_ms, "match over");
        self.events.push(RuntimeEvent::GameOver { winner });
        self.outcome = Some(GameOutcome { winner, scores });
    }
}
