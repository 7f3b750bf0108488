use tracing::{debug, info};

use super::*;

impl GameEngine {
    pub(super) fn update_respawns(&mut self, dt_ms: u64) {
        for agent in self.respawn.tick(dt_ms) {
            let placement = find_spawn(
                self.config.initial_length,
                self.config.grid_size,
                &self.snakes,
                &mut self.food,
                &mut self.rng,
            );
            let Some(snake) = self.snakes.get_mut(agent) else {
                continue;
            };
            snake.respawn(placement.head, placement.direction, self.config.initial_length);
            info!(agent, x = placement.head.x, y = placement.head.y, forced = placement.forced, "agent respawned");
            self.events.push(RuntimeEvent::AgentRespawned {
                agent,
                at: placement.head,
                direction: placement.direction,
                forced: placement.forced,
            });
        }
    }

    /// Per-agent accumulators decide who moves; everyone due in the same
    /// round moves before collisions are judged.
    pub(super) fn update_movement(&mut self, dt_ms: u64, now_ms: u64) {
        let base = self.config.move_interval_ms;
        for snake in &mut self.snakes {
            if snake.is_alive() {
                snake.move_accumulator_ms += dt_ms as f64;
            } else {
                snake.move_accumulator_ms = 0.0;
            }
        }

        for _ in 0..MAX_MOVE_ROUNDS_PER_STEP {
            let mut movers = Vec::new();
            for (idx, snake) in self.snakes.iter_mut().enumerate() {
                let interval = snake.move_interval_ms(base);
                if snake.is_alive() && snake.move_accumulator_ms >= interval {
                    snake.move_accumulator_ms -= interval;
                    movers.push(idx);
                }
            }
            if movers.is_empty() {
                break;
            }
            self.run_move_round(&movers, now_ms);
        }

        for snake in &mut self.snakes {
            let interval = snake.move_interval_ms(base);
            if snake.move_accumulator_ms > interval {
                snake.move_accumulator_ms = interval;
            }
        }
    }

    fn run_move_round(&mut self, movers: &[usize], now_ms: u64) {
        if let Some(agent) = self.ai.as_ref().map(AiController::agent) {
            if movers.contains(&agent) {
                self.apply_ai_decision(agent, now_ms);
            }
        }

        for &agent in movers {
            if !self.snakes[agent].is_alive() {
                continue;
            }
            self.snakes[agent].advance();
            let length = self.snakes[agent].len();
            if let Some(stats) = self.stats_mut(agent) {
                stats.record_move();
                stats.record_length(length);
            }
        }

        let report = detect_collisions(&self.snakes, self.config.grid_size);
        for (agent, cause) in report.deaths {
            self.kill_agent(agent, cause);
        }

        for agent in 0..self.snakes.len() {
            let snake = &self.snakes[agent];
            if !snake.is_alive() {
                continue;
            }
            if let Some(food_id) = self.food.food_at(snake.head()).map(|food| food.id) {
                self.consume_food(agent, food_id, false, now_ms);
            }
        }

        self.track_lead();
    }

    fn apply_ai_decision(&mut self, agent: usize, now_ms: u64) {
        let scores = scores(&self.snakes, &self.config);
        let Some(ai) = self.ai.as_mut() else {
            return;
        };
        let ctx = DecisionContext {
            view: ArenaView::new(self.config.grid_size, &self.snakes, self.food.foods(), agent),
            own_score: scores.get(agent).copied().unwrap_or(0),
            opponent_score: scores
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != agent)
                .map(|(_, score)| *score)
                .max()
                .unwrap_or(0),
        };
        if let Some(dir) = ai.decide(&ctx, now_ms, &mut self.rng) {
            self.snakes[agent].change_direction(dir);
        }
    }

    /// Sole death path: stats, body drop, event, respawn queue.
    pub(super) fn kill_agent(&mut self, agent: usize, cause: DeathCause) {
        let Some(snake) = self.snakes.get_mut(agent) else {
            return;
        };
        if !snake.is_alive() {
            return;
        }
        let at = snake.head();
        let length = snake.len();
        let drop = snake.drop_count(self.config.food_drop_rate);
        snake.die();

        if let Some(stats) = self.stats_mut(agent) {
            stats.record_death(cause);
        }
        let dropped = self.food.spawn(drop, &self.snakes, &mut self.rng);
        info!(agent, ?cause, length, dropped, "agent died");
        self.events.push(RuntimeEvent::AgentDied { agent, cause, at });
        self.respawn.schedule(agent);
    }

    /// Shared by head contact and magnet pickup. The item leaves the board
    /// before its reward is granted, so it can only be eaten once.
    pub(super) fn consume_food(&mut self, agent: usize, food_id: u64, via_magnet: bool, now_ms: u64) {
        let Some(food) = self.food.remove(food_id) else {
            return;
        };
        let reward = food.food_type.reward(&self.config, now_ms);
        if reward.fatal {
            if let Some(stats) = self.stats_mut(agent) {
                stats.record_mine_hit();
            }
            self.kill_agent(agent, DeathCause::Mine);
            return;
        }
        self.events.push(RuntimeEvent::FoodEaten {
            agent,
            food_type: food.food_type,
            at: food.position,
            magnet: via_magnet,
        });

        let snake = &mut self.snakes[agent];
        snake.grow(reward.growth);
        snake.add_food_eaten(reward.food_value);
        if let Some(stats) = self.stats_mut(agent) {
            stats.record_food(food.food_type);
            if via_magnet {
                stats.record_magnet_collected(1);
            }
        }

        if let Some(effect) = reward.effect {
            let kind = effect.kind();
            let expires_at_ms = effect.expires_at_ms;
            self.snakes[agent].add_effect(effect);
            debug!(agent, ?kind, expires_at_ms, "effect applied");
            self.events.push(RuntimeEvent::EffectApplied {
                agent,
                effect: kind,
                expires_at_ms,
            });
        }
    }

    /// A seated player loses the lead the first time the other agent scores higher.
    fn track_lead(&mut self) {
        if self.snakes.len() < AGENT_COUNT {
            return;
        }
        let scores = scores(&self.snakes, &self.config);
        for agent in 0..AGENT_COUNT {
            let other = AGENT_COUNT - 1 - agent;
            if scores[other] <= scores[agent] {
                continue;
            }
            let Some(stats) = self.stats_mut(agent) else {
                continue;
            };
            if stats.session.held_lead {
                stats.mark_lost_lead();
                self.events.push(RuntimeEvent::LeadLost { agent });
            }
        }
    }
}
