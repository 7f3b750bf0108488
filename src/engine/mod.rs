use serde::Serialize;
use tracing::debug;

use crate::achievements::AchievementClass;
use crate::ai::{AiController, ArenaView, DecisionContext};
use crate::collision::detect_collisions;
use crate::config::GameConfig;
use crate::constants::{spawn_layout, MAX_MOVE_ROUNDS_PER_STEP, MAX_PENDING_EVENTS};
use crate::economy::FoodSpawner;
use crate::error::SessionError;
use crate::food::Food;
use crate::player::PlayerRecord;
use crate::respawn::{find_spawn, RespawnManager};
use crate::rng::Rng;
use crate::score::{determine_winner, score_of, scores};
use crate::snake::Snake;
use crate::stats::GameStats;
use crate::types::{
    AgentView, DeathCause, Difficulty, Direction, EffectView, FoodView, GameMode, GameOutcome,
    GameState, Position, RuntimeEvent, Snapshot,
};

mod effect_system;
mod lifecycle;
mod movement_system;
mod session;

pub const AGENT_COUNT: usize = 2;
/// Seat taken by the computer opponent in a versus-AI match.
pub const AI_AGENT: usize = 1;

/// One achievement unlocked for a seated player, queued for the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockEvent {
    pub agent: usize,
    pub user_id: String,
    pub achievement_id: &'static str,
    pub name: &'static str,
    pub class: AchievementClass,
}

#[derive(Clone, Debug)]
pub struct GameEngine {
    config: GameConfig,
    rng: Rng,
    state: GameState,
    mode: GameMode,
    seats: [Option<PlayerRecord>; AGENT_COUNT],
    ai: Option<AiController>,

    snakes: Vec<Snake>,
    food: FoodSpawner,
    respawn: RespawnManager,
    events: Vec<RuntimeEvent>,
    unlocks: Vec<UnlockEvent>,
    outcome: Option<GameOutcome>,

    tick_counter: u64,
    elapsed_ms: u64,
    second_accumulator_ms: u64,
    time_remaining_s: u32,
}

impl GameEngine {
    pub fn new(config: GameConfig, seed: u32) -> Self {
        let snakes = spawn_layout(config.grid_size)
            .iter()
            .map(|&(x, y, dir)| Snake::new(Position::new(x, y), dir, config.initial_length))
            .collect();
        let mut engine = Self {
            food: FoodSpawner::new(&config),
            respawn: RespawnManager::new(config.respawn_delay_ms),
            time_remaining_s: config.game_duration_s,
            config,
            rng: Rng::new(seed),
            state: GameState::Ready,
            mode: GameMode::TwoPlayer,
            seats: [None, None],
            ai: None,
            snakes,
            events: Vec::new(),
            unlocks: Vec::new(),
            outcome: None,
            tick_counter: 0,
            elapsed_ms: 0,
            second_accumulator_ms: 0,
        };
        engine.prepare_arena();
        engine
    }

    pub fn with_entropy(config: GameConfig) -> Self {
        let seed = rand::random::<u32>();
        debug!(seed, "engine seeded from entropy");
        Self::new(config, seed)
    }

    /// Advances the match by `dt_ms` of play time. Does nothing unless playing.
    pub fn step(&mut self, dt_ms: u64) {
        if self.state != GameState::Playing {
            return;
        }
        self.tick_counter += 1;
        self.elapsed_ms += dt_ms;
        let now_ms = self.elapsed_ms;

        self.update_respawns(dt_ms);
        self.update_movement(dt_ms, now_ms);
        self.update_effects(now_ms);

        let spawned = self.food.replenish(dt_ms, &self.snakes, &mut self.rng);
        if spawned > 0 {
            self.events.push(RuntimeEvent::FoodSpawned { count: spawned });
        }

        for player in self.seats.iter_mut().flatten() {
            player.stats.session.elapsed_ms = now_ms;
        }
        self.update_clock(dt_ms);
        self.trim_events();
    }

    /// Events accumulate until a snapshot is built with `include_events`.
    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let now_ms = self.elapsed_ms;
        let scores = scores(&self.snakes, &self.config);
        let agents = self
            .snakes
            .iter()
            .enumerate()
            .map(|(index, snake)| AgentView {
                index,
                name: self.agent_name(index),
                ai: self.is_ai_agent(index),
                alive: snake.is_alive(),
                direction: snake.direction(),
                body: snake.body().collect(),
                length: snake.len(),
                score: scores.get(index).copied().unwrap_or(0),
                food_eaten: snake.food_eaten(),
                speed_multiplier: snake.speed_multiplier(),
                effects: snake
                    .effects()
                    .iter()
                    .map(|effect| EffectView {
                        kind: effect.kind(),
                        remaining_ms: effect.remaining_ms(now_ms),
                    })
                    .collect(),
                respawn_in_ms: self.respawn.remaining_ms(index),
                last_death_at: snake.last_death_at(),
            })
            .collect();

        Snapshot {
            tick: self.tick_counter,
            elapsed_ms: now_ms,
            state: self.state,
            time_remaining_s: self.time_remaining_s,
            grid_size: self.config.grid_size,
            agents,
            foods: self
                .food
                .foods()
                .iter()
                .map(|food| FoodView {
                    id: food.id,
                    food_type: food.food_type,
                    at: food.position,
                })
                .collect(),
            outcome: self.outcome.clone(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.ai.as_ref().map(AiController::difficulty)
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    /// Play time since `start`; frozen while paused.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn time_remaining_s(&self) -> u32 {
        self.time_remaining_s
    }

    pub fn snakes(&self) -> &[Snake] {
        &self.snakes
    }

    pub fn foods(&self) -> &[Food] {
        self.food.foods()
    }

    pub fn score(&self, agent: usize) -> Option<u64> {
        self.snakes
            .get(agent)
            .map(|snake| score_of(snake, &self.config))
    }

    pub fn length(&self, agent: usize) -> Option<usize> {
        self.snakes.get(agent).map(Snake::len)
    }

    pub fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Milliseconds until the agent is back, `None` when it is not waiting.
    pub fn respawn_countdown_ms(&self, agent: usize) -> Option<u64> {
        self.respawn.remaining_ms(agent)
    }

    pub fn player(&self, agent: usize) -> Option<&PlayerRecord> {
        self.seats.get(agent).and_then(Option::as_ref)
    }

    /// Records of the seated players, ready for the registry.
    pub fn session_players(&self) -> Vec<PlayerRecord> {
        self.seats.iter().flatten().cloned().collect()
    }

    pub fn drain_unlocks(&mut self) -> Vec<UnlockEvent> {
        std::mem::take(&mut self.unlocks)
    }

    pub fn is_ai_agent(&self, agent: usize) -> bool {
        self.ai.as_ref().is_some_and(|ai| ai.agent() == agent)
    }

    /// Board view and scores from `agent`'s side, for an external controller.
    pub fn decision_context(&self, agent: usize) -> Option<DecisionContext<'_>> {
        if agent >= self.snakes.len() {
            return None;
        }
        let scores = scores(&self.snakes, &self.config);
        let opponent_score = scores
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != agent)
            .map(|(_, score)| *score)
            .max()
            .unwrap_or(0);
        Some(DecisionContext {
            view: ArenaView::new(self.config.grid_size, &self.snakes, self.food.foods(), agent),
            own_score: scores[agent],
            opponent_score,
        })
    }

    fn agent_name(&self, agent: usize) -> String {
        if let Some(player) = self.player(agent) {
            return player.user_name.clone();
        }
        if self.is_ai_agent(agent) {
            return "AI".to_string();
        }
        format!("Player {}", agent + 1)
    }

    fn stats_mut(&mut self, agent: usize) -> Option<&mut GameStats> {
        self.seats
            .get_mut(agent)?
            .as_mut()
            .map(|player| &mut player.stats)
    }

    fn trim_events(&mut self) {
        if self.events.len() <= MAX_PENDING_EVENTS {
            return;
        }
        let excess = self.events.len() - MAX_PENDING_EVENTS;
        self.events.drain(..excess);
        debug!(dropped = excess, "undrained events trimmed");
    }

    fn update_clock(&mut self, dt_ms: u64) {
        self.second_accumulator_ms += dt_ms;
        while self.second_accumulator_ms >= 1_000 && self.state == GameState::Playing {
            self.second_accumulator_ms -= 1_000;
            self.time_remaining_s = self.time_remaining_s.saturating_sub(1);
            self.evaluate_seats(AchievementClass::Session);
            if self.time_remaining_s == 0 {
                self.finish();
            }
        }
    }
}
