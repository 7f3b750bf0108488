use clap::Parser;
use serde::Serialize;
use snake_duel::ai::AiController;
use snake_duel::config::GameConfig;
use snake_duel::constants::STEP_MS;
use snake_duel::engine::GameEngine;
use snake_duel::player::PlayerRecord;
use snake_duel::rng::Rng;
use snake_duel::types::{
    Difficulty, Direction, GameMode, GameState, RuntimeEvent, Snapshot,
};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PILOT_AGENT: usize = 0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless AI-vs-AI snake duels with anomaly checks")]
struct Cli {
    #[arg(long)]
    single: bool,
    /// Tier driving agent 0.
    #[arg(long)]
    difficulty: Option<String>,
    /// Tier of the built-in opponent on agent 1.
    #[arg(long)]
    opponent: Option<String>,
    #[arg(long)]
    seconds: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated milliseconds per step.
    #[arg(long)]
    step_ms: Option<u64>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    difficulty: Difficulty,
    opponent: Difficulty,
    seconds: u32,
    seed: u32,
    step_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    difficulty: Difficulty,
    opponent: Difficulty,
    seconds: u32,
    winner: String,
    scores: Vec<u64>,
    duration_ms: u64,
    food_eaten: u32,
    deaths: u32,
    respawns: u32,
    forced_respawns: u32,
    effects_applied: u32,
    unlocks: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenario_count: usize,
    anomaly_count: usize,
    average_duration_ms: u64,
    winner_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref().map(GameConfig::load) {
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            error!(error = %err, "config load failed");
            std::process::exit(2);
        }
        None => GameConfig::default(),
    };
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut winner_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            difficulty = ?scenario.difficulty,
            opponent = ?scenario.opponent,
            seconds = scenario.seconds,
            "scenario_started"
        );
        let scenario_run = run_scenario(&scenario, &config);

        for anomaly in &scenario_run.anomaly_records {
            warn!(
                match_id = %match_id,
                scenario = %scenario.name,
                tick = anomaly.tick,
                message = %anomaly.message,
                "anomaly_detected"
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *winner_counts
            .entry(scenario_run.result.winner.clone())
            .or_insert(0) += 1;

        info!(
            match_id = %match_id,
            scenario = %scenario.name,
            tick = scenario_run.finished_tick,
            winner = %scenario_run.result.winner,
            duration_ms = scenario_run.result.duration_ms,
            anomaly_count = scenario_run.anomaly_records.len(),
            "scenario_finished"
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(error = %err, "scenario result did not serialize"),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        winner_counts,
        total_anomalies,
        total_duration_ms,
    );

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(
                match_id = %match_id,
                path = %path.display(),
                error = %err,
                "summary_write_failed"
            );
            std::process::exit(2);
        }
    }

    info!(
        match_id = %match_id,
        scenario_count = summary.scenario_count,
        anomaly_count = summary.anomaly_count,
        average_duration_ms = summary.average_duration_ms,
        "run_finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, base: &GameConfig) -> ScenarioRunResult {
    let config = GameConfig {
        game_duration_s: scenario.seconds,
        ..base.clone()
    };
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    let mut engine = GameEngine::new(config.clone(), scenario.seed);
    let pilot = PlayerRecord::new("sim-pilot");
    let setup = engine
        .setup_session(GameMode::VersusAi, Some(pilot), None, scenario.opponent)
        .and_then(|()| engine.start());
    if let Err(err) = setup {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            0,
            format!("session rejected: {err}"),
        );
    }

    let mut driver = AiController::new(
        PILOT_AGENT,
        scenario.difficulty,
        config.ai_settings(scenario.difficulty).clone(),
    );
    let mut driver_rng = Rng::new(scenario.seed.wrapping_add(0x9e37_79b9));
    let tick_limit = config.game_duration_ms() / scenario.step_ms.max(1) + 1_000;
    let mut previous: Option<Snapshot> = None;
    let mut food_eaten = 0;
    let mut deaths = 0;
    let mut respawns = 0;
    let mut forced_respawns = 0;
    let mut effects_applied = 0;
    let mut unlocks = 0;
    let mut last_tick = 0u64;

    while engine.state() == GameState::Playing {
        if let Some(ctx) = engine.decision_context(PILOT_AGENT) {
            if let Some(dir) = driver.decide(&ctx, engine.elapsed_ms(), &mut driver_rng) {
                engine.change_direction(PILOT_AGENT, dir);
            }
        }
        engine.step(scenario.step_ms);
        unlocks += engine.drain_unlocks().len();

        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;
        let mut messages = collect_snapshot_anomalies(&snapshot, config.max_food, config.initial_length);
        if let Some(prev) = previous.as_ref() {
            messages.extend(collect_reversals(prev, &snapshot));
        }
        if engine.snakes().iter().any(|snake| !snake.check_invariants()) {
            messages.push("occupancy index diverged from body".to_string());
        }
        for message in messages {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                RuntimeEvent::FoodEaten { .. } => food_eaten += 1,
                RuntimeEvent::AgentDied { .. } => deaths += 1,
                RuntimeEvent::AgentRespawned { forced, .. } => {
                    respawns += 1;
                    if *forced {
                        forced_respawns += 1;
                    }
                }
                RuntimeEvent::EffectApplied { .. } => effects_applied += 1,
                _ => {}
            }
        }
        previous = Some(snapshot);

        if last_tick > tick_limit {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                last_tick,
                "tick safety limit exceeded".to_string(),
            );
            break;
        }
    }

    let outcome = engine.outcome().cloned();
    if outcome.is_none() && setup_ok(&anomalies) {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            last_tick,
            "match ended without an outcome".to_string(),
        );
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            difficulty: scenario.difficulty,
            opponent: scenario.opponent,
            seconds: scenario.seconds,
            winner: winner_key(outcome.as_ref().and_then(|o| o.winner)),
            scores: outcome.map(|o| o.scores).unwrap_or_default(),
            duration_ms: engine.elapsed_ms(),
            food_eaten,
            deaths,
            respawns,
            forced_respawns,
            effects_applied,
            unlocks,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn setup_ok(anomalies: &[String]) -> bool {
    !anomalies
        .iter()
        .any(|message| message.starts_with("session rejected"))
}

fn collect_snapshot_anomalies(
    snapshot: &Snapshot,
    max_food: usize,
    initial_length: usize,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.foods.len() > max_food {
        anomalies.push(format!(
            "food population above ceiling: {}/{max_food}",
            snapshot.foods.len()
        ));
    }

    let mut seen = HashSet::new();
    for food in &snapshot.foods {
        if !food.at.in_bounds(snapshot.grid_size) {
            anomalies.push(format!("food {} outside the grid", food.id));
        }
        if !seen.insert(food.at) {
            anomalies.push(format!("stacked food at {},{}", food.at.x, food.at.y));
        }
    }

    for agent in &snapshot.agents {
        if agent.alive && agent.length < initial_length {
            anomalies.push(format!(
                "agent {} shorter than initial length: {}",
                agent.index, agent.length
            ));
        }
        if agent.alive && agent.respawn_in_ms.is_some() {
            anomalies.push(format!("agent {} alive with a pending respawn", agent.index));
        }
    }
    anomalies
}

/// Living agents must never flip onto their previous heading between ticks,
/// unless they just respawned.
fn collect_reversals(previous: &Snapshot, current: &Snapshot) -> Vec<String> {
    let respawned: HashSet<usize> = current
        .events
        .iter()
        .filter_map(|event| match event {
            RuntimeEvent::AgentRespawned { agent, .. } => Some(*agent),
            _ => None,
        })
        .collect();
    let mut anomalies = Vec::new();
    for (before, after) in previous.agents.iter().zip(&current.agents) {
        if !before.alive || !after.alive || respawned.contains(&after.index) {
            continue;
        }
        if is_reversal(before.direction, after.direction) {
            anomalies.push(format!(
                "agent {} reversed {:?} -> {:?}",
                after.index, before.direction, after.direction
            ));
        }
    }
    anomalies
}

fn is_reversal(before: Direction, after: Direction) -> bool {
    after.is_opposite(before)
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));
    let difficulty = cli
        .difficulty
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(Difficulty::Normal);
    let opponent = cli
        .opponent
        .as_deref()
        .and_then(Difficulty::parse)
        .unwrap_or(difficulty);
    let step_ms = cli.step_ms.unwrap_or(STEP_MS).clamp(1, 100);

    if cli.single || cli.difficulty.is_some() || cli.seconds.is_some() {
        return vec![Scenario {
            name: format!("custom-{difficulty:?}-vs-{opponent:?}").to_lowercase(),
            difficulty,
            opponent,
            seconds: cli.seconds.unwrap_or(60).clamp(1, 600),
            seed,
            step_ms,
        }];
    }

    vec![
        Scenario {
            name: "quick-check-easy-vs-normal".to_string(),
            difficulty: Difficulty::Easy,
            opponent: Difficulty::Normal,
            seconds: 60,
            seed,
            step_ms,
        },
        Scenario {
            name: "balance-check-hard-mirror".to_string(),
            difficulty: Difficulty::Hard,
            opponent: Difficulty::Hard,
            seconds: 120,
            seed: normalize_seed(seed as u64 + 1),
            step_ms,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn winner_key(winner: Option<usize>) -> String {
    match winner {
        Some(agent) => format!("agent{agent}"),
        None => "draw".to_string(),
    }
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("duel-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    winner_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        winner_counts,
        scenarios,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(winner: &str, duration_ms: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            difficulty: Difficulty::Normal,
            opponent: Difficulty::Hard,
            seconds: 60,
            winner: winner.to_string(),
            scores: vec![500, 400],
            duration_ms,
            food_eaten: 0,
            deaths: 0,
            respawns: 0,
            forced_respawns: 0,
            effects_applied: 0,
            unlocks: 0,
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "duel-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "duel-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result("agent0", 60_000),
                make_scenario_result("draw", 90_000),
            ],
            BTreeMap::from([("agent0".to_string(), 1usize), ("draw".to_string(), 1usize)]),
            1,
            150_000,
        );
        assert_eq!(summary.average_duration_ms, 75_000);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("snake-duel-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary(
            "duel-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result("agent1", 60_000)],
            BTreeMap::from([("agent1".to_string(), 1usize)]),
            0,
            60_000,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same anomaly".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same anomaly".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn winner_key_labels_draws() {
        assert_eq!(winner_key(Some(1)), "agent1");
        assert_eq!(winner_key(None), "draw");
    }

    #[test]
    fn short_duel_finishes_on_the_clock() {
        let scenario = Scenario {
            name: "unit".to_string(),
            difficulty: Difficulty::Hard,
            opponent: Difficulty::Normal,
            seconds: 5,
            seed: 2_024,
            step_ms: STEP_MS,
        };
        let run = run_scenario(&scenario, &GameConfig::default());
        assert_eq!(run.result.duration_ms, 5_008);
        assert_eq!(run.result.scores.len(), 2);
        assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
    }
}
