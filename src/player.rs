use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};
use rand::distr::Alphanumeric;
use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::achievements::{self, AchievementClass, AchievementState};
use crate::stats::GameStats;

pub const MAX_NAME_CHARS: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub stats: GameStats,
    #[serde(default)]
    pub achievements: Vec<AchievementState>,
    pub created_at: String,
    pub last_played_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub user_id: String,
    pub user_name: String,
    pub level: u64,
    pub total_games: u64,
    pub total_wins: u64,
    pub win_rate: u64,
    pub achievements_unlocked: usize,
    pub achievements_total: usize,
    pub completion_percent: u64,
    pub last_played_at: String,
}

impl PlayerRecord {
    /// `name` is expected to be validated already.
    pub fn new(name: &str) -> Self {
        let now = now_iso();
        Self {
            user_id: generate_user_id(),
            user_name: name.to_string(),
            stats: GameStats::default(),
            achievements: achievements::fresh_states(),
            created_at: now.clone(),
            last_played_at: now,
        }
    }

    pub fn level(&self) -> u64 {
        self.stats.level()
    }

    pub fn win_rate(&self) -> u64 {
        self.stats.win_rate()
    }

    pub fn completion_percent(&self) -> u64 {
        achievements::completion_percent(&self.achievements)
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }

    pub fn touch(&mut self) {
        self.last_played_at = now_iso();
    }

    pub fn sync_catalog(&mut self) {
        let loaded = std::mem::take(&mut self.achievements);
        self.achievements = achievements::merge_with_catalog(loaded);
    }

    pub fn evaluate_achievements(
        &mut self,
        class: AchievementClass,
    ) -> Vec<&'static achievements::AchievementDef> {
        achievements::evaluate(&mut self.achievements, &self.stats, class, &now_iso())
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            level: self.level(),
            total_games: self.stats.total_games,
            total_wins: self.stats.total_wins,
            win_rate: self.win_rate(),
            achievements_unlocked: self.unlocked_count(),
            achievements_total: self.achievements.len(),
            completion_percent: self.completion_percent(),
            last_played_at: self.last_played_at.clone(),
        }
    }
}

/// Trimmed and cut to the display limit; `None` when nothing is left.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn generate_user_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("user_{millis}_{suffix}")
}
