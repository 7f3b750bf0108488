use serde::{Deserialize, Serialize};

use crate::stats::GameStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementClass {
    Cumulative,
    Session,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    TotalDistance,
    TotalFoodEaten,
    TotalSpeedTime,
    TotalSpeedFood,
    TotalSuperFood,
    TotalMagnetFood,
    TotalMineHit,
    TotalDeaths,
    TotalHeadToHead,
    TotalSelfCollisions,
    TotalGames,
    TotalWins,
    SessionFoodEaten,
    SessionMaxLength,
    SessionDistance,
    SessionMineHit,
    SessionMagnetCollected,
}

impl Metric {
    pub fn read(self, stats: &GameStats) -> u64 {
        let s = &stats.session;
        match self {
            Metric::TotalDistance => stats.total_distance,
            Metric::TotalFoodEaten => stats.total_food_eaten,
            Metric::TotalSpeedTime => stats.total_speed_time,
            Metric::TotalSpeedFood => stats.total_speed_food_eaten,
            Metric::TotalSuperFood => stats.total_super_food_eaten,
            Metric::TotalMagnetFood => stats.total_magnet_food_eaten,
            Metric::TotalMineHit => stats.total_mine_hit,
            Metric::TotalDeaths => stats.total_deaths,
            Metric::TotalHeadToHead => stats.total_head_to_head_collisions,
            Metric::TotalSelfCollisions => stats.total_self_collisions,
            Metric::TotalGames => stats.total_games,
            Metric::TotalWins => stats.total_wins,
            Metric::SessionFoodEaten => s.food_eaten,
            Metric::SessionMaxLength => s.max_length,
            Metric::SessionDistance => s.distance,
            Metric::SessionMineHit => s.mine_hit,
            Metric::SessionMagnetCollected => s.magnet_collected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    AtLeast(Metric, u64),
    WinWithoutDeath,
    WinAfterDeath,
    WinHoldingLead,
    Blitz { within_ms: u64, length: u64 },
}

impl Requirement {
    pub fn is_met(self, stats: &GameStats) -> bool {
        let s = &stats.session;
        match self {
            Requirement::AtLeast(metric, target) => metric.read(stats) >= target,
            Requirement::WinWithoutDeath => s.won && s.deaths == 0,
            Requirement::WinAfterDeath => s.won && s.has_resurrected,
            Requirement::WinHoldingLead => s.won && s.held_lead,
            Requirement::Blitz { within_ms, length } => {
                s.elapsed_ms <= within_ms && s.max_length >= length
            }
        }
    }

    /// `(current, target)` for progress display.
    pub fn progress(self, stats: &GameStats) -> (u64, u64) {
        match self {
            Requirement::AtLeast(metric, target) => (metric.read(stats), target),
            Requirement::Blitz { length, .. } => (stats.session.max_length, length),
            Requirement::WinWithoutDeath
            | Requirement::WinAfterDeath
            | Requirement::WinHoldingLead => (u64::from(self.is_met(stats)), 1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub class: AchievementClass,
    pub requirement: Requirement,
}

const fn lifetime(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    metric: Metric,
    target: u64,
) -> AchievementDef {
    AchievementDef {
        id,
        name,
        description,
        icon,
        class: AchievementClass::Cumulative,
        requirement: Requirement::AtLeast(metric, target),
    }
}

const fn in_match(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    requirement: Requirement,
) -> AchievementDef {
    AchievementDef {
        id,
        name,
        description,
        icon,
        class: AchievementClass::Session,
        requirement,
    }
}

pub const CATALOG: &[AchievementDef] = &[
    lifetime("traveler_1", "Wanderer", "Travel 100 cells", "🚶", Metric::TotalDistance, 100),
    lifetime("traveler_2", "Rambler", "Travel 300 cells", "🏃", Metric::TotalDistance, 300),
    lifetime("traveler_3", "Voyager", "Travel 1000 cells", "🧭", Metric::TotalDistance, 1_000),
    lifetime("traveler_4", "Explorer", "Travel 3000 cells", "🗺️", Metric::TotalDistance, 3_000),
    lifetime("traveler_5", "Globetrotter", "Travel 10000 cells", "🌍", Metric::TotalDistance, 10_000),
    lifetime("foodie_1", "Snacker", "Eat 50 food", "🍎", Metric::TotalFoodEaten, 50),
    lifetime("foodie_2", "Foodie", "Eat 100 food", "🍇", Metric::TotalFoodEaten, 100),
    lifetime("foodie_3", "Gourmet", "Eat 300 food", "🍱", Metric::TotalFoodEaten, 300),
    lifetime("foodie_4", "Glutton", "Eat 500 food", "🍔", Metric::TotalFoodEaten, 500),
    lifetime("foodie_5", "Devourer", "Eat 1000 food", "🍕", Metric::TotalFoodEaten, 1_000),
    lifetime("foodie_6", "Bottomless", "Eat 3000 food", "🎂", Metric::TotalFoodEaten, 3_000),
    lifetime("speedster_1", "Quick", "Spend 1000 seconds boosted", "💨", Metric::TotalSpeedTime, 1_000),
    lifetime("speedster_2", "Swift", "Spend 3000 seconds boosted", "🚀", Metric::TotalSpeedTime, 3_000),
    lifetime("speedster_3", "Lightning", "Spend 5000 seconds boosted", "⚡", Metric::TotalSpeedTime, 5_000),
    lifetime("special_speed_1", "Caffeinated", "Eat 10 speed food", "☕", Metric::TotalSpeedFood, 10),
    lifetime("special_speed_2", "Overclocked", "Eat 30 speed food", "🔋", Metric::TotalSpeedFood, 30),
    lifetime("special_super_1", "Sweet Tooth", "Eat 10 super food", "⭐", Metric::TotalSuperFood, 10),
    lifetime("special_super_2", "Star Collector", "Eat 30 super food", "🌟", Metric::TotalSuperFood, 30),
    lifetime("special_magnet_1", "Attractive", "Eat 10 magnet food", "🧲", Metric::TotalMagnetFood, 10),
    lifetime("special_magnet_2", "Lodestone", "Eat 30 magnet food", "🪨", Metric::TotalMagnetFood, 30),
    lifetime("bomb_1", "Sapper", "Hit 10 mines", "💣", Metric::TotalMineHit, 10),
    lifetime("bomb_2", "Demolitionist", "Hit 30 mines", "🧨", Metric::TotalMineHit, 30),
    lifetime("bomb_3", "Blast Proof", "Hit 50 mines", "💥", Metric::TotalMineHit, 50),
    lifetime("undying_1", "Stubborn", "Die 10 times", "💀", Metric::TotalDeaths, 10),
    lifetime("undying_2", "Persistent", "Die 30 times", "☠️", Metric::TotalDeaths, 30),
    lifetime("undying_3", "Relentless", "Die 50 times", "👻", Metric::TotalDeaths, 50),
    lifetime("undying_4", "Undying", "Die 100 times", "🧟", Metric::TotalDeaths, 100),
    lifetime("duel_1", "Jouster", "Collide head-on 5 times", "⚔️", Metric::TotalHeadToHead, 5),
    lifetime("duel_2", "Duelist", "Collide head-on 10 times", "🤺", Metric::TotalHeadToHead, 10),
    lifetime("duel_3", "Gladiator", "Collide head-on 20 times", "🛡️", Metric::TotalHeadToHead, 20),
    lifetime("duel_4", "Warlord", "Collide head-on 50 times", "🏹", Metric::TotalHeadToHead, 50),
    lifetime("self_1", "Knotted", "Bite yourself 5 times", "🌀", Metric::TotalSelfCollisions, 5),
    lifetime("self_2", "Tangled", "Bite yourself 10 times", "🪢", Metric::TotalSelfCollisions, 10),
    lifetime("self_3", "Ouroboros", "Bite yourself 20 times", "🐍", Metric::TotalSelfCollisions, 20),
    lifetime("self_4", "Self Destruct", "Bite yourself 50 times", "🔁", Metric::TotalSelfCollisions, 50),
    lifetime("veteran_1", "Regular", "Play 10 games", "🎮", Metric::TotalGames, 10),
    lifetime("veteran_2", "Seasoned", "Play 30 games", "🕹️", Metric::TotalGames, 30),
    lifetime("veteran_3", "Veteran", "Play 50 games", "🎖️", Metric::TotalGames, 50),
    lifetime("veteran_4", "Old Hand", "Play 100 games", "🏅", Metric::TotalGames, 100),
    lifetime("veteran_5", "Lifer", "Play 300 games", "🗿", Metric::TotalGames, 300),
    lifetime("winner_1", "Contender", "Win 10 games", "🥉", Metric::TotalWins, 10),
    lifetime("winner_2", "Victor", "Win 30 games", "🥈", Metric::TotalWins, 30),
    lifetime("winner_3", "Champion", "Win 50 games", "🥇", Metric::TotalWins, 50),
    lifetime("winner_4", "Legend", "Win 100 games", "🏆", Metric::TotalWins, 100),
    in_match("session_food_1", "Big Appetite", "Eat 20 food in one match", "🍽️", Requirement::AtLeast(Metric::SessionFoodEaten, 20)),
    in_match("session_food_2", "Feast", "Eat 30 food in one match", "🍖", Requirement::AtLeast(Metric::SessionFoodEaten, 30)),
    in_match("session_food_3", "Banquet", "Eat 40 food in one match", "🍗", Requirement::AtLeast(Metric::SessionFoodEaten, 40)),
    in_match("session_food_4", "Insatiable", "Eat 50 food in one match", "🥘", Requirement::AtLeast(Metric::SessionFoodEaten, 50)),
    in_match("session_length_1", "Long Boi", "Reach length 20 in one match", "📏", Requirement::AtLeast(Metric::SessionMaxLength, 20)),
    in_match("session_length_2", "Serpent", "Reach length 30 in one match", "🐉", Requirement::AtLeast(Metric::SessionMaxLength, 30)),
    in_match("session_length_3", "Leviathan", "Reach length 40 in one match", "🐲", Requirement::AtLeast(Metric::SessionMaxLength, 40)),
    in_match("session_length_4", "World Serpent", "Reach length 50 in one match", "🌊", Requirement::AtLeast(Metric::SessionMaxLength, 50)),
    in_match("perfect_survival", "Flawless", "Win without dying", "💎", Requirement::WinWithoutDeath),
    in_match("survivor", "Comeback", "Win after dying at least once", "🔥", Requirement::WinAfterDeath),
    in_match("marathon", "Marathon", "Travel 500 cells in one match", "🏃‍♂️", Requirement::AtLeast(Metric::SessionDistance, 500)),
    in_match("marathon_2", "Ultra Marathon", "Travel 1000 cells in one match", "🏃‍♀️", Requirement::AtLeast(Metric::SessionDistance, 1_000)),
    in_match("marathon_3", "Marathon King", "Travel 1500 cells in one match", "👟", Requirement::AtLeast(Metric::SessionDistance, 1_500)),
    in_match("blitz", "Blitz", "Reach length 15 within the first 60 seconds", "⚡", Requirement::Blitz { within_ms: 60_000, length: 15 }),
    in_match("mine_clearer", "Mine Clearer", "Hit 5 mines in one match", "💣", Requirement::AtLeast(Metric::SessionMineHit, 5)),
    in_match("magnet_master", "Magnet Master", "Pull in 30 food with a magnet in one match", "🧲", Requirement::AtLeast(Metric::SessionMagnetCollected, 30)),
    in_match("dominator", "Dominator", "Win without ever trailing", "👑", Requirement::WinHoldingLead),
];

pub fn definition(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.id == id)
}

/// Persisted per-player unlock state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementState {
    pub id: String,
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: u64,
    pub target: u64,
    pub percentage: u64,
}

pub fn progress(def: &AchievementDef, stats: &GameStats) -> Progress {
    let (current, target) = def.requirement.progress(stats);
    let ratio = if target == 0 {
        1.0
    } else {
        current as f64 / target as f64
    };
    Progress {
        current,
        target,
        percentage: (ratio * 100.0).min(100.0).round() as u64,
    }
}

pub fn fresh_states() -> Vec<AchievementState> {
    CATALOG
        .iter()
        .map(|def| AchievementState {
            id: def.id.to_string(),
            unlocked: false,
            unlocked_at: None,
        })
        .collect()
}

/// Aligns loaded states with the catalogue: unknown ids are dropped, missing
/// ones start locked.
pub fn merge_with_catalog(loaded: Vec<AchievementState>) -> Vec<AchievementState> {
    CATALOG
        .iter()
        .map(|def| {
            loaded
                .iter()
                .find(|state| state.id == def.id)
                .cloned()
                .unwrap_or_else(|| AchievementState {
                    id: def.id.to_string(),
                    unlocked: false,
                    unlocked_at: None,
                })
        })
        .collect()
}

/// Unlocks every still-locked achievement of `class` whose requirement holds.
/// Returns only the ones unlocked by this call.
pub fn evaluate(
    states: &mut [AchievementState],
    stats: &GameStats,
    class: AchievementClass,
    unlocked_at: &str,
) -> Vec<&'static AchievementDef> {
    let mut newly = Vec::new();
    for state in states.iter_mut() {
        if state.unlocked {
            continue;
        }
        let Some(def) = definition(&state.id) else {
            continue;
        };
        if def.class != class || !def.requirement.is_met(stats) {
            continue;
        }
        state.unlocked = true;
        state.unlocked_at = Some(unlocked_at.to_string());
        newly.push(def);
    }
    newly
}

pub fn completion_percent(states: &[AchievementState]) -> u64 {
    if states.is_empty() {
        return 0;
    }
    let unlocked = states.iter().filter(|state| state.unlocked).count();
    ((unlocked as f64 / states.len() as f64) * 100.0).round() as u64
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub unlocked: usize,
    pub total: usize,
}

pub fn counts_by_class(states: &[AchievementState], class: AchievementClass) -> ClassCounts {
    let mut counts = ClassCounts::default();
    for state in states {
        if definition(&state.id).map(|def| def.class) != Some(class) {
            continue;
        }
        counts.total += 1;
        if state.unlocked {
            counts.unlocked += 1;
        }
    }
    counts
}

/// Most recent first.
pub fn recent_unlocks(states: &[AchievementState], limit: usize) -> Vec<&AchievementState> {
    let mut unlocked: Vec<&AchievementState> =
        states.iter().filter(|state| state.unlocked).collect();
    unlocked.sort_by(|a, b| b.unlocked_at.cmp(&a.unlocked_at));
    unlocked.truncate(limit);
    unlocked
}

/// Locked achievements at or above `threshold` percent, closest first.
pub fn almost_completed(
    states: &[AchievementState],
    stats: &GameStats,
    threshold: u64,
) -> Vec<(&'static AchievementDef, Progress)> {
    let mut close: Vec<(&'static AchievementDef, Progress)> = states
        .iter()
        .filter(|state| !state.unlocked)
        .filter_map(|state| definition(&state.id))
        .map(|def| (def, progress(def, stats)))
        .filter(|(_, p)| p.percentage >= threshold && p.percentage < 100)
        .collect();
    close.sort_by(|a, b| b.1.percentage.cmp(&a.1.percentage));
    close
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: &str = "2024-01-01T00:00:00.000Z";

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<&str> = CATALOG.iter().map(|def| def.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn unlock_is_monotone_and_reported_once() {
        let mut states = fresh_states();
        let mut stats = GameStats::default();
        stats.session.food_eaten = 25;

        let first = evaluate(&mut states, &stats, AchievementClass::Session, AT);
        assert_eq!(first.iter().map(|d| d.id).collect::<Vec<_>>(), vec!["session_food_1"]);

        stats.session.food_eaten = 0;
        let second = evaluate(&mut states, &stats, AchievementClass::Session, "later");
        assert!(second.is_empty());
        let state = states
            .iter()
            .find(|s| s.id == "session_food_1")
            .expect("state exists");
        assert!(state.unlocked);
        assert_eq!(state.unlocked_at.as_deref(), Some(AT));
    }

    #[test]
    fn class_filter_keeps_cumulative_for_later() {
        let mut states = fresh_states();
        let stats = GameStats {
            total_distance: 150,
            ..GameStats::default()
        };
        assert!(evaluate(&mut states, &stats, AchievementClass::Session, AT).is_empty());
        let unlocked = evaluate(&mut states, &stats, AchievementClass::Cumulative, AT);
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, "traveler_1");
    }

    #[test]
    fn win_based_requirements_need_the_win_flag() {
        let mut stats = GameStats::default();
        assert!(!Requirement::WinWithoutDeath.is_met(&stats));
        stats.session.won = true;
        assert!(Requirement::WinWithoutDeath.is_met(&stats));
        assert!(Requirement::WinHoldingLead.is_met(&stats));
        assert!(!Requirement::WinAfterDeath.is_met(&stats));
        stats.session.held_lead = false;
        assert!(!Requirement::WinHoldingLead.is_met(&stats));
    }

    #[test]
    fn blitz_requires_length_inside_the_window() {
        let mut stats = GameStats::default();
        stats.session.max_length = 15;
        stats.session.elapsed_ms = 59_000;
        let blitz = definition("blitz").expect("blitz defined");
        assert!(blitz.requirement.is_met(&stats));
        stats.session.elapsed_ms = 61_000;
        assert!(!blitz.requirement.is_met(&stats));
    }

    #[test]
    fn progress_is_capped_and_rounded() {
        let stats = GameStats {
            total_distance: 250,
            ..GameStats::default()
        };
        let p = progress(definition("traveler_1").expect("defined"), &stats);
        assert_eq!(p.percentage, 100);
        let p = progress(definition("traveler_2").expect("defined"), &stats);
        assert_eq!(p, Progress { current: 250, target: 300, percentage: 83 });
    }

    #[test]
    fn merge_drops_unknown_and_adds_missing() {
        let loaded = vec![
            AchievementState {
                id: "bomb_1".to_string(),
                unlocked: true,
                unlocked_at: Some(AT.to_string()),
            },
            AchievementState {
                id: "retired_badge".to_string(),
                unlocked: true,
                unlocked_at: None,
            },
        ];
        let merged = merge_with_catalog(loaded);
        assert_eq!(merged.len(), CATALOG.len());
        assert!(merged.iter().all(|s| s.id != "retired_badge"));
        assert_eq!(merged.iter().filter(|s| s.unlocked).count(), 1);
        assert_eq!(completion_percent(&merged), 2);
    }

    #[test]
    fn almost_completed_lists_closest_first() {
        let states = fresh_states();
        let stats = GameStats {
            total_distance: 90,
            total_games: 8,
            ..GameStats::default()
        };
        let close = almost_completed(&states, &stats, 80);
        let ids: Vec<&str> = close.iter().map(|(def, _)| def.id).collect();
        assert_eq!(ids, vec!["traveler_1", "veteran_1"]);
    }

    #[test]
    fn class_counts_split_the_catalog() {
        let mut states = fresh_states();
        let stats = GameStats {
            total_distance: 120,
            ..GameStats::default()
        };
        evaluate(&mut states, &stats, AchievementClass::Cumulative, AT);

        let cumulative = counts_by_class(&states, AchievementClass::Cumulative);
        let session = counts_by_class(&states, AchievementClass::Session);
        assert_eq!(cumulative, ClassCounts { unlocked: 1, total: 44 });
        assert_eq!(session, ClassCounts { unlocked: 0, total: 17 });
        assert_eq!(cumulative.total + session.total, CATALOG.len());
    }

    #[test]
    fn recent_unlocks_are_newest_first_and_limited() {
        let mut states = fresh_states();
        for (id, at) in [
            ("traveler_1", "2024-01-01T00:00:00.000Z"),
            ("foodie_1", "2024-03-01T00:00:00.000Z"),
            ("bomb_1", "2024-02-01T00:00:00.000Z"),
        ] {
            let state = states
                .iter_mut()
                .find(|state| state.id == id)
                .expect("state exists");
            state.unlocked = true;
            state.unlocked_at = Some(at.to_string());
        }

        let recent: Vec<&str> = recent_unlocks(&states, 2)
            .into_iter()
            .map(|state| state.id.as_str())
            .collect();
        assert_eq!(recent, vec!["foodie_1", "bomb_1"]);
        assert_eq!(recent_unlocks(&states, 10).len(), 3);
    }
}
