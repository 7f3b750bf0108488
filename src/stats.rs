use serde::{Deserialize, Serialize};

use crate::types::{DeathCause, FoodType};

/// Counters for the match in progress. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionStats {
    pub distance: u64,
    pub food_eaten: u64,
    pub normal_food_eaten: u64,
    pub speed_food_eaten: u64,
    pub super_food_eaten: u64,
    pub magnet_food_eaten: u64,
    pub mine_hit: u64,
    pub max_length: u64,
    pub deaths: u64,
    pub head_to_head_collisions: u64,
    pub self_collisions: u64,
    pub speed_time: u64,
    pub magnet_collected: u64,
    pub has_resurrected: bool,
    pub held_lead: bool,
    pub elapsed_ms: u64,
    pub won: bool,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            distance: 0,
            food_eaten: 0,
            normal_food_eaten: 0,
            speed_food_eaten: 0,
            super_food_eaten: 0,
            magnet_food_eaten: 0,
            mine_hit: 0,
            max_length: 0,
            deaths: 0,
            head_to_head_collisions: 0,
            self_collisions: 0,
            speed_time: 0,
            magnet_collected: 0,
            has_resurrected: false,
            held_lead: true,
            elapsed_ms: 0,
            won: false,
        }
    }
}

/// Lifetime counters (the persisted part) plus the live session partition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameStats {
    pub total_games: u64,
    pub total_wins: u64,
    pub total_distance: u64,
    pub total_food_eaten: u64,
    pub total_normal_food_eaten: u64,
    pub total_speed_food_eaten: u64,
    pub total_super_food_eaten: u64,
    pub total_magnet_food_eaten: u64,
    pub total_mine_hit: u64,
    pub total_deaths: u64,
    pub total_head_to_head_collisions: u64,
    pub total_self_collisions: u64,
    pub total_speed_time: u64,
    #[serde(skip)]
    pub session: SessionStats,
}

impl GameStats {
    pub fn reset_session(&mut self) {
        self.session = SessionStats::default();
    }

    pub fn record_move(&mut self) {
        self.session.distance += 1;
    }

    /// Mines are tracked through `record_mine_hit` and never count as food.
    pub fn record_food(&mut self, food_type: FoodType) {
        let session = &mut self.session;
        match food_type {
            FoodType::Normal => session.normal_food_eaten += 1,
            FoodType::Speed => session.speed_food_eaten += 1,
            FoodType::Super => session.super_food_eaten += 1,
            FoodType::Magnet => session.magnet_food_eaten += 1,
            FoodType::Mine => return,
        }
        session.food_eaten += 1;
    }

    pub fn record_mine_hit(&mut self) {
        self.session.mine_hit += 1;
    }

    pub fn record_death(&mut self, cause: DeathCause) {
        self.session.deaths += 1;
        self.session.has_resurrected = true;
        match cause {
            DeathCause::HeadToHead => self.session.head_to_head_collisions += 1,
            DeathCause::SelfCollision => self.session.self_collisions += 1,
            _ => {}
        }
    }

    pub fn record_length(&mut self, length: usize) {
        self.session.max_length = self.session.max_length.max(length as u64);
    }

    pub fn record_speed_time(&mut self, seconds: u64) {
        self.session.speed_time += seconds;
    }

    pub fn record_magnet_collected(&mut self, count: u64) {
        self.session.magnet_collected += count;
    }

    pub fn mark_lost_lead(&mut self) {
        self.session.held_lead = false;
    }

    /// Folds the session into the lifetime totals. Session counters stay
    /// readable afterwards for end-of-match reporting.
    pub fn end_game(&mut self, won: bool) {
        self.session.won = won;
        let s = &self.session;
        self.total_games += 1;
        if won {
            self.total_wins += 1;
        }
        self.total_distance += s.distance;
        self.total_food_eaten += s.food_eaten;
        self.total_normal_food_eaten += s.normal_food_eaten;
        self.total_speed_food_eaten += s.speed_food_eaten;
        self.total_super_food_eaten += s.super_food_eaten;
        self.total_magnet_food_eaten += s.magnet_food_eaten;
        self.total_mine_hit += s.mine_hit;
        self.total_deaths += s.deaths;
        self.total_head_to_head_collisions += s.head_to_head_collisions;
        self.total_self_collisions += s.self_collisions;
        self.total_speed_time += s.speed_time;
    }

    pub fn level(&self) -> u64 {
        self.total_games / 10 + 1
    }

    /// Rounded percentage; zero before the first game.
    pub fn win_rate(&self) -> u64 {
        if self.total_games == 0 {
            return 0;
        }
        ((self.total_wins as f64 / self.total_games as f64) * 100.0).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_folds_into_totals() {
        let mut stats = GameStats::default();
        stats.record_move();
        stats.record_move();
        stats.record_food(FoodType::Speed);
        stats.record_food(FoodType::Super);
        stats.record_speed_time(3);
        stats.record_death(DeathCause::HeadToHead);
        stats.end_game(true);

        assert_eq!(stats.total_games, 1);
        assert_eq!(stats.total_wins, 1);
        assert_eq!(stats.total_distance, 2);
        assert_eq!(stats.total_food_eaten, 2);
        assert_eq!(stats.total_speed_food_eaten, 1);
        assert_eq!(stats.total_super_food_eaten, 1);
        assert_eq!(stats.total_head_to_head_collisions, 1);
        assert_eq!(stats.total_speed_time, 3);
        assert!(stats.session.won);

        stats.reset_session();
        assert_eq!(stats.session, SessionStats::default());
        assert_eq!(stats.total_distance, 2);
    }

    #[test]
    fn derived_values() {
        let stats = GameStats {
            total_games: 25,
            total_wins: 9,
            ..GameStats::default()
        };
        assert_eq!(stats.level(), 3);
        assert_eq!(stats.win_rate(), 36);
        assert_eq!(GameStats::default().win_rate(), 0);
    }

    #[test]
    fn serialized_form_holds_only_lifetime_counters() {
        let mut stats = GameStats::default();
        stats.total_mine_hit = 4;
        stats.session.distance = 99;
        let value = serde_json::to_value(&stats).expect("serialize");
        assert_eq!(value["totalMineHit"], 4);
        assert!(value.get("session").is_none());

        let back: GameStats = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back.total_mine_hit, 4);
        assert_eq!(back.session.distance, 0);
    }

    #[test]
    fn deaths_mark_resurrection() {
        let mut stats = GameStats::default();
        assert!(!stats.session.has_resurrected);
        stats.record_death(DeathCause::Wall);
        assert!(stats.session.has_resurrected);
        assert_eq!(stats.session.self_collisions, 0);
    }
}
