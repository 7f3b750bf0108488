use tracing::debug;

use super::*;

impl GameEngine {
    /// Per-tick effect work for living agents, then expiry.
    pub(super) fn update_effects(&mut self, now_ms: u64) {
        for agent in 0..self.snakes.len() {
            if !self.snakes[agent].is_alive() {
                continue;
            }

            let boosted: u64 = self.snakes[agent]
                .effects_mut()
                .iter_mut()
                .map(|effect| effect.take_speed_seconds(now_ms))
                .sum();
            if boosted > 0 {
                if let Some(stats) = self.stats_mut(agent) {
                    stats.record_speed_time(boosted);
                }
            }

            if let Some(range) = self.snakes[agent].magnet_range() {
                let head = self.snakes[agent].head();
                for food_id in self.food.pickup_ids_around(head, range) {
                    self.consume_food(agent, food_id, true, now_ms);
                }
            }

            for effect in self.snakes[agent].take_expired_effects(now_ms) {
                debug!(agent, kind = ?effect.kind(), "effect expired");
                self.events.push(RuntimeEvent::EffectExpired {
                    agent,
                    effect: effect.kind(),
                });
            }
        }
    }
}
