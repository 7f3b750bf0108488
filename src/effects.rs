use crate::snake::Snake;
use crate::types::EffectKind;

#[derive(Clone, Debug, PartialEq)]
pub enum EffectPayload {
    Speed {
        multiplier: f64,
        seconds_recorded: u64,
    },
    Magnet {
        range: i32,
    },
}

/// A timed modifier held by a snake. Expiry is absolute on the match clock.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusEffect {
    pub payload: EffectPayload,
    pub started_at_ms: u64,
    pub expires_at_ms: u64,
}

impl StatusEffect {
    pub fn speed(now_ms: u64, duration_ms: u64, multiplier: f64) -> Self {
        Self {
            payload: EffectPayload::Speed {
                multiplier,
                seconds_recorded: 0,
            },
            started_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(duration_ms),
        }
    }

    pub fn magnet(now_ms: u64, duration_ms: u64, range: i32) -> Self {
        Self {
            payload: EffectPayload::Magnet { range },
            started_at_ms: now_ms,
            expires_at_ms: now_ms.saturating_add(duration_ms),
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self.payload {
            EffectPayload::Speed { .. } => EffectKind::Speed,
            EffectPayload::Magnet { .. } => EffectKind::Magnet,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at_ms.saturating_sub(now_ms)
    }

    pub fn magnet_range(&self) -> Option<i32> {
        match self.payload {
            EffectPayload::Magnet { range } => Some(range),
            EffectPayload::Speed { .. } => None,
        }
    }

    /// Whole seconds of boosted movement completed since the last call.
    /// Always zero for non-speed effects.
    pub fn take_speed_seconds(&mut self, now_ms: u64) -> u64 {
        let duration = self.expires_at_ms.saturating_sub(self.started_at_ms);
        let elapsed = now_ms.saturating_sub(self.started_at_ms).min(duration);
        match &mut self.payload {
            EffectPayload::Speed {
                seconds_recorded, ..
            } => {
                let whole = elapsed / 1_000;
                let fresh = whole.saturating_sub(*seconds_recorded);
                *seconds_recorded = whole.max(*seconds_recorded);
                fresh
            }
            EffectPayload::Magnet { .. } => 0,
        }
    }

    pub(crate) fn apply(&self, snake: &mut Snake) {
        if let EffectPayload::Speed { multiplier, .. } = self.payload {
            snake.set_speed_multiplier(multiplier);
        }
    }

    pub(crate) fn revoke(&self, snake: &mut Snake) {
        if let EffectPayload::Speed { .. } = self.payload {
            snake.set_speed_multiplier(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let effect = StatusEffect::speed(1_000, 5_000, 2.0);
        assert!(!effect.is_expired(5_999));
        assert!(effect.is_expired(6_000));
        assert_eq!(effect.remaining_ms(4_500), 1_500);
    }

    #[test]
    fn speed_seconds_are_counted_once_each() {
        let mut effect = StatusEffect::speed(0, 5_000, 2.0);
        assert_eq!(effect.take_speed_seconds(400), 0);
        assert_eq!(effect.take_speed_seconds(1_000), 1);
        assert_eq!(effect.take_speed_seconds(1_500), 0);
        assert_eq!(effect.take_speed_seconds(3_200), 2);
        assert_eq!(effect.take_speed_seconds(9_000), 2);
        assert_eq!(effect.take_speed_seconds(9_500), 0);
    }

    #[test]
    fn magnet_never_reports_speed_time() {
        let mut effect = StatusEffect::magnet(0, 20_000, 1);
        assert_eq!(effect.take_speed_seconds(10_000), 0);
        assert_eq!(effect.magnet_range(), Some(1));
        assert_eq!(effect.kind(), EffectKind::Magnet);
    }
}
