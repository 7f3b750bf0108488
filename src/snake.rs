use std::collections::{HashMap, VecDeque};

use crate::effects::StatusEffect;
use crate::types::{Direction, EffectKind, Position};

/// One agent on the grid. The ordered body and the occupancy index only change
/// through `push_head` and `pop_tail`, which keeps them in lockstep.
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Position>,
    // counted so a head overlapping its own segment is still tracked exactly
    occupied: HashMap<Position, u32>,
    direction: Direction,
    next_direction: Direction,
    alive: bool,
    food_eaten: u32,
    pending_growth: u32,
    speed_multiplier: f64,
    effects: Vec<StatusEffect>,
    last_death_at: Option<Position>,
    pub(crate) move_accumulator_ms: f64,
}

impl Snake {
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let mut snake = Self {
            body: VecDeque::with_capacity(length),
            occupied: HashMap::new(),
            direction,
            next_direction: direction,
            alive: true,
            food_eaten: 0,
            pending_growth: 0,
            speed_multiplier: 1.0,
            effects: Vec::new(),
            last_death_at: None,
            move_accumulator_ms: 0.0,
        };
        snake.rebuild_body(head, direction, length);
        snake
    }

    pub fn head(&self) -> Position {
        self.body.front().copied().unwrap_or(Position::new(-1, -1))
    }

    pub fn body(&self) -> impl Iterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn next_direction(&self) -> Direction {
        self.next_direction
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn food_eaten(&self) -> u32 {
        self.food_eaten
    }

    pub fn pending_growth(&self) -> u32 {
        self.pending_growth
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn effects(&self) -> &[StatusEffect] {
        &self.effects
    }

    pub fn last_death_at(&self) -> Option<Position> {
        self.last_death_at
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.occupied.contains_key(&pos)
    }

    /// True when the head shares its cell with another segment of this body.
    pub fn head_hits_own_body(&self) -> bool {
        self.occupied.get(&self.head()).copied().unwrap_or(0) > 1
    }

    pub fn move_interval_ms(&self, base_interval_ms: f64) -> f64 {
        base_interval_ms / self.speed_multiplier
    }

    pub fn drop_count(&self, drop_rate: usize) -> usize {
        self.body.len() / drop_rate.max(1)
    }

    /// Buffers a turn for the next move. A turn back onto the current heading
    /// is refused.
    pub fn change_direction(&mut self, dir: Direction) -> bool {
        if dir.is_opposite(self.direction) {
            return false;
        }
        self.next_direction = dir;
        true
    }

    /// Commits the buffered direction and moves one cell; returns the new head.
    pub fn advance(&mut self) -> Position {
        self.direction = self.next_direction;
        let head = self.head().step(self.direction);
        self.push_head(head);
        if self.pending_growth > 0 {
            self.pending_growth -= 1;
        } else {
            self.pop_tail();
        }
        head
    }

    pub fn grow(&mut self, segments: u32) {
        self.pending_growth = self.pending_growth.saturating_add(segments);
    }

    pub fn add_food_eaten(&mut self, amount: u32) {
        self.food_eaten = self.food_eaten.saturating_add(amount);
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|effect| effect.kind() == kind)
    }

    pub fn magnet_range(&self) -> Option<i32> {
        self.effects.iter().find_map(StatusEffect::magnet_range)
    }

    /// Same-kind effects replace each other: the old one is revoked first.
    pub fn add_effect(&mut self, effect: StatusEffect) {
        if let Some(idx) = self.effects.iter().position(|e| e.kind() == effect.kind()) {
            let old = self.effects.remove(idx);
            old.revoke(self);
        }
        effect.apply(self);
        self.effects.push(effect);
    }

    pub(crate) fn effects_mut(&mut self) -> &mut [StatusEffect] {
        &mut self.effects
    }

    pub fn take_expired_effects(&mut self, now_ms: u64) -> Vec<StatusEffect> {
        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.effects)
            .into_iter()
            .partition(|effect| effect.is_expired(now_ms));
        self.effects = active;
        for effect in &expired {
            effect.revoke(self);
        }
        expired
    }

    pub fn clear_effects(&mut self) {
        let effects = std::mem::take(&mut self.effects);
        for effect in &effects {
            effect.revoke(self);
        }
    }

    pub fn die(&mut self) {
        self.alive = false;
        self.last_death_at = Some(self.head());
        self.clear_effects();
        self.move_accumulator_ms = 0.0;
    }

    /// Rebuilds the body at a new spot; lifetime food eaten survives.
    pub fn respawn(&mut self, head: Position, direction: Direction, length: usize) {
        self.clear_effects();
        self.rebuild_body(head, direction, length);
        self.direction = direction;
        self.next_direction = direction;
        self.alive = true;
        self.pending_growth = 0;
        self.speed_multiplier = 1.0;
        self.move_accumulator_ms = 0.0;
        self.last_death_at = None;
    }

    pub fn reset_for_session(&mut self, head: Position, direction: Direction, length: usize) {
        self.respawn(head, direction, length);
        self.food_eaten = 0;
    }

    pub(crate) fn set_speed_multiplier(&mut self, multiplier: f64) {
        self.speed_multiplier = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
    }

    /// Occupancy mirrors the body exactly.
    pub fn check_invariants(&self) -> bool {
        let counted: u32 = self.occupied.values().sum();
        if counted as usize != self.body.len() {
            return false;
        }
        let mut expected: HashMap<Position, u32> = HashMap::new();
        for pos in &self.body {
            *expected.entry(*pos).or_insert(0) += 1;
        }
        expected == self.occupied
    }

    fn rebuild_body(&mut self, head: Position, direction: Direction, length: usize) {
        self.body.clear();
        self.occupied.clear();
        let back = direction.opposite();
        for i in (0..length.max(1)).rev() {
            self.push_head(head.offset(back, i as i32));
        }
    }

    fn push_head(&mut self, pos: Position) {
        self.body.push_front(pos);
        *self.occupied.entry(pos).or_insert(0) += 1;
    }

    fn pop_tail(&mut self) {
        let Some(tail) = self.body.pop_back() else {
            return;
        };
        if let Some(count) = self.occupied.get_mut(&tail) {
            *count -= 1;
            if *count == 0 {
                self.occupied.remove(&tail);
            }
        }
    }
}
