use crate::collision::{in_bounds, occupied_by_living};
use crate::constants::DANGER_FATAL;
use crate::food::Food;
use crate::snake::Snake;
use crate::types::{Direction, Position};

/// Read-only picture of the board from one agent's point of view.
#[derive(Clone, Copy, Debug)]
pub struct ArenaView<'a> {
    pub grid_size: i32,
    pub snakes: &'a [Snake],
    pub foods: &'a [Food],
    pub me: usize,
}

impl<'a> ArenaView<'a> {
    pub fn new(grid_size: i32, snakes: &'a [Snake], foods: &'a [Food], me: usize) -> Self {
        Self {
            grid_size,
            snakes,
            foods,
            me,
        }
    }

    pub fn snake(&self) -> Option<&'a Snake> {
        self.snakes.get(self.me)
    }

    pub fn opponent(&self) -> Option<&'a Snake> {
        self.snakes
            .iter()
            .enumerate()
            .find(|(idx, _)| *idx != self.me)
            .map(|(_, snake)| snake)
    }

    pub fn center(&self) -> Position {
        Position::new(self.grid_size / 2, self.grid_size / 2)
    }

    pub fn is_blocked(&self, pos: Position) -> bool {
        !in_bounds(pos, self.grid_size) || occupied_by_living(self.snakes, pos)
    }

    /// `DANGER_FATAL` for a blocked cell, otherwise a small additive score
    /// from crowded neighbours and nearby walls.
    pub fn danger(&self, pos: Position) -> i32 {
        if self.is_blocked(pos) {
            return DANGER_FATAL;
        }
        let mut danger = 0;
        for cell in pos.neighbors() {
            if !in_bounds(cell, self.grid_size) {
                danger += 2;
            } else if occupied_by_living(self.snakes, cell) {
                danger += 1;
            }
        }
        let edge = self.grid_size - 2;
        if pos.x <= 1 || pos.x >= edge {
            danger += 1;
        }
        if pos.y <= 1 || pos.y >= edge {
            danger += 1;
        }
        danger
    }

    pub fn is_fatal(&self, pos: Position) -> bool {
        self.danger(pos) >= DANGER_FATAL
    }

    /// 0..1, higher near the centre and away from edges.
    pub fn strategic_value(&self, pos: Position) -> f64 {
        let half = (self.grid_size / 2) as f64;
        let center_value = (half - pos.euclidean(self.center())) / half;
        let edge_distance = pos
            .x
            .min(pos.y)
            .min(self.grid_size - 1 - pos.x)
            .min(self.grid_size - 1 - pos.y) as f64;
        let edge_value = edge_distance / half;
        center_value * 0.6 + edge_value * 0.4
    }

    /// Straight-line walk along the longer remaining axis. Cheap and only
    /// roughly right: a blocked step adds a flat penalty instead of detouring.
    pub fn estimate_path_length(&self, from: Position, to: Position) -> i32 {
        if from == to {
            return 0;
        }
        let distance = from.manhattan(to);
        if distance > self.grid_size {
            return distance + 5;
        }
        let mut current = from;
        let mut steps = 0;
        let max_steps = distance + 10;
        while current != to && steps < max_steps {
            let dx = to.x - current.x;
            let dy = to.y - current.y;
            current = if dx.abs() > dy.abs() {
                Position::new(current.x + dx.signum(), current.y)
            } else {
                Position::new(current.x, current.y + dy.signum())
            };
            steps += 1;
            if current != to && self.is_fatal(current) {
                return distance + 3;
            }
        }
        steps
    }

    pub fn nearest_food(&self, from: Position) -> Option<&'a Food> {
        self.foods
            .iter()
            .filter(|food| !food.food_type.is_hazard())
            .min_by_key(|food| from.manhattan(food.position))
    }

    /// Every direction except a reversal, in fixed order.
    pub fn legal_directions(&self, current: Direction) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| !dir.is_opposite(current))
            .collect()
    }

    pub fn safe_directions(&self, head: Position, current: Direction) -> Vec<Direction> {
        self.legal_directions(current)
            .into_iter()
            .filter(|dir| !self.is_fatal(head.step(*dir)))
            .collect()
    }

    /// Best non-fatal step toward `target`.
    pub fn best_direction_toward(
        &self,
        head: Position,
        current: Direction,
        target: Position,
        avoid_danger: bool,
    ) -> Option<Direction> {
        let here = head.manhattan(target);
        let mut best: Option<(Direction, f64)> = None;
        for dir in self.legal_directions(current) {
            let next = head.step(dir);
            let danger = self.danger(next);
            if danger >= DANGER_FATAL {
                continue;
            }
            let mut score = ((here - next.manhattan(target)) * 10) as f64;
            if avoid_danger {
                score -= (danger * 5) as f64;
            }
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((dir, score));
            }
        }
        best.map(|(dir, _)| dir)
    }

    /// Safe cells in the 7x7 window around `around`.
    pub fn openness(&self, around: Position) -> usize {
        let mut open = 0;
        for dx in -3..=3 {
            for dy in -3..=3 {
                if !self.is_fatal(Position::new(around.x + dx, around.y + dy)) {
                    open += 1;
                }
            }
        }
        open
    }
}
