use crate::food::Food;
use crate::snake::Snake;
use crate::types::{DeathCause, Position};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Newly dead agents in index order, one cause each.
    pub deaths: Vec<(usize, DeathCause)>,
}

impl CollisionReport {
    pub fn cause_of(&self, agent: usize) -> Option<DeathCause> {
        self.deaths
            .iter()
            .find(|(idx, _)| *idx == agent)
            .map(|(_, cause)| *cause)
    }

    pub fn is_empty(&self) -> bool {
        self.deaths.is_empty()
    }
}

pub fn in_bounds(pos: Position, grid_size: i32) -> bool {
    pos.in_bounds(grid_size)
}

pub fn occupied_by_living(snakes: &[Snake], pos: Position) -> bool {
    snakes
        .iter()
        .any(|snake| snake.is_alive() && snake.occupies(pos))
}

pub fn food_at(foods: &[Food], pos: Position) -> Option<&Food> {
    foods.iter().find(|food| food.position == pos)
}

/// Classifies every living snake against the current positions without
/// applying anything. Head-to-head pairs go first; everyone else is checked
/// wall, then self, then other bodies, and the first hit wins.
pub fn detect_collisions(snakes: &[Snake], grid_size: i32) -> CollisionReport {
    let mut dead = vec![None; snakes.len()];

    for i in 0..snakes.len() {
        for j in (i + 1)..snakes.len() {
            if snakes[i].is_alive() && snakes[j].is_alive() && snakes[i].head() == snakes[j].head()
            {
                dead[i] = Some(DeathCause::HeadToHead);
                dead[j] = Some(DeathCause::HeadToHead);
            }
        }
    }

    for (idx, snake) in snakes.iter().enumerate() {
        if !snake.is_alive() || dead[idx].is_some() {
            continue;
        }
        let head = snake.head();
        dead[idx] = if !in_bounds(head, grid_size) {
            Some(DeathCause::Wall)
        } else if snake.head_hits_own_body() {
            Some(DeathCause::SelfCollision)
        } else if snakes
            .iter()
            .enumerate()
            .any(|(other, s)| other != idx && s.is_alive() && s.occupies(head))
        {
            Some(DeathCause::OtherBody)
        } else {
            None
        };
    }

    CollisionReport {
        deaths: dead
            .into_iter()
            .enumerate()
            .filter_map(|(idx, cause)| cause.map(|cause| (idx, cause)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, FoodType};

    const GRID: i32 = 32;

    #[test]
    fn head_on_pair_dies_together() {
        let mut a = Snake::new(Position::new(10, 10), Direction::Right, 3);
        let mut b = Snake::new(Position::new(12, 10), Direction::Left, 3);
        a.advance();
        b.advance();
        let report = detect_collisions(&[a, b], GRID);
        assert_eq!(
            report.deaths,
            vec![(0, DeathCause::HeadToHead), (1, DeathCause::HeadToHead)]
        );
    }

    #[test]
    fn wall_is_checked_before_other_causes() {
        let mut a = Snake::new(Position::new(31, 5), Direction::Right, 3);
        a.advance();
        let report = detect_collisions(&[a], GRID);
        assert_eq!(report.cause_of(0), Some(DeathCause::Wall));
    }

    #[test]
    fn head_into_other_body_kills_only_the_mover() {
        let mut a = Snake::new(Position::new(10, 9), Direction::Down, 3);
        let b = Snake::new(Position::new(12, 10), Direction::Right, 4);
        a.advance();
        let report = detect_collisions(&[a, b], GRID);
        assert_eq!(report.deaths, vec![(0, DeathCause::OtherBody)]);
    }

    #[test]
    fn dead_bodies_are_not_obstacles() {
        let mut a = Snake::new(Position::new(10, 9), Direction::Down, 3);
        let mut b = Snake::new(Position::new(12, 10), Direction::Right, 4);
        b.die();
        a.advance();
        assert!(detect_collisions(&[a, b], GRID).is_empty());
    }

    #[test]
    fn swapping_heads_is_body_contact_for_both() {
        let mut a = Snake::new(Position::new(10, 10), Direction::Right, 3);
        let mut b = Snake::new(Position::new(11, 10), Direction::Left, 3);
        a.advance();
        b.advance();
        let report = detect_collisions(&[a, b], GRID);
        assert_eq!(
            report.deaths,
            vec![(0, DeathCause::OtherBody), (1, DeathCause::OtherBody)]
        );
    }

    #[test]
    fn food_lookup_matches_exact_cell() {
        let foods = vec![Food {
            id: 1,
            position: Position::new(3, 4),
            food_type: FoodType::Normal,
        }];
        assert!(food_at(&foods, Position::new(3, 4)).is_some());
        assert!(food_at(&foods, Position::new(4, 3)).is_none());
    }
}
