// Heuristic evaluation of a candidate head position
//
// One scalar per position, built from independently testable weighted terms.
// Unsafe positions score negative infinity, which dominates every term.

use serde::Serialize;

use crate::config::{Config, FoodConfig, ScoresConfig};
use crate::pathfinding::path_length;
use crate::safety::is_safe;
use crate::space::SpaceCache;
use crate::state::Snapshot;
use crate::types::{Coord, Direction};

/// How hard the snake should currently chase food. Computed once per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodUrgency {
    None,
    Balanced,
    Urgent,
    Critical,
}

impl FoodUrgency {
    /// Low health, or moderate health while still short, unless a longer
    /// enemy head is close by. The danger check gates every level.
    pub fn assess(state: &Snapshot, config: &FoodConfig) -> FoodUrgency {
        let Some(you) = state.you() else {
            return FoodUrgency::None;
        };

        let threatened = state.enemies().any(|(_, enemy)| {
            enemy.len() > you.len() && enemy.head().manhattan(&you.head()) <= config.danger_radius
        });
        if threatened {
            return FoodUrgency::None;
        }

        if you.health < config.critical_health_threshold {
            FoodUrgency::Critical
        } else if you.health < config.low_health_threshold {
            FoodUrgency::Urgent
        } else if you.health < config.mid_health_threshold && you.len() < config.target_length {
            FoodUrgency::Balanced
        } else {
            FoodUrgency::None
        }
    }

    pub fn seeks_food(&self) -> bool {
        !matches!(self, FoodUrgency::None)
    }

    pub fn multiplier(&self, config: &FoodConfig) -> f64 {
        match self {
            FoodUrgency::None => 0.0,
            FoodUrgency::Balanced => config.balanced_multiplier,
            FoodUrgency::Urgent => config.urgent_multiplier,
            FoodUrgency::Critical => config.critical_multiplier,
        }
    }
}

/// Individual heuristic terms, already weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub escape: f64,
    pub space: f64,
    pub food: f64,
    pub trap: f64,
    pub deception: f64,
    pub aggression: f64,
    pub center: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.escape
            + self.space
            + self.food
            + self.trap
            + self.deception
            + self.aggression
            + self.center
    }
}

/// Per-turn scorer: weights, the shared space memo and this turn's food urgency
pub struct Scorer<'a> {
    scores: &'a ScoresConfig,
    food: &'a FoodConfig,
    max_health: i32,
    cache: &'a SpaceCache,
    urgency: FoodUrgency,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a Config, cache: &'a SpaceCache, urgency: FoodUrgency) -> Self {
        Scorer {
            scores: &config.scores,
            food: &config.food,
            max_health: config.game_rules.max_health,
            cache,
            urgency,
        }
    }

    pub fn urgency(&self) -> FoodUrgency {
        self.urgency
    }

    /// Score of moving our head to `position` from `state`; higher is better
    pub fn score(&self, position: Coord, state: &Snapshot) -> f64 {
        self.breakdown(position, state)
            .map_or(f64::NEG_INFINITY, |terms| terms.total())
    }

    /// Weighted terms, or `None` when the position is unsafe
    pub fn breakdown(&self, position: Coord, state: &Snapshot) -> Option<ScoreBreakdown> {
        if !is_safe(position, state).is_safe() {
            return None;
        }
        let you = state.you()?;

        let after = match Direction::between(&you.head(), &position) {
            Some(dir) => state.advance(state.you_index(), dir, self.max_health),
            None => state.clone(),
        };

        Some(ScoreBreakdown {
            escape: self.scores.weight_escape_route * escape_routes(position, &after) as f64,
            space: self.space_term(position, state),
            food: self.food_term(position, state),
            trap: self.trap_term(state, &after),
            deception: self.deception_term(position, state, &after),
            aggression: self.aggression_term(position, state),
            center: self.center_term(position, state),
        })
    }

    fn space_term(&self, position: Coord, state: &Snapshot) -> f64 {
        let length = state.you().map_or(0, |you| you.len()) as f64;
        let cells = self.cache.reachable_area(position, state).cells as f64;

        let mut value = self.scores.weight_space * cells;
        if cells >= length * self.scores.space_comfort_multiplier {
            value += self.scores.space_comfort_bonus;
        }
        if cells < length {
            value -= self.scores.space_shortage_penalty;
        }
        value
    }

    fn food_term(&self, position: Coord, state: &Snapshot) -> f64 {
        if !self.urgency.seeks_food() {
            return 0.0;
        }
        match nearest_food_distance(position, state, self.food.max_food_candidates) {
            Some(distance) => {
                self.scores.weight_food * self.urgency.multiplier(self.food) / (1.0 + distance as f64)
            }
            None => 0.0,
        }
    }

    fn trap_term(&self, state: &Snapshot, after: &Snapshot) -> f64 {
        let cornered = state
            .enemies()
            .filter(|(idx, _)| {
                let before = open_moves(state, *idx);
                let remaining = open_moves(after, *idx);
                remaining <= self.scores.trap_max_escape_moves && remaining < before
            })
            .count();
        self.scores.trap_bonus * cornered as f64
    }

    fn deception_term(&self, position: Coord, state: &Snapshot, after: &Snapshot) -> f64 {
        let Some(you) = state.you() else {
            return 0.0;
        };
        let mut value = 0.0;

        // Hugging our own body looks like a blunder to a naive opponent
        let own_neighbors = position
            .neighbors()
            .iter()
            .filter(|n| **n != you.head() && you.body.contains(n))
            .count();
        if own_neighbors >= self.scores.deception_min_own_neighbors
            && !self.cache.reachable_area(position, state).dead_end
        {
            value += self.scores.deception_bonus;
        }

        // Offer a shorter enemy a contested cell it would lose
        let grid = after.blocked_grid(None);
        for (_, enemy) in state.enemies().filter(|(_, e)| e.len() < you.len()) {
            let baits = position
                .neighbors()
                .iter()
                .any(|n| !grid.is_blocked(n) && enemy.head().is_adjacent(n));
            if baits {
                value += self.scores.bait_bonus;
            }
        }

        value
    }

    fn aggression_term(&self, position: Coord, state: &Snapshot) -> f64 {
        let Some(you) = state.you() else {
            return 0.0;
        };
        let mut value = 0.0;

        for (_, enemy) in state.enemies() {
            let before = you.head().manhattan(&enemy.head());
            let after = position.manhattan(&enemy.head());
            if after >= before {
                continue;
            }
            if enemy.len() < you.len() && you.health >= self.scores.min_aggression_health {
                value += self.scores.aggression_bonus;
            } else if enemy.len() > you.len() {
                value -= self.scores.aggression_penalty;
            }
        }

        value
    }

    fn center_term(&self, position: Coord, state: &Snapshot) -> f64 {
        self.scores.weight_center / (1.0 + position.manhattan(&state.center()) as f64)
    }
}

/// Orthogonal neighbours of `position` that are safe for us in `after`,
/// the state where our head already sits on `position`
pub fn escape_routes(position: Coord, after: &Snapshot) -> usize {
    position
        .neighbors()
        .iter()
        .filter(|n| is_safe(**n, after).is_safe())
        .count()
}

/// Moves available to snake `idx` that stay on the board and off every body
pub fn open_moves(state: &Snapshot, idx: usize) -> usize {
    let Some(snake) = state.snakes.get(idx).filter(|s| s.is_alive()) else {
        return 0;
    };
    let grid = state.blocked_grid(Some(idx));
    snake
        .head()
        .neighbors()
        .iter()
        .filter(|n| !grid.is_blocked(n))
        .count()
}

/// Verified path length to the closest reachable food among the `candidates`
/// nearest by Manhattan distance
pub fn nearest_food_distance(position: Coord, state: &Snapshot, candidates: usize) -> Option<usize> {
    let mut foods: Vec<Coord> = state.food.clone();
    foods.sort_by_key(|f| (position.manhattan(f), *f));

    let mut best: Option<usize> = None;
    for food in foods.into_iter().take(candidates) {
        if best.map_or(false, |b| position.manhattan(&food) as usize >= b) {
            break;
        }
        if let Some(length) = path_length(position, food, state) {
            best = Some(best.map_or(length, |b| b.min(length)));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;

    fn scorer_parts() -> (Config, SpaceCache) {
        let config = Config::default_hardcoded();
        let cache = SpaceCache::new(&config.cache);
        (config, cache)
    }

    #[test]
    fn test_unsafe_position_is_negative_infinity() {
        let (config, cache) = scorer_parts();
        let state = snapshot(11, 11, &[], vec![snake("me", 90, &[(0, 5), (1, 5), (2, 5)])]);
        let scorer = Scorer::new(&config, &cache, FoodUrgency::None);

        assert_eq!(scorer.score(Coord::new(-1, 5), &state), f64::NEG_INFINITY);
        assert_eq!(scorer.score(Coord::new(1, 5), &state), f64::NEG_INFINITY);
        assert!(scorer.score(Coord::new(0, 6), &state).is_finite());
    }

    #[test]
    fn test_urgency_levels() {
        let config = Config::default_hardcoded();
        let body = [(5, 5), (5, 4), (5, 3)];

        let urgency = |health| {
            let state = snapshot(11, 11, &[], vec![snake("me", health, &body)]);
            FoodUrgency::assess(&state, &config.food)
        };
        assert_eq!(urgency(10), FoodUrgency::Critical);
        assert_eq!(urgency(25), FoodUrgency::Urgent);
        assert_eq!(urgency(50), FoodUrgency::Balanced);
        assert_eq!(urgency(90), FoodUrgency::None);
    }

    #[test]
    fn test_nearby_longer_enemy_suppresses_food_seeking() {
        let config = Config::default_hardcoded();
        let state = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 25, &[(5, 5), (5, 4), (5, 3)]),
                snake("big", 90, &[(6, 6), (7, 6), (8, 6), (9, 6)]),
            ],
        );
        assert_eq!(FoodUrgency::assess(&state, &config.food), FoodUrgency::None);
    }

    #[test]
    fn test_nearby_longer_enemy_suppresses_food_even_at_critical_health() {
        let (config, cache) = scorer_parts();
        let state = snapshot(
            11,
            11,
            &[(5, 8)],
            vec![
                snake("me", 10, &[(5, 5), (5, 4), (5, 3)]),
                snake("big", 90, &[(6, 6), (7, 6), (8, 6), (9, 6)]),
            ],
        );
        let urgency = FoodUrgency::assess(&state, &config.food);
        assert_eq!(urgency, FoodUrgency::None);

        let scorer = Scorer::new(&config, &cache, urgency);
        assert_eq!(scorer.breakdown(Coord::new(4, 5), &state).unwrap().food, 0.0);
    }

    #[test]
    fn test_food_term_prefers_closer_food_and_ignores_unreachable() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::Urgent);
        let state = snapshot(11, 11, &[(5, 8)], vec![snake("me", 25, &[(5, 5), (5, 4), (5, 3)])]);

        let toward = scorer.breakdown(Coord::new(5, 6), &state).unwrap();
        let away = scorer.breakdown(Coord::new(4, 5), &state).unwrap();
        assert!(toward.food > away.food);

        // Food sealed off by a wall contributes nothing
        let wall: Vec<(i32, i32)> = (0..11).rev().map(|x| (x, 7)).collect();
        let sealed = snapshot(
            11,
            11,
            &[(5, 9)],
            vec![snake("me", 25, &[(5, 5), (5, 4), (5, 3)]), snake("wall", 90, &wall)],
        );
        assert_eq!(scorer.breakdown(Coord::new(5, 6), &sealed).unwrap().food, 0.0);
    }

    #[test]
    fn test_escape_routes_count() {
        let state = snapshot(11, 11, &[], vec![snake("me", 90, &[(0, 1), (1, 1), (2, 1)])]);
        // Stepping into the corner leaves only the wall-hugging exit
        let after = state.advance(0, Direction::Down, 100);
        assert_eq!(escape_routes(Coord::new(0, 0), &after), 1);
    }

    #[test]
    fn test_aggression_rewards_chasing_shorter_and_punishes_longer() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::None);

        let vs_short = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3), (5, 2)]),
                snake("small", 90, &[(8, 5), (9, 5)]),
            ],
        );
        assert!(scorer.breakdown(Coord::new(6, 5), &vs_short).unwrap().aggression > 0.0);

        let vs_long = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4)]),
                snake("large", 90, &[(8, 5), (9, 5), (10, 5), (10, 4)]),
            ],
        );
        assert!(scorer.breakdown(Coord::new(6, 5), &vs_long).unwrap().aggression < 0.0);
    }

    #[test]
    fn test_trap_bonus_when_enemy_cornered() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::None);
        // Prey sits in the top-left corner with its neck to the right; its only exit is (0,9)
        let state = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(0, 8), (1, 8), (2, 8), (3, 8)]),
                snake("prey", 90, &[(0, 10), (1, 10), (2, 10)]),
            ],
        );
        assert_eq!(open_moves(&state, 1), 1);

        let sealing = scorer.breakdown(Coord::new(0, 9), &state).unwrap();
        assert_eq!(sealing.trap, config.scores.trap_bonus);

        let leaving = scorer.breakdown(Coord::new(0, 7), &state).unwrap();
        assert_eq!(leaving.trap, 0.0);
    }

    #[test]
    fn test_deception_bonus_for_hugging_own_body() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::None);
        // Body curls left and up, so (4,5) touches two of our own segments
        let state = snapshot(
            11,
            11,
            &[],
            vec![snake("me", 90, &[(5, 5), (5, 4), (4, 4), (3, 4), (3, 5), (3, 6)])],
        );

        let hugging = scorer.breakdown(Coord::new(4, 5), &state).unwrap();
        assert_eq!(hugging.deception, config.scores.deception_bonus);

        let open = scorer.breakdown(Coord::new(6, 5), &state).unwrap();
        assert_eq!(open.deception, 0.0);
    }

    #[test]
    fn test_bait_bonus_next_to_shorter_enemy() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::None);
        let state = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3), (5, 2)]),
                snake("small", 90, &[(8, 5), (9, 5)]),
            ],
        );

        // From (6,5) the free cell (7,5) is one step from the shorter head
        let baiting = scorer.breakdown(Coord::new(6, 5), &state).unwrap();
        assert_eq!(baiting.deception, config.scores.bait_bonus);

        let away = scorer.breakdown(Coord::new(4, 5), &state).unwrap();
        assert_eq!(away.deception, 0.0);
    }

    #[test]
    fn test_center_term_peaks_in_the_middle() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::None);
        let state = snapshot(11, 11, &[], vec![snake("me", 90, &[(5, 4), (5, 3), (5, 2)])]);

        let middle = scorer.breakdown(Coord::new(5, 5), &state).unwrap();
        let side = scorer.breakdown(Coord::new(4, 4), &state).unwrap();
        assert_eq!(middle.center, config.scores.weight_center);
        assert!(middle.center > side.center);
    }

    #[test]
    fn test_breakdown_total_matches_score() {
        let (config, cache) = scorer_parts();
        let scorer = Scorer::new(&config, &cache, FoodUrgency::Balanced);
        let state = snapshot(11, 11, &[(8, 8)], vec![snake("me", 50, &[(5, 5), (5, 4), (5, 3)])]);
        let pos = Coord::new(5, 6);
        assert_eq!(scorer.breakdown(pos, &state).unwrap().total(), scorer.score(pos, &state));
    }
}
