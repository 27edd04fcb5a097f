// Move selection: the engine's entry point
//
// Evaluating -> Committed when at least one candidate survives the safety
// filter, Evaluating -> Emergency otherwise (or when the search trips over a
// broken invariant). Both end states are terminal for the turn.

use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::safety::{is_minimally_safe, is_safe, Verdict};
use crate::scoring::{FoodUrgency, Scorer};
use crate::search::{Lookahead, SearchError};
use crate::space::SpaceCache;
use crate::state::Snapshot;
use crate::types::{Coord, Direction};

/// Where the selector is in its per-turn state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Evaluating,
    Committed,
    Emergency,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Evaluating => "evaluating",
            Phase::Committed => "committed",
            Phase::Emergency => "emergency",
        }
    }
}

/// One of the four moves considered this turn
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub direction: Direction,
    pub position: Coord,
    pub score: f64,
    pub verdict: Verdict,
}

/// The engine's answer for one turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub direction: Direction,
    pub phase: Phase,
    pub score: f64,
    pub depth: u8,
    pub candidates: Vec<Candidate>,
    pub shout: Option<String>,
}

impl Decision {
    pub fn rejected(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| !c.verdict.is_safe())
    }
}

/// Receives the best move after every completed search depth
pub trait Progress: Sync {
    fn publish(&self, direction: Direction, score: f64, depth: u8);
}

impl Progress for () {
    fn publish(&self, _direction: Direction, _score: f64, _depth: u8) {}
}

enum Outcome {
    Committed(Decision),
    Exhausted(Vec<Candidate>),
}

/// Stateless between turns apart from the shared space memo
pub struct Engine {
    config: Config,
    cache: Arc<SpaceCache>,
}

impl Engine {
    pub fn new(config: Config, cache: Arc<SpaceCache>) -> Self {
        Engine { config, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<SpaceCache> {
        &self.cache
    }

    /// Best move within the configured time budget, starting now
    pub fn best_move(&self, snapshot: &Snapshot) -> Decision {
        let budget = Duration::from_millis(self.config.timing.effective_budget_ms());
        self.decide(snapshot, Instant::now() + budget, &())
    }

    /// Runs the state machine to a terminal phase. Never fails: anything that
    /// goes wrong inside evaluation degrades to the emergency rule.
    pub fn decide(&self, snapshot: &Snapshot, deadline: Instant, progress: &dyn Progress) -> Decision {
        self.cache.begin_turn(&snapshot.game_id, snapshot.turn);

        match self.evaluate(snapshot, deadline, progress) {
            Ok(Outcome::Committed(decision)) => decision,
            Ok(Outcome::Exhausted(candidates)) => {
                info!("Turn {}: no safe candidates, falling back to emergency move", snapshot.turn);
                self.emergency(snapshot, candidates)
            }
            Err(e) => {
                warn!("Turn {}: evaluation failed ({}), falling back to emergency move", snapshot.turn, e);
                self.emergency(snapshot, Vec::new())
            }
        }
    }

    fn evaluate(
        &self,
        snapshot: &Snapshot,
        deadline: Instant,
        progress: &dyn Progress,
    ) -> Result<Outcome, SearchError> {
        let you = snapshot.you().ok_or(SearchError::SelfMissing)?;
        let head = you.head();

        let mut candidates: Vec<Candidate> = Direction::all()
            .iter()
            .map(|&direction| {
                let position = direction.apply(&head);
                Candidate {
                    direction,
                    position,
                    score: f64::NEG_INFINITY,
                    verdict: is_safe(position, snapshot),
                }
            })
            .collect();

        for rejected in candidates.iter().filter(|c| !c.verdict.is_safe()) {
            debug!(
                "Turn {}: rejected {} ({})",
                snapshot.turn,
                rejected.direction.as_str(),
                rejected.verdict.reason()
            );
        }

        let safe: Vec<Direction> = candidates
            .iter()
            .filter(|c| c.verdict.is_safe())
            .map(|c| c.direction)
            .collect();
        if safe.is_empty() {
            return Ok(Outcome::Exhausted(candidates));
        }

        let urgency = FoodUrgency::assess(snapshot, &self.config.food);
        let scorer = Scorer::new(&self.config, &self.cache, urgency);

        // Depth 1 is pure heuristic and always runs to completion
        let unbounded = Lookahead::new(snapshot, &self.config, &scorer, None);
        let mut values = unbounded.evaluate_root(snapshot, &safe, 1)?;
        let mut depth = 1;
        let (first, first_score) = pick(&safe, &values);
        progress.publish(first, first_score, depth);

        if safe.len() > 1 {
            let bounded = Lookahead::new(snapshot, &self.config, &scorer, Some(deadline));
            let start_depth = self.config.timing.initial_depth.max(2);
            let min_remaining = Duration::from_millis(self.config.timing.min_time_remaining_ms);

            for next_depth in start_depth..=self.config.timing.max_search_depth {
                if deadline.saturating_duration_since(Instant::now()) < min_remaining {
                    debug!("Turn {}: stopping before depth {}, out of time", snapshot.turn, next_depth);
                    break;
                }
                match bounded.evaluate_root(snapshot, &safe, next_depth) {
                    Ok(found) => {
                        values = found;
                        depth = next_depth;
                        let (best, best_score) = pick(&safe, &values);
                        progress.publish(best, best_score, depth);
                    }
                    Err(SearchError::Timeout) => {
                        debug!("Turn {}: depth {} abandoned at deadline", snapshot.turn, next_depth);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        for (direction, value) in safe.iter().zip(&values) {
            if let Some(candidate) = candidates.iter_mut().find(|c| c.direction == *direction) {
                candidate.score = *value;
            }
        }

        let (direction, score) = pick(&safe, &values);
        Ok(Outcome::Committed(Decision {
            direction,
            phase: Phase::Committed,
            score,
            depth,
            candidates,
            shout: Some(rationale(direction, urgency, depth)),
        }))
    }

    fn emergency(&self, snapshot: &Snapshot, candidates: Vec<Candidate>) -> Decision {
        let direction = emergency_move(snapshot, self.config.emergency.default_move());
        Decision {
            direction,
            phase: Phase::Emergency,
            score: f64::NEG_INFINITY,
            depth: 0,
            candidates,
            shout: Some("cornered".to_string()),
        }
    }
}

/// Arg-max over `values`; ties go to the earlier move, so up > down > left > right
fn pick(moves: &[Direction], values: &[f64]) -> (Direction, f64) {
    let mut best = (moves[0], values[0]);
    for (&dir, &value) in moves.iter().zip(values).skip(1) {
        if value > best.1 {
            best = (dir, value);
        }
    }
    best
}

fn rationale(direction: Direction, urgency: FoodUrgency, depth: u8) -> String {
    match urgency {
        FoodUrgency::Critical | FoodUrgency::Urgent => format!("{} for food", direction.as_str()),
        _ => format!("{} (looked {} ahead)", direction.as_str(), depth),
    }
}

/// Answer to hold before any search depth completes: the first fully safe
/// direction, or the emergency rule when there is none
pub fn fallback_move(snapshot: &Snapshot, default: Direction) -> Direction {
    let Some(you) = snapshot.you() else {
        return default;
    };
    let head = you.head();

    Direction::all()
        .into_iter()
        .find(|dir| is_safe(dir.apply(&head), snapshot).is_safe())
        .unwrap_or_else(|| emergency_move(snapshot, default))
}

/// Minimal-safety fallback: first direction clear of walls and enemy bodies,
/// else the first in bounds, else `default`
pub fn emergency_move(snapshot: &Snapshot, default: Direction) -> Direction {
    let Some(you) = snapshot.you() else {
        return default;
    };
    let head = you.head();

    Direction::all()
        .into_iter()
        .find(|dir| is_minimally_safe(dir.apply(&head), snapshot))
        .or_else(|| {
            Direction::all()
                .into_iter()
                .find(|dir| snapshot.in_bounds(&dir.apply(&head)))
        })
        .unwrap_or(default)
}
