// Depth-bounded alpha-beta lookahead
//
// Max plies move our snake, min plies move the single most threatening enemy.
// Depth counts our own moves: at depth 1 a move is worth its heuristic score,
// deeper moves are worth the opponent's best reply to them. Each root move is
// searched independently (in parallel) so results never depend on thread timing.

use log::debug;
use rayon::prelude::*;
use std::time::Instant;
use thiserror::Error;

use crate::config::Config;
use crate::safety::is_safe;
use crate::scoring::Scorer;
use crate::state::Snapshot;
use crate::types::{Coord, Direction};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("search deadline reached")]
    Timeout,
    #[error("simulated state lost the controlled snake")]
    SelfMissing,
}

/// Everything one turn's search needs; shared read-only across rayon workers
pub struct Lookahead<'a> {
    config: &'a Config,
    scorer: &'a Scorer<'a>,
    opponent: Option<usize>,
    root_kills: usize,
    root_length: usize,
    deadline: Option<Instant>,
}

impl<'a> Lookahead<'a> {
    pub fn new(root: &Snapshot, config: &'a Config, scorer: &'a Scorer<'a>, deadline: Option<Instant>) -> Self {
        Lookahead {
            config,
            scorer,
            opponent: most_threatening_opponent(root, config.search.threat_radius),
            root_kills: root.eliminated_enemies(),
            root_length: root.you().map_or(0, |you| you.len()),
            deadline,
        }
    }

    pub fn opponent(&self) -> Option<usize> {
        self.opponent
    }

    /// Values of each root move at `depth`, in the order given.
    /// Fails as a whole if any subtree runs out of time.
    pub fn evaluate_root(
        &self,
        root: &Snapshot,
        moves: &[Direction],
        depth: u8,
    ) -> Result<Vec<f64>, SearchError> {
        let results: Vec<Result<f64, SearchError>> = moves
            .par_iter()
            .map(|&dir| {
                self.move_value(root, dir, depth, f64::NEG_INFINITY, f64::INFINITY, 0)
            })
            .collect();
        results.into_iter().collect()
    }

    fn check_deadline(&self) -> Result<(), SearchError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SearchError::Timeout),
            _ => Ok(()),
        }
    }

    fn loss(&self, ply: u8) -> f64 {
        self.config.search.loss_score + self.config.search.loss_delay_bonus * ply as f64
    }

    /// Value of our snake playing `dir` from `state` with `depth` own moves left
    fn move_value(
        &self,
        state: &Snapshot,
        dir: Direction,
        depth: u8,
        alpha: f64,
        beta: f64,
        ply: u8,
    ) -> Result<f64, SearchError> {
        let you = state.you().ok_or(SearchError::SelfMissing)?;
        let position = dir.apply(&you.head());

        if !is_safe(position, state).is_safe() {
            return Ok(f64::NEG_INFINITY);
        }
        if depth <= 1 {
            return Ok(self.leaf(position, state));
        }

        let next = state.advance(state.you_index(), dir, self.config.game_rules.max_health);
        self.min_node(&next, depth - 1, alpha, beta, ply + 1)
    }

    fn max_node(
        &self,
        state: &Snapshot,
        depth: u8,
        mut alpha: f64,
        beta: f64,
        ply: u8,
    ) -> Result<f64, SearchError> {
        self.check_deadline()?;
        let you = state.you().ok_or(SearchError::SelfMissing)?;
        if !you.is_alive() {
            return Ok(self.loss(ply));
        }

        let mut best = f64::NEG_INFINITY;
        for dir in Direction::all() {
            let value = self.move_value(state, dir, depth, alpha, beta, ply)?;
            best = best.max(value);
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }

        // Every move is fatal: we die on the next step
        if best == f64::NEG_INFINITY {
            return Ok(self.loss(ply + 1));
        }
        Ok(best)
    }

    fn min_node(
        &self,
        state: &Snapshot,
        depth: u8,
        alpha: f64,
        mut beta: f64,
        ply: u8,
    ) -> Result<f64, SearchError> {
        let you = state.you().ok_or(SearchError::SelfMissing)?;
        if !you.is_alive() {
            return Ok(self.loss(ply));
        }

        let Some(opp) = self
            .opponent
            .filter(|&idx| state.snakes.get(idx).map_or(false, |s| s.is_alive()))
        else {
            return self.max_node(state, depth, alpha, beta, ply);
        };

        let replies = opponent_moves(state, opp);
        if replies.is_empty() {
            return self.max_node(&state.eliminate(opp), depth, alpha, beta, ply);
        }

        let mut best = f64::INFINITY;
        for dir in replies {
            let next = state.advance(opp, dir, self.config.game_rules.max_health);
            let value = self.max_node(&next, depth, alpha, beta, ply)?;
            best = best.min(value);
            beta = beta.min(best);
            if alpha >= beta {
                break;
            }
        }
        Ok(best)
    }

    fn leaf(&self, position: Coord, state: &Snapshot) -> f64 {
        let mut value = self.scorer.score(position, state);

        let kills = state.eliminated_enemies().saturating_sub(self.root_kills);
        value += self.config.search.kill_bonus * kills as f64;

        if self.scorer.urgency().seeks_food() {
            let grown = state
                .you()
                .map_or(0, |you| you.len())
                .saturating_sub(self.root_length);
            value += self.config.search.growth_bonus * grown as f64;
        }

        value
    }
}

/// The live enemy whose head is nearest ours within `radius`.
/// Ties prefer the longer snake, then the lower index.
pub fn most_threatening_opponent(state: &Snapshot, radius: i32) -> Option<usize> {
    let you = state.you()?;
    let head = you.head();
    let chosen = state
        .enemies()
        .map(|(idx, enemy)| (enemy.head().manhattan(&head), std::cmp::Reverse(enemy.len()), idx))
        .filter(|(distance, _, _)| *distance <= radius)
        .min()
        .map(|(_, _, idx)| idx);

    if let Some(idx) = chosen {
        debug!("Lookahead opponent: {}", state.snakes[idx].id);
    }
    chosen
}

/// Replies the opponent would consider: on the board and off every body
pub fn opponent_moves(state: &Snapshot, idx: usize) -> Vec<Direction> {
    let Some(snake) = state.snakes.get(idx).filter(|s| s.is_alive()) else {
        return Vec::new();
    };
    let grid = state.blocked_grid(Some(idx));
    let head = snake.head();
    Direction::all()
        .into_iter()
        .filter(|dir| !grid.is_blocked(&dir.apply(&head)))
        .collect()
}
