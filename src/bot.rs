// Request orchestration for the Battlesnake API
//
// The engine is synchronous and CPU-bound. Each /move runs it on tokio's
// blocking pool and polls a lock-free shared state until the search finishes
// or the time budget runs out, answering with the best move published so far.

use log::info;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::debug_logger::DebugLogger;
use crate::selector::{fallback_move, Decision, Engine, Phase, Progress};
use crate::space::SpaceCache;
use crate::state::{Snapshot, SnapshotError};
use crate::types::{Direction, GameState};

/// Lock-free shared state for communication between async poller and computation engine
#[derive(Debug)]
pub struct SharedSearchState {
    /// Best move found so far (encoded as direction index)
    best_move: AtomicU8,
    /// Best score so far, as f64 bits
    best_score: AtomicU64,
    /// Deepest completed search depth
    current_depth: AtomicU8,
    /// Flag indicating search completion
    search_complete: AtomicBool,
    /// Full decision once the engine reaches a terminal phase
    decision: Mutex<Option<Decision>>,
}

impl SharedSearchState {
    /// Seeds the state with a fallback so the poller always has an answer
    pub fn new(fallback: Direction) -> Self {
        SharedSearchState {
            best_move: AtomicU8::new(fallback.index()),
            best_score: AtomicU64::new(f64::NEG_INFINITY.to_bits()),
            current_depth: AtomicU8::new(0),
            search_complete: AtomicBool::new(false),
            decision: Mutex::new(None),
        }
    }

    pub fn best(&self) -> (Direction, f64, u8) {
        let direction =
            Direction::from_index(self.best_move.load(Ordering::Acquire)).unwrap_or(Direction::Up);
        let score = f64::from_bits(self.best_score.load(Ordering::Acquire));
        (direction, score, self.current_depth.load(Ordering::Acquire))
    }

    pub fn is_complete(&self) -> bool {
        self.search_complete.load(Ordering::Acquire)
    }

    fn complete(&self, decision: Decision) {
        self.best_move.store(decision.direction.index(), Ordering::Release);
        self.best_score.store(decision.score.to_bits(), Ordering::Release);
        self.current_depth.store(decision.depth, Ordering::Release);
        *self.decision.lock() = Some(decision);
        self.search_complete.store(true, Ordering::Release);
    }

    fn take_decision(&self) -> Option<Decision> {
        self.decision.lock().take()
    }
}

impl Progress for SharedSearchState {
    fn publish(&self, direction: Direction, score: f64, depth: u8) {
        self.best_move.store(direction.index(), Ordering::Release);
        self.best_score.store(score.to_bits(), Ordering::Release);
        self.current_depth.store(depth, Ordering::Release);
    }
}

/// Battlesnake Bot with OOP-style API
/// Takes static configuration dependencies and exposes methods corresponding to API endpoints
pub struct Bot {
    engine: Arc<Engine>,
    debug_logger: DebugLogger,
}

impl Bot {
    /// Creates a new Bot instance
    ///
    /// # Arguments
    /// * `config` - Static configuration that does not change during the bot's lifetime
    /// * `cache` - Process-wide reachable-space memo, swept elsewhere
    /// * `debug_logger` - Optional JSONL decision log
    pub fn new(config: Config, cache: Arc<SpaceCache>, debug_logger: DebugLogger) -> Self {
        Bot {
            engine: Arc::new(Engine::new(config, cache)),
            debug_logger,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns bot metadata and appearance
    /// Corresponds to GET / endpoint
    pub fn info(&self) -> Value {
        info!("INFO");
        let appearance = &self.engine.config().appearance;

        json!({
            "apiversion": "1",
            "author": appearance.author,
            "color": appearance.color,
            "head": appearance.head,
            "tail": appearance.tail,
        })
    }

    /// Called when a game starts
    /// Corresponds to POST /start endpoint
    pub fn start(&self, state: &GameState) {
        info!("GAME START {}", state.game.id);
    }

    /// Called when a game ends; drops the game's memo entries early
    /// Corresponds to POST /end endpoint
    pub fn end(&self, state: &GameState) {
        let dropped = self.engine.cache().forget_game(&state.game.id);
        info!("GAME OVER {} ({} cached areas dropped)", state.game.id, dropped);
    }

    /// Computes and returns the next move within the time budget
    /// Corresponds to POST /move endpoint
    ///
    /// 1. Validates the request into a `Snapshot` (malformed input is rejected here)
    /// 2. Spawns the engine on the blocking pool
    /// 3. Polls for results with timeout management
    /// 4. Returns the best move found within the budget (anytime property)
    pub async fn get_move(&self, state: &GameState) -> Result<Value, SnapshotError> {
        let start_time = Instant::now();
        let snapshot = Snapshot::from_game_state(state)?;
        let turn = snapshot.turn;

        info!("Turn {}: Computing move", turn);

        let config = self.engine.config();
        let budget = Duration::from_millis(config.timing.effective_budget_ms());
        let deadline = start_time + budget;

        let fallback = fallback_move(&snapshot, config.emergency.default_move());
        let shared = Arc::new(SharedSearchState::new(fallback));

        let engine = self.engine.clone();
        let shared_clone = shared.clone();
        let search_snapshot = snapshot.clone();
        tokio::task::spawn_blocking(move || {
            let decision = engine.decide(&search_snapshot, deadline, shared_clone.as_ref());
            shared_clone.complete(decision);
        });

        // Polling loop: check for results or timeout
        let polling_interval = Duration::from_millis(config.timing.polling_interval_ms);
        loop {
            tokio::time::sleep(polling_interval).await;

            if shared.is_complete() || start_time.elapsed() >= budget {
                break;
            }
        }

        let (direction, score, depth, phase, shout) = match shared.take_decision() {
            Some(decision) => {
                self.debug_logger.log_move(&snapshot, &decision);
                let shout = decision.shout.clone();
                (decision.direction, decision.score, decision.depth, decision.phase, shout)
            }
            None => {
                let (direction, score, depth) = shared.best();
                (direction, score, depth, Phase::Evaluating, None)
            }
        };

        info!(
            "Turn {}: Chose {} ({}, score: {:.1}, depth: {}, time: {}ms)",
            turn,
            direction.as_str(),
            phase.as_str(),
            score,
            depth,
            start_time.elapsed().as_millis()
        );

        Ok(match shout {
            Some(shout) => json!({ "move": direction.as_str(), "shout": shout }),
            None => json!({ "move": direction.as_str() }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_state_starts_from_fallback() {
        let shared = SharedSearchState::new(Direction::Left);
        let (direction, score, depth) = shared.best();
        assert_eq!(direction, Direction::Left);
        assert_eq!(score, f64::NEG_INFINITY);
        assert_eq!(depth, 0);
        assert!(!shared.is_complete());
        assert!(shared.take_decision().is_none());
    }

    #[test]
    fn test_published_depths_overwrite_and_completion_is_final() {
        let shared = SharedSearchState::new(Direction::Up);
        shared.publish(Direction::Right, 12.0, 1);
        shared.publish(Direction::Down, 30.5, 2);
        assert_eq!(shared.best(), (Direction::Down, 30.5, 2));

        shared.complete(Decision {
            direction: Direction::Down,
            phase: Phase::Committed,
            score: 30.5,
            depth: 2,
            candidates: Vec::new(),
            shout: None,
        });
        assert!(shared.is_complete());
        let decision = shared.take_decision().expect("completed");
        assert_eq!(decision.phase, Phase::Committed);
        assert!(shared.take_decision().is_none());
    }
}
