// Debug logging module for asynchronous decision logging
//
// Fire-and-forget async writes so the request/response cycle never blocks.
// Each decided turn becomes one JSONL record.

use log::error;
use serde::Serialize;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::selector::{Decision, Phase};
use crate::state::Snapshot;
use crate::types::Direction;

#[derive(Debug, Serialize)]
struct RejectedCandidate {
    direction: Direction,
    reason: &'static str,
}

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry {
    game_id: String,
    turn: i32,
    chosen_move: Direction,
    phase: Phase,
    score: Option<f64>,
    depth: u8,
    rejected: Vec<RejectedCandidate>,
    timestamp: String,
}

impl DebugLogEntry {
    fn new(snapshot: &Snapshot, decision: &Decision) -> Self {
        DebugLogEntry {
            game_id: snapshot.game_id.to_string(),
            turn: snapshot.turn,
            chosen_move: decision.direction,
            phase: decision.phase,
            score: Some(decision.score).filter(|s| s.is_finite()),
            depth: decision.depth,
            rejected: decision
                .rejected()
                .map(|c| RejectedCandidate {
                    direction: c.direction,
                    reason: c.verdict.reason(),
                })
                .collect(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Shared debug logger state
/// Uses Arc<Mutex<File>> to allow concurrent async writes from multiple tasks
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<File>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub async fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
            .await
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(file))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    /// Logs a decision asynchronously (fire-and-forget)
    /// Must be called from within a tokio runtime when enabled
    pub fn log_move(&self, snapshot: &Snapshot, decision: &Decision) {
        if !self.enabled {
            return;
        }

        let file_handle = self.file.clone();
        let entry = DebugLogEntry::new(snapshot, decision);

        tokio::spawn(async move {
            Self::write_entry(file_handle, entry).await;
        });
    }

    /// Internal async function that performs the actual file write
    async fn write_entry(file_handle: Arc<Mutex<Option<File>>>, entry: DebugLogEntry) {
        let mut file_guard = file_handle.lock().await;

        let Some(file) = file_guard.as_mut() else {
            return;
        };

        match serde_json::to_string(&entry) {
            Ok(json_line) => {
                let line_with_newline = format!("{}\n", json_line);
                if let Err(e) = file.write_all(line_with_newline.as_bytes()).await {
                    error!("Failed to write debug log entry: {}", e);
                } else if let Err(e) = file.flush().await {
                    error!("Failed to flush debug log: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::Verdict;
    use crate::selector::Candidate;
    use crate::state::test_support::*;
    use crate::types::Coord;

    #[test]
    fn test_entry_lists_rejected_candidates() {
        let state = snapshot(7, 7, &[], vec![snake("me", 90, &[(0, 0), (1, 0)])]);
        let decision = Decision {
            direction: Direction::Up,
            phase: Phase::Committed,
            score: 12.5,
            depth: 2,
            candidates: vec![
                Candidate {
                    direction: Direction::Up,
                    position: Coord::new(0, 1),
                    score: 12.5,
                    verdict: Verdict::Safe,
                },
                Candidate {
                    direction: Direction::Left,
                    position: Coord::new(-1, 0),
                    score: f64::NEG_INFINITY,
                    verdict: Verdict::OutOfBounds,
                },
            ],
            shout: None,
        };

        let entry = DebugLogEntry::new(&state, &decision);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["chosen_move"], "up");
        assert_eq!(json["phase"], "committed");
        assert_eq!(json["rejected"][0]["direction"], "left");
        assert_eq!(json["rejected"][0]["reason"], "bounds");
        assert_eq!(json["game_id"], "test-game");
    }

    #[tokio::test]
    async fn test_disabled_logger_is_a_no_op() {
        let logger = DebugLogger::new(false, "unused.jsonl").await;
        let state = snapshot(7, 7, &[], vec![snake("me", 90, &[(3, 3)])]);
        let decision = Decision {
            direction: Direction::Down,
            phase: Phase::Emergency,
            score: f64::NEG_INFINITY,
            depth: 0,
            candidates: vec![],
            shout: None,
        };
        logger.log_move(&state, &decision);
        assert!(!logger.enabled);
    }
}
