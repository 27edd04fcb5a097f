// Reachable-space analysis
//
// Flood fill from a candidate head over unoccupied cells, plus a process-wide
// memo shared by every game the server is playing. Memo keys carry the game id
// and an occupancy fingerprint, so two games (or two lookahead branches) that
// happen to share a turn number and head coordinate never see each other's
// answers. Entries are evicted by `sweep`, which runs on its own timer.

use log::debug;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::state::{Grid, Snapshot};
use crate::types::Coord;

/// Result of a flood fill from a candidate position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachableArea {
    pub cells: usize,
    /// Fewer than twice our length in reach: not enough room to keep living
    pub dead_end: bool,
}

/// Counts cells reachable from `start`, including `start` itself.
/// Returns 0 when `start` is blocked or off the board.
pub fn flood_fill(grid: &Grid, start: Coord) -> usize {
    let Some(start_idx) = grid.index(&start) else {
        return 0;
    };
    if grid.is_blocked(&start) {
        return 0;
    }

    let mut visited = vec![false; (grid.width() * grid.height()) as usize];
    let mut queue = VecDeque::new();
    visited[start_idx] = true;
    queue.push_back(start);

    let mut count = 0;
    while let Some(cell) = queue.pop_front() {
        count += 1;
        for next in cell.neighbors() {
            let Some(idx) = grid.index(&next) else {
                continue;
            };
            if !visited[idx] && !grid.is_blocked(&next) {
                visited[idx] = true;
                queue.push_back(next);
            }
        }
    }

    count
}

/// Reachable area from `position` with our own tail treated as vacating
pub fn reachable_area(position: Coord, state: &Snapshot) -> ReachableArea {
    let grid = state.blocked_grid(Some(state.you_index()));
    let cells = flood_fill(&grid, position);
    let length = state.you().map_or(0, |you| you.len());

    ReachableArea {
        cells,
        dead_end: cells < length * 2,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpaceKey {
    game_id: Arc<str>,
    position: Coord,
    turn: i32,
    occupancy: u64,
}

#[derive(Debug, Clone, Copy)]
struct SpaceEntry {
    area: ReachableArea,
    computed_at: i32,
}

#[derive(Debug, Clone, Copy)]
struct GameClock {
    latest_turn: i32,
    last_seen: Instant,
}

/// Hit/miss counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub games: usize,
    pub hits: u64,
    pub misses: u64,
    /// `max_entries` reached; new areas are computed but not stored
    pub full: bool,
}

/// Shared reachable-space memo
#[derive(Debug)]
pub struct SpaceCache {
    entries: RwLock<HashMap<SpaceKey, SpaceEntry>>,
    games: RwLock<HashMap<Arc<str>, GameClock>>,
    enabled: bool,
    ttl_turns: i32,
    idle_game_ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    full: AtomicBool,
}

impl SpaceCache {
    pub fn new(config: &CacheConfig) -> Self {
        SpaceCache {
            entries: RwLock::new(HashMap::new()),
            games: RwLock::new(HashMap::new()),
            enabled: config.enabled,
            ttl_turns: config.ttl_turns,
            idle_game_ttl: Duration::from_secs(config.idle_game_ttl_secs),
            max_entries: config.max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            full: AtomicBool::new(false),
        }
    }

    /// Records that `game_id` is now at `turn`; drives turn-based expiry
    pub fn begin_turn(&self, game_id: &Arc<str>, turn: i32) {
        let mut games = self.games.write();
        let clock = games.entry(game_id.clone()).or_insert(GameClock {
            latest_turn: turn,
            last_seen: Instant::now(),
        });
        clock.latest_turn = clock.latest_turn.max(turn);
        clock.last_seen = Instant::now();
    }

    /// Memoized `reachable_area`
    pub fn reachable_area(&self, position: Coord, state: &Snapshot) -> ReachableArea {
        if !self.enabled {
            return reachable_area(position, state);
        }

        let key = SpaceKey {
            game_id: state.game_id.clone(),
            position,
            turn: state.turn,
            occupancy: state.occupancy_fingerprint(),
        };

        if let Some(entry) = self.entries.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.area;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let area = reachable_area(position, state);

        let mut entries = self.entries.write();
        if entries.len() < self.max_entries {
            entries.insert(
                key,
                SpaceEntry {
                    area,
                    computed_at: state.turn,
                },
            );
        } else if !self.full.swap(true, Ordering::Relaxed) {
            debug!(
                "Space cache full at {} entries, not memoizing until the next sweep",
                entries.len()
            );
        }
        area
    }

    /// Evicts entries older than the TTL relative to their game's latest turn,
    /// and everything belonging to games not seen for `idle_game_ttl`.
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let mut games = self.games.write();
        games.retain(|_, clock| clock.last_seen.elapsed() <= self.idle_game_ttl);

        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, entry| match games.get(&key.game_id) {
            Some(clock) => entry.computed_at + self.ttl_turns >= clock.latest_turn,
            None => false,
        });
        let removed = before - entries.len();
        if entries.len() < self.max_entries {
            self.full.store(false, Ordering::Relaxed);
        }

        if removed > 0 {
            debug!(
                "Space cache sweep removed {} entries ({} remain, {} games)",
                removed,
                entries.len(),
                games.len()
            );
        }
        removed
    }

    /// Drops everything belonging to a finished game
    pub fn forget_game(&self, game_id: &str) -> usize {
        self.games.write().remove(game_id);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| &*key.game_id != game_id);
        if entries.len() < self.max_entries {
            self.full.store(false, Ordering::Relaxed);
        }
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().len(),
            games: self.games.read().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            full: self.full.load(Ordering::Relaxed),
        }
    }
}
