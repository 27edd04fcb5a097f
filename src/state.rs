// Engine-side game state
//
// A `Snapshot` is built once per turn from the wire `GameState` and is never
// mutated afterwards. Lookahead produces new snapshots through `advance`, so
// sibling branches never share mutable state.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use crate::types::{Coord, Direction, GameState};

/// Reasons a turn request cannot be turned into a `Snapshot`
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("board dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("board {width}x{height} exceeds the {max}x{max} limit")]
    BoardTooLarge { width: i32, height: i32, max: i32 },
    #[error("snake '{0}' has an empty body")]
    EmptyBody(String),
    #[error("snake '{id}' has health {health} outside 0..=100")]
    InvalidHealth { id: String, health: i32 },
    #[error("snake '{id}' has a segment outside the board at ({x}, {y})")]
    SegmentOutOfBounds { id: String, x: i32, y: i32 },
    #[error("controlled snake '{0}' is not on the board")]
    SelfMissing(String),
    #[error("controlled snake '{0}' differs from its board entry")]
    SelfDiverged(String),
    #[error("duplicate snake id '{0}'")]
    DuplicateSnake(String),
}

/// Largest accepted board side; keeps grid sizes bounded per flood fill
pub const MAX_BOARD_DIMENSION: i32 = 255;

/// A snake as the engine sees it: identity, health and body, head first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snake {
    pub id: Arc<str>,
    pub health: i32,
    pub body: Vec<Coord>,
}

impl Snake {
    pub fn new(id: &str, health: i32, body: Vec<Coord>) -> Self {
        Snake {
            id: Arc::from(id),
            health,
            body,
        }
    }

    pub fn head(&self) -> Coord {
        self.body[0]
    }

    pub fn tail(&self) -> Coord {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the tail cell frees up on this snake's next move.
    ///
    /// Eating stacks the last segment, so the body grows by staying put for
    /// one step. A stacked tail (or a single-segment body) means the cell stays
    /// occupied.
    pub fn tail_vacates(&self) -> bool {
        let n = self.body.len();
        n >= 2 && self.body[n - 1] != self.body[n - 2]
    }
}

/// Boolean occupancy over the board; out-of-bounds reads as blocked
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    blocked: Vec<bool>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Grid {
            width,
            height,
            blocked: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn index(&self, c: &Coord) -> Option<usize> {
        if c.in_bounds(self.width, self.height) {
            Some((c.y * self.width + c.x) as usize)
        } else {
            None
        }
    }

    pub fn is_blocked(&self, c: &Coord) -> bool {
        self.index(c).map_or(true, |i| self.blocked[i])
    }

    pub fn set_blocked(&mut self, c: &Coord, blocked: bool) {
        if let Some(i) = self.index(c) {
            self.blocked[i] = blocked;
        }
    }

    pub fn open_cells(&self) -> usize {
        self.blocked.iter().filter(|b| !**b).count()
    }
}

/// Immutable engine view of one turn
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub game_id: Arc<str>,
    pub turn: i32,
    pub width: i32,
    pub height: i32,
    pub food: Vec<Coord>,
    pub snakes: Vec<Snake>,
    you: usize,
}

impl Snapshot {
    /// Builds a snapshot, validating the invariants the engine relies on
    pub fn new(
        game_id: &str,
        turn: i32,
        width: i32,
        height: i32,
        food: Vec<Coord>,
        snakes: Vec<Snake>,
        you_id: &str,
    ) -> Result<Self, SnapshotError> {
        if width <= 0 || height <= 0 {
            return Err(SnapshotError::InvalidDimensions { width, height });
        }
        if width > MAX_BOARD_DIMENSION || height > MAX_BOARD_DIMENSION {
            return Err(SnapshotError::BoardTooLarge {
                width,
                height,
                max: MAX_BOARD_DIMENSION,
            });
        }

        for (i, snake) in snakes.iter().enumerate() {
            if snake.body.is_empty() {
                return Err(SnapshotError::EmptyBody(snake.id.to_string()));
            }
            if !(0..=100).contains(&snake.health) {
                return Err(SnapshotError::InvalidHealth {
                    id: snake.id.to_string(),
                    health: snake.health,
                });
            }
            if let Some(c) = snake.body.iter().find(|c| !c.in_bounds(width, height)) {
                return Err(SnapshotError::SegmentOutOfBounds {
                    id: snake.id.to_string(),
                    x: c.x,
                    y: c.y,
                });
            }
            if snakes[..i].iter().any(|other| other.id == snake.id) {
                return Err(SnapshotError::DuplicateSnake(snake.id.to_string()));
            }
        }

        let you = snakes
            .iter()
            .position(|s| &*s.id == you_id)
            .ok_or_else(|| SnapshotError::SelfMissing(you_id.to_string()))?;

        let mut food = food;
        food.retain(|f| f.in_bounds(width, height));
        food.sort();
        food.dedup();

        Ok(Snapshot {
            game_id: Arc::from(game_id),
            turn,
            width,
            height,
            food,
            snakes,
            you,
        })
    }

    /// Converts a wire request. The board's copy of `you` is authoritative;
    /// the separate `you` field must agree with it.
    pub fn from_game_state(state: &GameState) -> Result<Self, SnapshotError> {
        let board = &state.board;
        let snakes: Vec<Snake> = board
            .snakes
            .iter()
            .map(|s| Snake::new(&s.id, s.health, s.body.clone()))
            .collect();

        let snapshot = Snapshot::new(
            &state.game.id,
            state.turn,
            board.width,
            board.height,
            board.food.clone(),
            snakes,
            &state.you.id,
        )?;

        let you = snapshot.you_snake();
        if you.body != state.you.body || you.health != state.you.health {
            return Err(SnapshotError::SelfDiverged(state.you.id.clone()));
        }

        Ok(snapshot)
    }

    pub fn you_index(&self) -> usize {
        self.you
    }

    /// The controlled snake, if the index still resolves
    pub fn you(&self) -> Option<&Snake> {
        self.snakes.get(self.you)
    }

    // Validated at construction and `advance` never removes snakes.
    fn you_snake(&self) -> &Snake {
        &self.snakes[self.you]
    }

    /// Live snakes other than the controlled one, with their indices
    pub fn enemies(&self) -> impl Iterator<Item = (usize, &Snake)> {
        let you = self.you;
        self.snakes
            .iter()
            .enumerate()
            .filter(move |(i, s)| *i != you && s.is_alive())
    }

    pub fn eliminated_enemies(&self) -> usize {
        self.snakes
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != self.you && !s.is_alive())
            .count()
    }

    pub fn in_bounds(&self, c: &Coord) -> bool {
        c.in_bounds(self.width, self.height)
    }

    pub fn has_food(&self, c: &Coord) -> bool {
        self.food.binary_search(c).is_ok()
    }

    pub fn center(&self) -> Coord {
        Coord::new((self.width - 1) / 2, (self.height - 1) / 2)
    }

    /// Occupancy of every live body segment. When `mover` is given, that
    /// snake's tail is left open if it will vacate on the mover's next step.
    pub fn blocked_grid(&self, mover: Option<usize>) -> Grid {
        let mut grid = Grid::new(self.width, self.height);
        for snake in self.snakes.iter().filter(|s| s.is_alive()) {
            for seg in &snake.body {
                grid.set_blocked(seg, true);
            }
        }
        if let Some(snake) = mover.and_then(|i| self.snakes.get(i)) {
            if snake.is_alive() && snake.tail_vacates() {
                grid.set_blocked(&snake.tail(), false);
            }
        }
        grid
    }

    /// Hash of everything that shapes the occupancy grid
    pub fn occupancy_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for snake in self.snakes.iter().filter(|s| s.is_alive()) {
            snake.id.hash(&mut hasher);
            snake.body.hash(&mut hasher);
        }
        self.you.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the state after snake `idx` moves one step in `dir`.
    ///
    /// The mover loses one health, eats if its new head is on food (health
    /// restored, tail stacked), and is eliminated on leaving the board,
    /// starving, or running into a body. Meeting another head is settled by
    /// length; equal lengths eliminate both.
    pub fn advance(&self, idx: usize, dir: Direction, max_health: i32) -> Snapshot {
        let mut next = self.clone();
        let Some(mover) = next.snakes.get(idx) else {
            return next;
        };
        if !mover.is_alive() {
            return next;
        }

        let new_head = dir.apply(&mover.head());
        let ate = next.has_food(&new_head);

        let snake = &mut next.snakes[idx];
        snake.body.insert(0, new_head);
        snake.body.pop();
        snake.health -= 1;
        if ate {
            let tail = snake.tail();
            snake.body.push(tail);
            snake.health = max_health;
            next.food.retain(|f| *f != new_head);
        }

        next.resolve_collisions(idx);
        next
    }

    /// Marks snake `idx` as eliminated
    pub fn eliminate(&self, idx: usize) -> Snapshot {
        let mut next = self.clone();
        if let Some(snake) = next.snakes.get_mut(idx) {
            snake.health = 0;
        }
        next
    }

    fn resolve_collisions(&mut self, idx: usize) {
        let mover = &self.snakes[idx];
        let head = mover.head();
        let mover_len = mover.len();

        if mover.health <= 0 || !self.in_bounds(&head) || mover.body[1..].contains(&head) {
            self.snakes[idx].health = 0;
            return;
        }

        let mut mover_dies = false;
        let mut losers = Vec::new();
        for (j, other) in self.snakes.iter().enumerate() {
            if j == idx || !other.is_alive() {
                continue;
            }
            if other.head() == head {
                if other.len() >= mover_len {
                    mover_dies = true;
                }
                if other.len() <= mover_len {
                    losers.push(j);
                }
            } else if other.body[1..].contains(&head) {
                mover_dies = true;
            }
        }

        for j in losers {
            self.snakes[j].health = 0;
        }
        if mover_dies {
            self.snakes[idx].health = 0;
        }
    }
}
