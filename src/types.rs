// Battlesnake API Types
// See https://docs.battlesnake.com/api

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Game metadata including ID, ruleset, and timeout
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub ruleset: Value,
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub source: String,
}

/// Board state including dimensions, food, snakes, and hazards
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Board {
    pub height: i32,
    pub width: i32,
    pub food: Vec<Coord>,
    pub snakes: Vec<Battlesnake>,
    #[serde(default)]
    pub hazards: Vec<Coord>,
}

/// Snake representation with all state information
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Battlesnake {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub health: i32,
    pub body: Vec<Coord>,
    pub head: Coord,
    #[serde(default)]
    pub length: i32,
    #[serde(default)]
    pub latency: String,
    #[serde(default)]
    pub shout: String,
}

/// 2D coordinate on the board
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Manhattan distance between two coordinates
    pub fn manhattan(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Whether the coordinate lies inside a `width` x `height` board
    pub fn in_bounds(&self, width: i32, height: i32) -> bool {
        self.x >= 0 && self.x < width && self.y >= 0 && self.y < height
    }

    /// The four orthogonal neighbours in `Direction::all()` order, bounds unchecked
    pub fn neighbors(&self) -> [Coord; 4] {
        Direction::all().map(|dir| dir.apply(self))
    }

    pub fn is_adjacent(&self, other: &Coord) -> bool {
        self.manhattan(other) == 1
    }
}

/// Represents the four possible movement directions for a Battlesnake
///
/// Declaration order doubles as the tie-break priority: up > down > left > right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    /// Converts direction to string representation for API response
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Parses the API string representation, case-insensitively
    pub fn parse(s: &str) -> Option<Direction> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit delta of the move: up is +y, right is +x
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        let (dx, dy) = self.delta();
        Coord {
            x: coord.x + dx,
            y: coord.y + dy,
        }
    }

    /// Direction that takes `from` to the adjacent cell `to`, if any
    pub fn between(from: &Coord, to: &Coord) -> Option<Direction> {
        Direction::all()
            .into_iter()
            .find(|dir| dir.apply(from) == *to)
    }

    pub fn index(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_index(idx: u8) -> Option<Direction> {
        Direction::all().get(idx as usize).copied()
    }
}

/// Complete game state received from the API
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameState {
    pub game: Game,
    pub turn: i32,
    pub board: Board,
    pub you: Battlesnake,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_deltas() {
        let origin = Coord::new(5, 5);
        assert_eq!(Direction::Up.apply(&origin), Coord::new(5, 6));
        assert_eq!(Direction::Down.apply(&origin), Coord::new(5, 4));
        assert_eq!(Direction::Left.apply(&origin), Coord::new(4, 5));
        assert_eq!(Direction::Right.apply(&origin), Coord::new(6, 5));
    }

    #[test]
    fn test_between_inverts_apply() {
        let from = Coord::new(3, 3);
        for dir in Direction::all() {
            assert_eq!(Direction::between(&from, &dir.apply(&from)), Some(dir));
        }
        assert_eq!(Direction::between(&from, &Coord::new(4, 4)), None);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(Direction::parse("up"), Some(Direction::Up));
        assert_eq!(Direction::parse("Down"), Some(Direction::Down));
        assert_eq!(Direction::parse("LEFT"), Some(Direction::Left));
        assert_eq!(Direction::parse("right"), Some(Direction::Right));
        assert_eq!(Direction::parse("diagonal"), None);
    }

    #[test]
    fn test_index_round_trip() {
        for dir in Direction::all() {
            assert_eq!(Direction::from_index(dir.index()), Some(dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn test_bounds_and_distance() {
        assert!(Coord::new(0, 0).in_bounds(11, 11));
        assert!(Coord::new(10, 10).in_bounds(11, 11));
        assert!(!Coord::new(11, 5).in_bounds(11, 11));
        assert!(!Coord::new(5, -1).in_bounds(11, 11));
        assert_eq!(Coord::new(0, 0).manhattan(&Coord::new(3, 4)), 7);
    }

    #[test]
    fn test_wire_format_tolerates_missing_optional_fields() {
        let raw = r#"{
            "game": {"id": "g1"},
            "turn": 3,
            "board": {
                "height": 7, "width": 7, "food": [{"x": 1, "y": 1}],
                "snakes": [{"id": "a", "health": 90, "body": [{"x": 2, "y": 2}], "head": {"x": 2, "y": 2}}]
            },
            "you": {"id": "a", "health": 90, "body": [{"x": 2, "y": 2}], "head": {"x": 2, "y": 2}}
        }"#;
        let state: GameState = serde_json::from_str(raw).expect("valid request");
        assert_eq!(state.turn, 3);
        assert!(state.board.hazards.is_empty());
        assert_eq!(state.you.shout, "");
    }
}
