// Collision and safety evaluation for a candidate head position
//
// Pure function of (position, snapshot). Checks run in order: bounds, own body,
// enemy bodies, then head-to-head contests with adjacent enemy heads.

use serde::Serialize;

use crate::state::Snapshot;
use crate::types::Coord;

/// Why a position is (un)safe for the controlled snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Safe,
    OutOfBounds,
    SelfCollision,
    EnemyCollision,
    HeadToHead,
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::Safe => "safe",
            Verdict::OutOfBounds => "bounds",
            Verdict::SelfCollision => "self",
            Verdict::EnemyCollision => "enemy",
            Verdict::HeadToHead => "head-to-head",
        }
    }
}

/// Classifies `position` as the next head of the controlled snake
pub fn is_safe(position: Coord, state: &Snapshot) -> Verdict {
    let Some(you) = state.you() else {
        return Verdict::SelfCollision;
    };

    if !state.in_bounds(&position) {
        return Verdict::OutOfBounds;
    }

    // The tail is only a hazard while growth is pending
    let own_hazards = if you.tail_vacates() {
        &you.body[..you.len() - 1]
    } else {
        &you.body[..]
    };
    if own_hazards.contains(&position) {
        return Verdict::SelfCollision;
    }

    for (_, enemy) in state.enemies() {
        if enemy.body.contains(&position) {
            return Verdict::EnemyCollision;
        }
    }

    for (_, enemy) in state.enemies() {
        if enemy.head().is_adjacent(&position) && enemy.len() >= you.len() {
            return Verdict::HeadToHead;
        }
    }

    Verdict::Safe
}

/// Reduced check used when nothing passes `is_safe`: walls and enemy bodies only
pub fn is_minimally_safe(position: Coord, state: &Snapshot) -> bool {
    state.in_bounds(&position)
        && state
            .enemies()
            .all(|(_, enemy)| !enemy.body.contains(&position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;

    fn solo(body: &[(i32, i32)]) -> Snapshot {
        snapshot(11, 11, &[], vec![snake("me", 90, body)])
    }

    #[test]
    fn test_out_of_bounds() {
        let state = solo(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(is_safe(Coord::new(-1, 0), &state), Verdict::OutOfBounds);
        assert_eq!(is_safe(Coord::new(0, -1), &state), Verdict::OutOfBounds);
        assert_eq!(is_safe(Coord::new(0, 1), &state), Verdict::Safe);
        assert_eq!(Verdict::OutOfBounds.reason(), "bounds");
    }

    #[test]
    fn test_neck_is_fatal() {
        let state = solo(&[(5, 5), (5, 4), (5, 3)]);
        assert_eq!(is_safe(Coord::new(5, 4), &state), Verdict::SelfCollision);
    }

    #[test]
    fn test_own_tail_is_safe_when_it_vacates() {
        // Head at (5,5), body loops so the tail sits right of the head
        let state = solo(&[(5, 5), (5, 4), (6, 4), (6, 5)]);
        assert_eq!(is_safe(Coord::new(6, 5), &state), Verdict::Safe);
    }

    #[test]
    fn test_own_tail_is_fatal_after_eating() {
        let state = solo(&[(5, 5), (5, 4), (6, 4), (6, 5), (6, 5)]);
        assert_eq!(is_safe(Coord::new(6, 5), &state), Verdict::SelfCollision);
    }

    #[test]
    fn test_enemy_tail_is_fatal() {
        let state = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3)]),
                snake("them", 90, &[(8, 6), (7, 6), (6, 6), (6, 5)]),
            ],
        );
        assert_eq!(is_safe(Coord::new(6, 5), &state), Verdict::EnemyCollision);
    }

    #[test]
    fn test_head_to_head_against_longer_or_equal_is_unsafe() {
        let longer = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3)]),
                snake("them", 90, &[(7, 5), (7, 4), (7, 3), (7, 2)]),
            ],
        );
        assert_eq!(is_safe(Coord::new(6, 5), &longer), Verdict::HeadToHead);

        let equal = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3)]),
                snake("them", 90, &[(7, 5), (7, 4), (7, 3)]),
            ],
        );
        assert_eq!(is_safe(Coord::new(6, 5), &equal), Verdict::HeadToHead);
    }

    #[test]
    fn test_head_to_head_against_shorter_is_safe() {
        let state = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3), (5, 2)]),
                snake("them", 90, &[(7, 5), (7, 4), (7, 3)]),
            ],
        );
        assert_eq!(is_safe(Coord::new(6, 5), &state), Verdict::Safe);
    }

    #[test]
    fn test_eliminated_snakes_are_ignored() {
        let state = snapshot(
            11,
            11,
            &[],
            vec![
                snake("me", 90, &[(5, 5), (5, 4), (5, 3)]),
                snake("ghost", 0, &[(6, 5), (7, 5), (8, 5), (9, 5)]),
            ],
        );
        assert_eq!(is_safe(Coord::new(6, 5), &state), Verdict::Safe);
    }

    #[test]
    fn test_minimal_check_ignores_own_body() {
        let state = solo(&[(5, 5), (5, 4), (5, 3)]);
        assert!(is_minimally_safe(Coord::new(5, 4), &state));
        assert!(!is_minimally_safe(Coord::new(5, 11), &state));
    }
}
