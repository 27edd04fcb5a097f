// A* over the board grid with a Manhattan heuristic and unit step cost.
// Frontier ties break on lower f, then lower x + y, then insertion order, so
// the returned path is deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::state::{Grid, Snapshot};
use crate::types::Coord;

/// Shortest path from `start` to `goal` avoiding every live body segment.
///
/// The returned path excludes `start` and ends at `goal`, so its length is the
/// number of moves. `start` itself may be occupied (it is usually a head).
pub fn shortest_path(start: Coord, goal: Coord, state: &Snapshot) -> Option<Vec<Coord>> {
    let grid = state.blocked_grid(state.you().map(|_| state.you_index()));
    shortest_path_on(&grid, start, goal)
}

/// Path length only
pub fn path_length(start: Coord, goal: Coord, state: &Snapshot) -> Option<usize> {
    shortest_path(start, goal, state).map(|path| path.len())
}

pub fn shortest_path_on(grid: &Grid, start: Coord, goal: Coord) -> Option<Vec<Coord>> {
    let start_idx = grid.index(&start)?;
    let goal_idx = grid.index(&goal)?;
    if start == goal {
        return Some(Vec::new());
    }
    if grid.is_blocked(&goal) {
        return None;
    }

    let cells = (grid.width() * grid.height()) as usize;
    let mut g_score = vec![i32::MAX; cells];
    let mut came_from: Vec<Option<usize>> = vec![None; cells];
    let mut closed = vec![false; cells];
    let mut frontier = BinaryHeap::new();
    let mut seq: u32 = 0;

    g_score[start_idx] = 0;
    frontier.push(Reverse((start.manhattan(&goal), start.x + start.y, seq, start)));

    while let Some(Reverse((_, _, _, current))) = frontier.pop() {
        let Some(current_idx) = grid.index(&current) else {
            continue;
        };
        if closed[current_idx] {
            continue;
        }
        if current_idx == goal_idx {
            return Some(reconstruct(grid, &came_from, goal_idx, start_idx));
        }
        closed[current_idx] = true;

        let next_g = g_score[current_idx] + 1;
        for next in current.neighbors() {
            let Some(next_idx) = grid.index(&next) else {
                continue;
            };
            if closed[next_idx] || grid.is_blocked(&next) || next_g >= g_score[next_idx] {
                continue;
            }
            g_score[next_idx] = next_g;
            came_from[next_idx] = Some(current_idx);
            seq += 1;
            frontier.push(Reverse((next_g + next.manhattan(&goal), next.x + next.y, seq, next)));
        }
    }

    None
}

fn reconstruct(grid: &Grid, came_from: &[Option<usize>], goal_idx: usize, start_idx: usize) -> Vec<Coord> {
    let width = grid.width() as usize;
    let mut path = Vec::new();
    let mut idx = goal_idx;
    while idx != start_idx {
        path.push(Coord::new((idx % width) as i32, (idx / width) as i32));
        match came_from[idx] {
            Some(prev) => idx = prev,
            None => break,
        }
    }
    path.reverse();
    path
}
