//! A* route search over the grid's path tiles.
//!
//! The search is deterministic: frontier entries order by total estimated
//! cost, then heuristic, then column, then row, so equal-cost routes always
//! resolve the same way regardless of insertion order.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
};

use gridfall_core::{CellKind, GridPos};

use crate::{Cell, Grid};

/// Finds the shortest walkable route between two cells, inclusive of both.
///
/// Only `Path` cells are walkable. Returns an empty vector when either
/// endpoint is out of bounds or not walkable, or when no route exists.
#[must_use]
pub fn find_route(grid: &Grid, start: GridPos, goal: GridPos) -> Vec<GridPos> {
    if !is_walkable(grid, start) || !is_walkable(grid, goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let mut frontier: BinaryHeap<Reverse<(u32, u32, u32, u32)>> = BinaryHeap::new();
    let mut g_score: HashMap<GridPos, u32> = HashMap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut closed: HashSet<GridPos> = HashSet::new();

    let _ = g_score.insert(start, 0);
    frontier.push(Reverse(score(start, goal, 0)));

    while let Some(Reverse((_, _, x, y))) = frontier.pop() {
        let current = GridPos::new(x, y);
        if current == goal {
            return reconstruct(&came_from, current);
        }
        if !closed.insert(current) {
            continue;
        }
        let current_g = g_score[&current];

        for neighbor in neighbors(grid, current) {
            if closed.contains(&neighbor) {
                continue;
            }
            let tentative = current_g + 1;
            if g_score.get(&neighbor).is_some_and(|&g| g <= tentative) {
                continue;
            }
            let _ = g_score.insert(neighbor, tentative);
            let _ = came_from.insert(neighbor, current);
            frontier.push(Reverse(score(neighbor, goal, tentative)));
        }
    }

    Vec::new()
}

fn score(pos: GridPos, goal: GridPos, g: u32) -> (u32, u32, u32, u32) {
    let h = pos.manhattan_distance(goal);
    (g + h, h, pos.x(), pos.y())
}

fn is_walkable(grid: &Grid, pos: GridPos) -> bool {
    grid.cell(pos).map(Cell::kind) == Some(CellKind::Path)
}

fn neighbors(grid: &Grid, pos: GridPos) -> impl Iterator<Item = GridPos> + '_ {
    let (x, y) = (pos.x(), pos.y());
    let candidates = [
        (x.checked_sub(1), Some(y)),
        (x.checked_add(1), Some(y)),
        (Some(x), y.checked_sub(1)),
        (Some(x), y.checked_add(1)),
    ];
    candidates.into_iter().filter_map(move |(cx, cy)| {
        let candidate = GridPos::new(cx?, cy?);
        is_walkable(grid, candidate).then_some(candidate)
    })
}

fn reconstruct(came_from: &HashMap<GridPos, GridPos>, goal: GridPos) -> Vec<GridPos> {
    let mut route = vec![goal];
    let mut cursor = goal;
    while let Some(&previous) = came_from.get(&cursor) {
        route.push(previous);
        cursor = previous;
    }
    route.reverse();
    route
}
