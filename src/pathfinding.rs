//! Shortest paths on the 4-connected board: BFS for the greedy solver and the
//! heuristic predictor, A* for the optimal planner.
//!
//! Both searches start from the robot's cell and expand neighbours in
//! [`Direction::ALL`](crate::grid::Direction::ALL) order, so results are reproducible for a fixed board.
//! A returned path excludes the start cell and ends on the chosen goal; an
//! empty path means the start already is a goal.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use crate::board::Board;
use crate::constants::OBSTACLE_PENALTY;
use crate::grid::Position;

/// Which cells a search may enter besides empty ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terrain {
    /// Empty in-bounds cells only.
    Open,
    /// Obstacles too (they would have to be cleaned on the way).
    ThroughObstacles,
}

impl Terrain {
    #[inline]
    fn passable(self, board: &Board, pos: Position) -> bool {
        board.is_walkable(pos)
            || (self == Terrain::ThroughObstacles && board.has_obstacle(pos))
    }
}

/// Row-major cell index; callers guarantee `pos` is in bounds.
#[inline]
fn cell_index(board: &Board, pos: Position) -> usize {
    pos.row as usize * board.cols() + pos.col as usize
}

/// Cells from which the robot can act on `target`: in-bounds neighbours the
/// search may enter under `terrain`, plus the robot's own cell when it already
/// touches the target.
pub fn approach_cells(board: &Board, target: Position, terrain: Terrain) -> BTreeSet<Position> {
    let robot = board.robot().position();
    board
        .neighbors(target)
        .map(|(_, p)| p)
        .filter(|&p| p == robot || terrain.passable(board, p))
        .collect()
}

/// Cells adjacent to any remaining flower, see [`approach_cells`].
pub fn flower_approach_cells(board: &Board, terrain: Terrain) -> BTreeSet<Position> {
    board
        .flowers()
        .iter()
        .flat_map(|&f| approach_cells(board, f, terrain))
        .collect()
}

// ── BFS ─────────────────────────────────────────────────────────────

/// BFS distances from `start`. `None` marks unreachable cells.
pub fn distance_map(board: &Board, start: Position, terrain: Terrain) -> Vec<Option<usize>> {
    bfs(board, start, terrain).0
}

fn bfs(
    board: &Board,
    start: Position,
    terrain: Terrain,
) -> (Vec<Option<usize>>, Vec<Option<Position>>) {
    let n = board.rows() * board.cols();
    let mut dist = vec![None; n];
    let mut parent = vec![None; n];
    if !board.in_bounds(start) {
        return (dist, parent);
    }
    dist[cell_index(board, start)] = Some(0);
    let mut queue = VecDeque::from([start]);

    while let Some(cur) = queue.pop_front() {
        let d = dist[cell_index(board, cur)].unwrap_or(0);
        for (_, next) in board.neighbors(cur) {
            let ni = cell_index(board, next);
            if dist[ni].is_some() || !terrain.passable(board, next) {
                continue;
            }
            dist[ni] = Some(d + 1);
            parent[ni] = Some(cur);
            queue.push_back(next);
        }
    }
    (dist, parent)
}

/// Shortest path from `start` to the nearest goal.
///
/// Ties on distance go to the goal with the lowest row, then lowest column.
pub fn bfs_nearest(
    board: &Board,
    start: Position,
    goals: &BTreeSet<Position>,
    terrain: Terrain,
) -> Option<Vec<Position>> {
    let (dist, parent) = bfs(board, start, terrain);
    // BTreeSet iterates in (row, col) order, so min_by_key keeps the first tie.
    let goal = goals
        .iter()
        .filter(|&&g| board.in_bounds(g))
        .filter_map(|&g| dist[cell_index(board, g)].map(|d| (d, g)))
        .min_by_key(|&(d, _)| d)
        .map(|(_, g)| g)?;
    Some(reconstruct(board, &parent, start, goal))
}

fn reconstruct(
    board: &Board,
    parent: &[Option<Position>],
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = Vec::new();
    let mut cur = goal;
    while cur != start {
        path.push(cur);
        match parent[cell_index(board, cur)] {
            Some(p) => cur = p,
            None => break,
        }
    }
    path.reverse();
    path
}

// ── A* ──────────────────────────────────────────────────────────────

/// A* from `start` to the closest cell of `goals`.
///
/// Step cost is 1 into an empty cell and `1 + OBSTACLE_PENALTY` into an
/// obstacle (only entered with [`Terrain::ThroughObstacles`]). The heuristic
/// is the Manhattan distance to the nearest goal, which never overestimates.
/// Returns the path and its total cost.
pub fn astar(
    board: &Board,
    start: Position,
    goals: &BTreeSet<Position>,
    terrain: Terrain,
) -> Option<(Vec<Position>, usize)> {
    if goals.is_empty() || !board.in_bounds(start) {
        return None;
    }
    let h = |p: Position| goals.iter().map(|&g| p.manhattan(g)).min().unwrap_or(0);

    let n = board.rows() * board.cols();
    let mut g_cost: Vec<usize> = vec![usize::MAX; n];
    let mut parent: Vec<Option<Position>> = vec![None; n];
    let mut open = BinaryHeap::new();

    g_cost[cell_index(board, start)] = 0;
    // (f, h, row, col): lower f first, then closer to goal, then row-major.
    open.push(Reverse((h(start), h(start), start.row, start.col)));

    while let Some(Reverse((_, _, row, col))) = open.pop() {
        let cur = Position::new(row, col);
        let g = g_cost[cell_index(board, cur)];
        if goals.contains(&cur) {
            return Some((reconstruct(board, &parent, start, cur), g));
        }
        for (_, next) in board.neighbors(cur) {
            if !terrain.passable(board, next) {
                continue;
            }
            let step = if board.has_obstacle(next) {
                1 + OBSTACLE_PENALTY
            } else {
                1
            };
            let ng = g + step;
            let ni = cell_index(board, next);
            if ng < g_cost[ni] {
                g_cost[ni] = ng;
                parent[ni] = Some(cur);
                let hn = h(next);
                open.push(Reverse((ng + hn, hn, next.row, next.col)));
            }
        }
    }
    None
}

// ── Path helpers ────────────────────────────────────────────────────

/// Index of the first obstacle cell on `path`, if any.
pub fn first_obstacle(board: &Board, path: &[Position]) -> Option<usize> {
    path.iter().position(|&p| board.has_obstacle(p))
}
