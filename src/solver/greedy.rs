//! Greedy strategy: safe, re-planned after every single action.
//!
//! Decision cascade per step (first match wins):
//! 1. Flower adjacent and capacity left → pick it
//! 2. Princess adjacent and flowers held → give
//! 3. BFS over empty cells to the nearest flower approach cell (when there is
//!    capacity), else to the nearest princess approach cell (when holding) →
//!    one `move` along that path
//! 4. Nothing reachable through empty cells → BFS again with obstacles
//!    passable, walk to the first obstacle on that path and `clean` it
//! 5. Still nothing → stop, stuck
//!
//! Ties between equally near goals go to the lowest row, then lowest column
//! (see [`bfs_nearest`]), and adjacent flowers are picked in the same order,
//! so the output is fixed for a given board.

use std::collections::BTreeSet;

use crate::actions::ActionKind;
use crate::board::Board;
use crate::constants::GREEDY_STEPS_PER_CELL;
use crate::grid::{Direction, Position};
use crate::pathfinding::{
    approach_cells, bfs_nearest, first_obstacle, flower_approach_cells, Terrain,
};

use super::{step_budget, Plan, ScratchRun, StopReason};

#[derive(Clone, Debug, Default)]
pub struct GreedySolver {
    /// Overrides the `rows * cols * 8` action budget.
    pub max_steps: Option<usize>,
}

/// One greedy decision.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Decision {
    Act(ActionKind, Direction),
    Stuck(String),
}

impl GreedySolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn solve(&self, board: &Board) -> Plan {
        let budget = self
            .max_steps
            .unwrap_or_else(|| step_budget(board, GREEDY_STEPS_PER_CELL));
        let mut run = ScratchRun::new(board);

        loop {
            if run.board().is_victory() {
                return run.finish(StopReason::Victory);
            }
            if run.len() >= budget {
                return run.finish(StopReason::StepBudget(budget));
            }
            match decide(run.board()) {
                Decision::Act(action, dir) => {
                    if let Err(e) = run.push(action, dir) {
                        return run.finish(StopReason::Stuck(e.to_string()));
                    }
                }
                Decision::Stuck(why) => return run.finish(StopReason::Stuck(why)),
            }
        }
    }
}

fn decide(board: &Board) -> Decision {
    let robot = board.robot();
    let here = robot.position();
    let princess = board.princess().position();

    // 1. Pick an adjacent flower (flowers iterate in row-major order).
    if robot.has_capacity() {
        let adjacent = board.flowers().iter().find(|f| here.is_adjacent(**f));
        if let Some(dir) = adjacent.and_then(|&f| Direction::between(here, f)) {
            return Decision::Act(ActionKind::Pick, dir);
        }
    }

    // 2. Deliver when touching the princess.
    if robot.flowers_held() > 0 && board.adjacent_to_princess(here) {
        if let Some(dir) = Direction::between(here, princess) {
            return Decision::Act(ActionKind::Give, dir);
        }
    }

    // 3./4. Goal sets in priority order: flowers while there is room, then
    // the princess while holding.
    let want_flowers = robot.has_capacity() && !board.flowers().is_empty();
    let holding = robot.flowers_held() > 0;
    if !want_flowers && !holding {
        return Decision::Stuck("no flowers left to collect or deliver".to_string());
    }
    let goals_for = |terrain: Terrain| {
        let mut sets: Vec<BTreeSet<Position>> = Vec::with_capacity(2);
        if want_flowers {
            sets.push(flower_approach_cells(board, terrain));
        }
        if holding {
            sets.push(approach_cells(board, princess, terrain));
        }
        sets
    };

    for goals in goals_for(Terrain::Open) {
        if let Some(path) = bfs_nearest(board, here, &goals, Terrain::Open) {
            if let Some(dir) = path.first().and_then(|&next| Direction::between(here, next)) {
                return Decision::Act(ActionKind::Move, dir);
            }
        }
    }

    for goals in goals_for(Terrain::ThroughObstacles) {
        let Some(path) = bfs_nearest(board, here, &goals, Terrain::ThroughObstacles) else {
            continue;
        };
        let (Some(&next), Some(idx)) = (path.first(), first_obstacle(board, &path)) else {
            continue;
        };
        let Some(dir) = Direction::between(here, next) else {
            continue;
        };
        let action = if idx == 0 {
            ActionKind::Clean
        } else {
            ActionKind::Move
        };
        return Decision::Act(action, dir);
    }

    Decision::Stuck(format!("no path to a flower or to the princess from {here}"))
}
