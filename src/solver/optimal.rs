//! Optimal strategy: A* legs ordered by a bounded pickup lookahead.
//!
//! Each leg is planned up front and emitted in one go:
//!
//! 1. Take the `candidate_width` reachable flowers nearest to the robot
//!    (Manhattan).
//! 2. A* from the robot to each candidate's approach cells; drop the
//!    unreachable ones.
//! 3. Enumerate ordered sequences of `min(lookahead_depth, room left)`
//!    reachable candidates. Cost = A* cost to the first flower + Manhattan hops
//!    between consecutive flowers + Manhattan to the princess when the
//!    sequence fills the robot. Keep the cheapest (first found on ties).
//! 4. Walk the whole A* path to the first flower of that sequence and pick it,
//!    then re-plan.
//!
//! When the robot is full or the board is empty of flowers, it runs A* to the
//! princess and gives.
//!
//! Unlike the greedy strategy, safety is not re-checked between the moves of a
//! leg, and obstacles are cleaned only on the way to flowers. If no flower can
//! be reached it walks the cheapest obstacle-crossing A* path (obstacle cells
//! cost [`OBSTACLE_PENALTY`] extra) to its first obstacle and cleans it. If
//! the princess is walled off, the plan ends early with what it has.

use std::collections::BTreeSet;

use crate::actions::ActionKind;
use crate::board::Board;
use crate::constants::*;
use crate::grid::Position;
use crate::pathfinding::{
    approach_cells, astar, distance_map, first_obstacle, flower_approach_cells, Terrain,
};

use super::{step_budget, Plan, ScratchRun, StopReason};

#[derive(Clone, Debug)]
pub struct OptimalSolver {
    pub lookahead_depth: usize,
    pub candidate_width: usize,
    pub max_steps: Option<usize>,
}

impl Default for OptimalSolver {
    fn default() -> Self {
        Self {
            lookahead_depth: DEFAULT_LOOKAHEAD_DEPTH,
            candidate_width: DEFAULT_CANDIDATE_WIDTH,
            max_steps: None,
        }
    }
}

/// A reachable pickup target and the A* leg to it.
struct Leg {
    flower: Position,
    path: Vec<Position>,
    cost: usize,
}

impl OptimalSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookahead(mut self, depth: usize) -> Self {
        self.lookahead_depth = depth.max(1);
        self
    }

    pub fn solve(&self, board: &Board) -> Plan {
        let budget = self
            .max_steps
            .unwrap_or_else(|| step_budget(board, OPTIMAL_STEPS_PER_CELL));
        let mut run = ScratchRun::new(board);

        loop {
            if run.len() > budget {
                return run.finish_at_budget(budget);
            }
            if run.board().is_victory() {
                return run.finish(StopReason::Victory);
            }
            if run.len() >= budget {
                return run.finish_at_budget(budget);
            }
            let step = self.next_leg(&mut run);
            if let Err(why) = step {
                return run.finish(StopReason::Stuck(why));
            }
        }
    }

    /// Emit one leg into `run`. `Err` carries the reason planning must stop.
    fn next_leg(&self, run: &mut ScratchRun) -> Result<(), String> {
        let board = run.board();
        let robot = board.robot();
        let collecting = robot.has_capacity() && !board.flowers().is_empty();

        if collecting {
            if let Some(leg) = self.choose_leg(board) {
                run.walk(&leg.path).map_err(|e| e.to_string())?;
                return run.act_on(ActionKind::Pick, leg.flower).map_err(|e| e.to_string());
            }
            if self.clean_toward_flowers(run)? {
                return Ok(());
            }
            if run.board().robot().flowers_held() == 0 {
                return Err("no flower reachable, even by cleaning".to_string());
            }
        }
        self.deliver(run)
    }

    /// Best first pickup according to the bounded lookahead.
    fn choose_leg(&self, board: &Board) -> Option<Leg> {
        let here = board.robot().position();
        let reach = distance_map(board, here, Terrain::Open);
        let reachable = |p: &Position| reach[p.row as usize * board.cols() + p.col as usize].is_some();
        let mut candidates: Vec<Position> = board
            .flowers()
            .iter()
            .copied()
            .filter(|&f| approach_cells(board, f, Terrain::Open).iter().any(reachable))
            .collect();
        candidates.sort_by_key(|&f| (here.manhattan(f), f));
        candidates.truncate(self.candidate_width.max(1));

        let legs: Vec<Leg> = candidates
            .into_iter()
            .filter_map(|flower| {
                let goals = approach_cells(board, flower, Terrain::Open);
                astar(board, here, &goals, Terrain::Open).map(|(path, cost)| Leg { flower, path, cost })
            })
            .collect();
        if legs.is_empty() {
            return None;
        }

        let room = (board.robot().max_capacity() - board.robot().flowers_held()) as usize;
        let depth = self.lookahead_depth.max(1).min(room).min(legs.len());
        let fills_robot = depth == room;
        let princess = board.princess().position();

        let mut best: Option<(usize, usize)> = None; // (cost, first leg index)
        let mut order = Vec::with_capacity(depth);
        let mut used = vec![false; legs.len()];
        search_orders(&legs, depth, &mut order, &mut used, &mut |seq: &[usize]| {
            let mut cost = legs[seq[0]].cost;
            for w in seq.windows(2) {
                cost += legs[w[0]].flower.manhattan(legs[w[1]].flower);
            }
            if fills_robot {
                if let Some(&last) = seq.last() {
                    cost += legs[last].flower.manhattan(princess);
                }
            }
            if best.map_or(true, |(c, _)| cost < c) {
                best = Some((cost, seq[0]));
            }
        });

        let (_, first) = best?;
        legs.into_iter().nth(first)
    }

    /// Walk to and clean the first obstacle on the cheapest obstacle-crossing
    /// route to any flower. `Ok(false)` when no such route exists.
    fn clean_toward_flowers(&self, run: &mut ScratchRun) -> Result<bool, String> {
        let board = run.board();
        let here = board.robot().position();
        let goals: BTreeSet<Position> = flower_approach_cells(board, Terrain::ThroughObstacles);
        let Some((path, _)) = astar(board, here, &goals, Terrain::ThroughObstacles) else {
            return Ok(false);
        };
        let Some(idx) = first_obstacle(board, &path) else {
            return Ok(false);
        };
        let obstacle = path[idx];
        run.walk(&path[..idx]).map_err(|e| e.to_string())?;
        run.act_on(ActionKind::Clean, obstacle).map_err(|e| e.to_string())?;
        Ok(true)
    }

    fn deliver(&self, run: &mut ScratchRun) -> Result<(), String> {
        let board = run.board();
        if board.robot().flowers_held() == 0 {
            return Err("nothing left to deliver".to_string());
        }
        let here = board.robot().position();
        let princess = board.princess().position();
        let goals = approach_cells(board, princess, Terrain::Open);
        let Some((path, _)) = astar(board, here, &goals, Terrain::Open) else {
            return Err(format!("princess at {princess} is unreachable"));
        };
        run.walk(&path).map_err(|e| e.to_string())?;
        run.act_on(ActionKind::Give, princess).map_err(|e| e.to_string())
    }
}

/// Visit every ordered selection of `depth` distinct legs.
fn search_orders(
    legs: &[Leg],
    depth: usize,
    order: &mut Vec<usize>,
    used: &mut [bool],
    visit: &mut dyn FnMut(&[usize]),
) {
    if order.len() == depth {
        visit(order);
        return;
    }
    for i in 0..legs.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        order.push(i);
        search_orders(legs, depth, order, used, visit);
        order.pop();
        used[i] = false;
    }
}
