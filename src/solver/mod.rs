//! Autoplay strategies.
//!
//! Every strategy turns a board into a [`Plan`]: an ordered list of
//! `(action, direction)` pairs plus the reason planning stopped. Strategies
//! never touch the authoritative board; they work on a private clone through
//! [`ScratchRun`], so every planned action has already been validated once by
//! the action services before the orchestrator replays it.
//!
//! | Strategy | Module | Style |
//! |----------|--------|-------|
//! | `greedy` | [`greedy`] | re-plans with BFS after every action, cleans when walled in |
//! | `optimal` | [`optimal`] | A* legs ordered by bounded lookahead, front-loaded |
//! | `ml` | [`ml_proxy`] | one remote prediction per action |

pub mod greedy;
pub mod ml_proxy;
pub mod optimal;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{self, ActionKind};
use crate::board::Board;
use crate::error::ActionError;
use crate::grid::{Direction, Position};

pub use greedy::GreedySolver;
pub use ml_proxy::MlProxySolver;
pub use optimal::OptimalSolver;

// ── Strategy selection ──────────────────────────────────────────────

/// Wire name of a strategy, as accepted by the autoplay endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Greedy,
    Optimal,
    Ml,
}

impl StrategyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Greedy => "greedy",
            StrategyKind::Optimal => "optimal",
            StrategyKind::Ml => "ml",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(StrategyKind::Greedy),
            "optimal" => Ok(StrategyKind::Optimal),
            "ml" => Ok(StrategyKind::Ml),
            other => Err(format!("unknown strategy '{other}'")),
        }
    }
}

// ── Plans ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub action: ActionKind,
    pub direction: Direction,
}

/// Why a strategy stopped emitting actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    Victory,
    /// No further progress possible from the reached state.
    Stuck(String),
    StepBudget(usize),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Victory => f.write_str("all flowers delivered"),
            StopReason::Stuck(why) => write!(f, "no further progress: {why}"),
            StopReason::StepBudget(n) => write!(f, "step budget of {n} actions exhausted"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<PlannedAction>,
    pub stop: StopReason,
}

/// Strategy-level failure. Exhaustion is a [`StopReason`], not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("strategy '{strategy}' unavailable: {reason}")]
    StrategyUnavailable { strategy: StrategyKind, reason: String },
}

// ── Scratch board ───────────────────────────────────────────────────

/// Private working copy that validates every action a strategy emits.
pub(crate) struct ScratchRun {
    board: Board,
    actions: Vec<PlannedAction>,
}

impl ScratchRun {
    pub(crate) fn new(board: &Board) -> Self {
        Self {
            board: board.clone(),
            actions: Vec::new(),
        }
    }

    pub(crate) fn board(&self) -> &Board {
        &self.board
    }

    pub(crate) fn len(&self) -> usize {
        self.actions.len()
    }

    pub(crate) fn push(&mut self, action: ActionKind, direction: Direction) -> Result<(), ActionError> {
        actions::apply(&mut self.board, action, direction)?;
        self.actions.push(PlannedAction { action, direction });
        Ok(())
    }

    /// Move along `path`, one `move` per cell.
    pub(crate) fn walk(&mut self, path: &[Position]) -> Result<(), ActionError> {
        for &next in path {
            let here = self.board.robot().position();
            let Some(dir) = Direction::between(here, next) else {
                break;
            };
            self.push(ActionKind::Move, dir)?;
        }
        Ok(())
    }

    /// Act on the adjacent cell `target`. A non-adjacent target keeps the
    /// current facing, so the action's own precondition rejects it.
    pub(crate) fn act_on(&mut self, action: ActionKind, target: Position) -> Result<(), ActionError> {
        let here = self.board.robot().position();
        let dir = Direction::between(here, target).unwrap_or(self.board.robot().orientation());
        self.push(action, dir)
    }

    pub(crate) fn finish(self, stop: StopReason) -> Plan {
        Plan {
            actions: self.actions,
            stop,
        }
    }

    /// Stop on the budget, dropping whatever a multi-action leg emitted past it.
    pub(crate) fn finish_at_budget(mut self, budget: usize) -> Plan {
        self.actions.truncate(budget);
        self.finish(StopReason::StepBudget(budget))
    }
}

/// Step budget for a board: `rows * cols * per_cell`.
pub(crate) fn step_budget(board: &Board, per_cell: usize) -> usize {
    board.rows() * board.cols() * per_cell
}

// ── Dispatch ────────────────────────────────────────────────────────

/// A configured strategy. [`crate::autoplay::Autoplay`] is the only caller.
pub enum Solver {
    Greedy(GreedySolver),
    Optimal(OptimalSolver),
    MlProxy(MlProxySolver),
}

impl Solver {
    /// Plan from `board`. The CPU-bound planners run on the blocking pool.
    pub async fn solve(self, game_id: &str, board: &Board) -> Result<Plan, SolverError> {
        match self {
            Solver::Greedy(s) => {
                plan_blocking(StrategyKind::Greedy, board.clone(), move |b| s.solve(b)).await
            }
            Solver::Optimal(s) => {
                plan_blocking(StrategyKind::Optimal, board.clone(), move |b| s.solve(b)).await
            }
            Solver::MlProxy(s) => s.solve(game_id, board).await,
        }
    }
}

async fn plan_blocking<F>(strategy: StrategyKind, board: Board, plan: F) -> Result<Plan, SolverError>
where
    F: FnOnce(&Board) -> Plan + Send + 'static,
{
    tokio::task::spawn_blocking(move || plan(&board))
        .await
        .map_err(|e| SolverError::StrategyUnavailable {
            strategy,
            reason: format!("planner task failed: {e}"),
        })
}
