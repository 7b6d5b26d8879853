//! Autoplay orchestrator: plan on a copy, replay on the live game.
//!
//! ```text
//! lock session ─► clone board ─► Solver::solve ─► replay via perform ─► summary
//! ```
//!
//! The session lock is held from the clone to the end of the replay, ML round
//! trips included, so no other action can interleave with an autoplay run.
//! Greedy and optimal planning run on tokio's blocking pool. Listing games
//! never waits on this lock.
//! Every solver failure and replay rejection ends up in the returned
//! [`AutoplayResult`]; only an unknown game id is an error.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::board::BoardSnapshot;
use crate::error::GameError;
use crate::predictor::Predictor;
use crate::repository::GameRepository;
use crate::solver::{
    GreedySolver, MlProxySolver, OptimalSolver, Plan, Solver, SolverError, StopReason, StrategyKind,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AutoplayResult {
    /// The replay ended in victory.
    pub success: bool,
    /// Actions applied successfully during replay.
    pub actions_taken: usize,
    pub board: BoardSnapshot,
    pub message: String,
    pub strategy: StrategyKind,
}

pub struct Autoplay {
    repo: Arc<GameRepository>,
    predictor: Arc<dyn Predictor>,
}

impl Autoplay {
    pub fn new(repo: Arc<GameRepository>, predictor: Arc<dyn Predictor>) -> Self {
        Self { repo, predictor }
    }

    fn solver_for(&self, strategy: StrategyKind, ml_strategy: &str) -> Solver {
        match strategy {
            StrategyKind::Greedy => Solver::Greedy(GreedySolver::new()),
            StrategyKind::Optimal => Solver::Optimal(OptimalSolver::new()),
            StrategyKind::Ml => Solver::MlProxy(MlProxySolver::new(Arc::clone(&self.predictor), ml_strategy)),
        }
    }

    pub async fn execute(
        &self,
        game_id: &str,
        strategy: StrategyKind,
        ml_strategy: &str,
    ) -> Result<AutoplayResult, GameError> {
        let session = self.repo.get(game_id).await?;
        let mut session = session.lock().await;
        let scratch = session.board().clone();

        let solver = self.solver_for(strategy, ml_strategy);
        let plan = match solver.solve(game_id, &scratch).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(game = %game_id, %strategy, error = %e, "autoplay strategy failed");
                return Ok(AutoplayResult {
                    success: false,
                    actions_taken: 0,
                    board: session.board().snapshot(),
                    message: unavailable_message(&e),
                    strategy,
                });
            }
        };
        let Plan { actions, stop } = plan;
        info!(
            game = %game_id,
            %strategy,
            planned = actions.len(),
            stop = %stop,
            "autoplay plan ready"
        );

        let mut actions_taken = 0;
        let mut rejection = None;
        for step in &actions {
            let result = session.perform(step.action, step.direction);
            if !result.success {
                rejection = Some(format!(
                    "replay stopped at action {} ({} {}): {}",
                    actions_taken + 1,
                    step.action,
                    step.direction,
                    result.message
                ));
                break;
            }
            actions_taken += 1;
        }

        let board = session.board();
        let success = board.is_victory();
        let message = match (&rejection, success) {
            (Some(why), _) => why.clone(),
            (None, true) => format!(
                "Victory: delivered {} of {} flowers in {} actions",
                board.flowers_delivered(),
                board.initial_flower_count(),
                actions_taken
            ),
            (None, false) => match &stop {
                StopReason::Victory => "Plan ended before victory".to_string(),
                other => format!(
                    "Stopped after {actions_taken} actions with {} of {} flowers delivered: {other}",
                    board.flowers_delivered(),
                    board.initial_flower_count()
                ),
            },
        };
        info!(game = %game_id, %strategy, actions_taken, success, "autoplay finished");

        Ok(AutoplayResult {
            success,
            actions_taken,
            board: board.snapshot(),
            message,
            strategy,
        })
    }
}

fn unavailable_message(err: &SolverError) -> String {
    match err {
        SolverError::StrategyUnavailable { strategy, reason } => {
            format!("Strategy '{strategy}' unavailable: {reason}")
        }
    }
}
