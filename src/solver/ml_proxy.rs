//! ML proxy strategy: one prediction per action.
//!
//! Each step sends the scratch board to the configured [`Predictor`] and
//! applies the returned `(action, direction)` to the scratch copy. The
//! predictor's reply is untrusted: an unparseable reply makes the strategy
//! unavailable, a legal-looking reply the board rejects counts as a stall.
//!
//! Stop conditions, checked in order each step:
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | victory on the scratch board | `Ok(Victory)` |
//! | step budget reached | `Ok(StepBudget)` |
//! | predictor answers `none` / no legal move | `Ok(Stuck)` |
//! | [`MAX_CONSECUTIVE_REJECTIONS`] rejected predictions in a row | `Ok(Stuck)` |
//! | any other predictor failure | `Err(StrategyUnavailable)` |

use std::sync::Arc;

use tracing::{debug, warn};

use crate::actions::ActionKind;
use crate::board::Board;
use crate::constants::{MAX_CONSECUTIVE_REJECTIONS, ML_STEPS_PER_CELL};
use crate::grid::Direction;
use crate::predictor::{PredictionRequest, PredictionResponse, Predictor, PredictorError};

use super::{step_budget, Plan, ScratchRun, SolverError, StopReason, StrategyKind};

pub struct MlProxySolver {
    predictor: Arc<dyn Predictor>,
    strategy: String,
    pub max_steps: Option<usize>,
}

impl MlProxySolver {
    pub fn new(predictor: Arc<dyn Predictor>, strategy: impl Into<String>) -> Self {
        Self {
            predictor,
            strategy: strategy.into(),
            max_steps: None,
        }
    }

    pub async fn solve(&self, game_id: &str, board: &Board) -> Result<Plan, SolverError> {
        let budget = self
            .max_steps
            .unwrap_or_else(|| step_budget(board, ML_STEPS_PER_CELL));
        let mut run = ScratchRun::new(board);
        let mut rejections = 0;

        loop {
            if run.board().is_victory() {
                return Ok(run.finish(StopReason::Victory));
            }
            if run.len() >= budget {
                return Ok(run.finish(StopReason::StepBudget(budget)));
            }

            let req = PredictionRequest {
                game_id: game_id.to_string(),
                board: run.board().snapshot(),
                strategy: self.strategy.clone(),
            };
            let reply = match self.predictor.predict(&req).await {
                Ok(reply) => reply,
                Err(PredictorError::NoLegalMove(why)) => {
                    return Ok(run.finish(StopReason::Stuck(why)));
                }
                Err(e) => {
                    warn!(
                        game = %game_id,
                        predictor = self.predictor.name(),
                        strategy = %self.strategy,
                        error = %e,
                        "prediction failed"
                    );
                    return Err(self.unavailable(e));
                }
            };
            if reply.action.eq_ignore_ascii_case("none") {
                return Ok(run.finish(StopReason::Stuck("predictor found no move".to_string())));
            }
            let (action, direction) = parse_reply(&reply).map_err(|e| self.unavailable(e))?;

            match run.push(action, direction) {
                Ok(()) => rejections = 0,
                Err(e) => {
                    rejections += 1;
                    debug!(
                        game = %game_id,
                        %action,
                        %direction,
                        rejections,
                        "prediction rejected: {e}"
                    );
                    if rejections >= MAX_CONSECUTIVE_REJECTIONS {
                        return Ok(run.finish(StopReason::Stuck(format!(
                            "predictor stalled after {rejections} rejected actions, last: {e}"
                        ))));
                    }
                }
            }
        }
    }

    fn unavailable(&self, err: PredictorError) -> SolverError {
        SolverError::StrategyUnavailable {
            strategy: StrategyKind::Ml,
            reason: err.to_string(),
        }
    }
}

fn parse_reply(reply: &PredictionResponse) -> Result<(ActionKind, Direction), PredictorError> {
    let action: ActionKind = reply
        .action
        .parse()
        .map_err(|_| PredictorError::Malformed(format!("unknown action '{}'", reply.action)))?;
    let raw = reply
        .direction
        .as_deref()
        .ok_or_else(|| PredictorError::Malformed(format!("'{}' without a direction", reply.action)))?;
    let direction: Direction = raw
        .parse()
        .map_err(|_| PredictorError::Malformed(format!("unknown direction '{raw}'")))?;
    Ok((action, direction))
}
