//! One game: the authoritative board plus its append-only action history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actions::{self, ActionKind};
use crate::board::Board;
use crate::grid::{Direction, Position};

/// An attempted action, successful or not. Never modified once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: ActionKind,
    pub direction: Direction,
    pub success: bool,
    pub message: String,
    /// Robot position after the attempt.
    pub robot_position: Position,
}

/// Outcome of [`GameSession::perform`]. A rejection is data, not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

pub struct GameSession {
    id: String,
    board: Board,
    history: Vec<ActionRecord>,
    won: Arc<AtomicBool>,
}

impl GameSession {
    pub fn new(id: impl Into<String>, board: Board) -> Self {
        let won = Arc::new(AtomicBool::new(board.is_victory()));
        Self {
            id: id.into(),
            board,
            history: Vec::new(),
            won,
        }
    }

    /// Victory flag readable without locking the session. Victory is final,
    /// so the flag only ever goes from `false` to `true`.
    pub fn victory_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.won)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    /// Run one action against the board and log the attempt.
    pub fn perform(&mut self, action: ActionKind, direction: Direction) -> ActionResult {
        let (success, message) = match actions::apply(&mut self.board, action, direction) {
            Ok(msg) => (true, msg),
            Err(e) => (false, e.to_string()),
        };
        debug!(
            game = %self.id,
            %action,
            %direction,
            success,
            "{message}"
        );
        self.history.push(ActionRecord {
            action,
            direction,
            success,
            message: message.clone(),
            robot_position: self.board.robot().position(),
        });
        if success && self.board.is_victory() {
            self.won.store(true, Ordering::Release);
        }
        ActionResult { success, message }
    }
}
