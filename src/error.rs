//! Error taxonomy shared by the board, the action services and the HTTP layer.
//!
//! | Type | Raised by | Surfaces as |
//! |------|-----------|-------------|
//! | [`BoardError`] | layout construction / generation | 422 at game creation |
//! | [`ActionError`] | [`crate::actions::apply`] | `success=false` + message, recorded in history |
//! | [`GameError`] | repository, autoplay lookup | 404 / 422 |
//!
//! Solver and predictor failures live next to their modules
//! ([`crate::solver::SolverError`], [`crate::predictor::PredictorError`]).

use thiserror::Error;

use crate::grid::{Direction, Position};

/// Invalid board layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board dimensions {rows}x{cols} out of range (each side must be in [{min}, {max}])")]
    InvalidDimensions {
        rows: usize,
        cols: usize,
        min: usize,
        max: usize,
    },
    #[error("{what} at {pos} is outside the {rows}x{cols} board")]
    OutOfBounds {
        what: &'static str,
        pos: Position,
        rows: usize,
        cols: usize,
    },
    #[error("{what} at {pos} overlaps another entity")]
    Overlap { what: &'static str, pos: Position },
    #[error("robot holds {held} flowers but can carry only {capacity}")]
    CapacityExceeded { held: u32, capacity: u32 },
    #[error("robot capacity must be at least 1")]
    ZeroCapacity,
}

/// Precondition failure of an action. The robot has already turned to face
/// `direction` when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("cannot move {direction}: {target} is outside the board")]
    OutOfBounds {
        direction: Direction,
        target: Position,
    },
    #[error("cannot move {direction}: {target} is occupied by {occupant}")]
    CellBlocked {
        direction: Direction,
        target: Position,
        occupant: &'static str,
    },
    #[error("no flower to pick {direction} of the robot")]
    NoFlowerAhead { direction: Direction },
    #[error("robot already holds the maximum of {capacity} flowers")]
    CapacityReached { capacity: u32 },
    #[error("robot holds no flower to drop")]
    NothingToDrop,
    #[error("cannot drop a flower {direction}: {target} is not an empty cell")]
    DropBlocked {
        direction: Direction,
        target: Position,
    },
    #[error("the princess is not {direction} of the robot")]
    PrincessNotAdjacent { direction: Direction },
    #[error("robot holds no flowers to give")]
    NoFlowersHeld,
    #[error("no obstacle to clean {direction} of the robot")]
    NoObstacleAhead { direction: Direction },
}

/// Errors reported by game lookup and creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game '{0}' does not exist")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Board(#[from] BoardError),
}
