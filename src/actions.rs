//! Action services: the six validated state transitions.
//!
//! Every action takes a target direction and follows the same three steps:
//!
//! 1. turn the robot to face the direction (always succeeds, kept even when
//!    step 2 fails)
//! 2. validate the precondition against the cell immediately ahead
//! 3. mutate and return a message, or return the [`ActionError`] explaining
//!    the rejection
//!
//! | Action | Precondition on the cell ahead | Effect |
//! |--------|-------------------------------|--------|
//! | `rotate` | none | orientation only |
//! | `move` | in bounds and empty | robot advances one cell |
//! | `pickFlower` | holds a flower, robot below capacity | flower moves into the robot |
//! | `dropFlower` | empty cell, robot holds >= 1 | one flower placed ahead |
//! | `giveFlower` | princess, robot holds >= 1 | all held flowers delivered |
//! | `clean` | obstacle | obstacle removed |
//!
//! Recording into the history log is the caller's job, see
//! [`crate::session::GameSession::perform`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::ActionError;
use crate::grid::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "rotate")]
    Rotate,
    #[serde(rename = "move")]
    Move,
    #[serde(rename = "pickFlower", alias = "pick")]
    Pick,
    #[serde(rename = "dropFlower", alias = "drop")]
    Drop,
    #[serde(rename = "giveFlower", alias = "give")]
    Give,
    #[serde(rename = "clean")]
    Clean,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Rotate,
        ActionKind::Move,
        ActionKind::Pick,
        ActionKind::Drop,
        ActionKind::Give,
        ActionKind::Clean,
    ];

    /// Wire name, as accepted by the action endpoint.
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Rotate => "rotate",
            ActionKind::Move => "move",
            ActionKind::Pick => "pickFlower",
            ActionKind::Drop => "dropFlower",
            ActionKind::Give => "giveFlower",
            ActionKind::Clean => "clean",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct ParseActionError(pub String);

impl FromStr for ActionKind {
    type Err = ParseActionError;

    /// Accepts the wire names plus the short forms `pick`, `drop`, `give`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rotate" => Ok(ActionKind::Rotate),
            "move" => Ok(ActionKind::Move),
            "pickFlower" | "pick" => Ok(ActionKind::Pick),
            "dropFlower" | "drop" => Ok(ActionKind::Drop),
            "giveFlower" | "give" => Ok(ActionKind::Give),
            "clean" => Ok(ActionKind::Clean),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

/// Apply one action to `board`.
///
/// On `Err` the only change is the robot's orientation.
pub fn apply(board: &mut Board, action: ActionKind, direction: Direction) -> Result<String, ActionError> {
    board.robot_mut().face(direction);
    let ahead = board.robot().ahead();

    match action {
        ActionKind::Rotate => Ok(format!("Robot now facing {direction}")),
        ActionKind::Move => {
            if !board.in_bounds(ahead) {
                return Err(ActionError::OutOfBounds {
                    direction,
                    target: ahead,
                });
            }
            if let Some(occupant) = board.occupant(ahead) {
                return Err(ActionError::CellBlocked {
                    direction,
                    target: ahead,
                    occupant,
                });
            }
            board.robot_mut().advance(ahead);
            Ok(format!("Robot moved {direction} to {ahead}"))
        }
        ActionKind::Pick => {
            if !board.has_flower(ahead) {
                return Err(ActionError::NoFlowerAhead { direction });
            }
            board.robot_mut().collect()?;
            board.take_flower(ahead);
            Ok(format!(
                "Picked flower at {ahead} ({} held)",
                board.robot().flowers_held()
            ))
        }
        ActionKind::Drop => {
            if board.robot().flowers_held() == 0 {
                return Err(ActionError::NothingToDrop);
            }
            if !board.is_walkable(ahead) {
                return Err(ActionError::DropBlocked {
                    direction,
                    target: ahead,
                });
            }
            board.robot_mut().release()?;
            board.place_flower(ahead);
            Ok(format!("Dropped flower at {ahead}"))
        }
        ActionKind::Give => {
            if board.princess().position() != ahead {
                return Err(ActionError::PrincessNotAdjacent { direction });
            }
            let given = board.robot_mut().hand_over()?;
            board.record_delivery(given);
            Ok(format!(
                "Gave {given} flower(s) to the princess ({}/{} delivered)",
                board.flowers_delivered(),
                board.initial_flower_count()
            ))
        }
        ActionKind::Clean => {
            if !board.remove_obstacle(ahead) {
                return Err(ActionError::NoObstacleAhead { direction });
            }
            board.robot_mut().record_cleaned(ahead);
            Ok(format!("Cleaned obstacle at {ahead}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GameStatus;
    use crate::grid::Position;

    fn corridor() -> Board {
        // R F . P   (row 0), obstacle below the robot
        Board::builder(3, 4)
            .robot(Position::new(0, 0), Direction::East)
            .princess(Position::new(0, 3))
            .flowers([Position::new(0, 1)])
            .obstacles([Position::new(1, 0)])
            .build()
            .unwrap()
    }

    #[test]
    fn test_move_into_flower_is_blocked() {
        let mut b = corridor();
        let err = apply(&mut b, ActionKind::Move, Direction::East).unwrap_err();
        assert!(matches!(err, ActionError::CellBlocked { occupant: "a flower", .. }));
        assert_eq!(b.robot().position(), Position::new(0, 0));
    }

    #[test]
    fn test_move_off_board_rotates_anyway() {
        let mut b = corridor();
        let err = apply(&mut b, ActionKind::Move, Direction::North).unwrap_err();
        assert!(matches!(err, ActionError::OutOfBounds { .. }));
        assert_eq!(b.robot().orientation(), Direction::North);
    }

    #[test]
    fn test_full_delivery_sequence() {
        let mut b = corridor();
        apply(&mut b, ActionKind::Pick, Direction::East).unwrap();
        assert_eq!(b.robot().flowers_held(), 1);
        assert!(b.flowers().is_empty());
        apply(&mut b, ActionKind::Move, Direction::East).unwrap();
        apply(&mut b, ActionKind::Move, Direction::East).unwrap();
        assert_eq!(b.robot().position(), Position::new(0, 2));
        apply(&mut b, ActionKind::Give, Direction::East).unwrap();
        assert_eq!(b.robot().flowers_held(), 0);
        assert_eq!(b.princess().flowers_received(), 1);
        assert_eq!(b.status(), GameStatus::Victory);
    }

    #[test]
    fn test_give_requires_princess_ahead_and_flowers() {
        let mut b = corridor();
        assert_eq!(
            apply(&mut b, ActionKind::Give, Direction::East),
            Err(ActionError::PrincessNotAdjacent {
                direction: Direction::East
            })
        );
        let mut b = Board::builder(3, 3)
            .robot(Position::new(0, 0), Direction::East)
            .princess(Position::new(0, 1))
            .build()
            .unwrap();
        assert_eq!(
            apply(&mut b, ActionKind::Give, Direction::East),
            Err(ActionError::NoFlowersHeld)
        );
    }

    #[test]
    fn test_drop_then_pick_back() {
        let mut b = corridor();
        apply(&mut b, ActionKind::Pick, Direction::East).unwrap();
        assert_eq!(
            apply(&mut b, ActionKind::Drop, Direction::South),
            Err(ActionError::DropBlocked {
                direction: Direction::South,
                target: Position::new(1, 0)
            })
        );
        apply(&mut b, ActionKind::Drop, Direction::East).unwrap();
        assert!(b.has_flower(Position::new(0, 1)));
        assert_eq!(b.robot().flowers_held(), 0);
        assert_eq!(
            apply(&mut b, ActionKind::Drop, Direction::East),
            Err(ActionError::NothingToDrop)
        );
        apply(&mut b, ActionKind::Pick, Direction::East).unwrap();
        assert_eq!(b.initial_flower_count(), 1);
    }

    #[test]
    fn test_clean_removes_obstacle_and_records_it() {
        let mut b = corridor();
        assert!(apply(&mut b, ActionKind::Clean, Direction::East).is_err());
        apply(&mut b, ActionKind::Clean, Direction::South).unwrap();
        assert!(b.obstacles().is_empty());
        assert_eq!(b.robot().obstacles_cleaned(), &[Position::new(1, 0)]);
    }

    #[test]
    fn test_pick_at_capacity_leaves_state_unchanged() {
        let mut b = Board::builder(3, 3)
            .robot(Position::new(1, 1), Direction::North)
            .princess(Position::new(2, 2))
            .flowers([Position::new(0, 1), Position::new(1, 0)])
            .capacity(1)
            .build()
            .unwrap();
        apply(&mut b, ActionKind::Pick, Direction::North).unwrap();
        let before = b.clone();
        let err = apply(&mut b, ActionKind::Pick, Direction::West).unwrap_err();
        assert_eq!(err, ActionError::CapacityReached { capacity: 1 });
        assert_eq!(b.robot().flowers_held(), 1);
        assert_eq!(b.flowers(), before.flowers());
    }

    #[test]
    fn test_action_wire_names() {
        for kind in ActionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<ActionKind>(), Ok(kind));
        }
        let short: ActionKind = serde_json::from_str("\"give\"").unwrap();
        assert_eq!(short, ActionKind::Give);
    }
}
