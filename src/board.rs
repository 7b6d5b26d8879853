//! Board, robot and princess: the shared mutable state every action and
//! solver operates on.
//!
//! The board owns its entities and only exposes read-only queries publicly.
//! State changes go through [`crate::actions::apply`], which validates each
//! transition before calling the crate-private mutators below.
//!
//! ## Cell semantics
//!
//! A cell holds at most one of: robot, princess, flower, obstacle. Flowers are
//! picked from an adjacent cell and are never walked over, so a cell is
//! *walkable* only when it is in bounds and completely empty.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ActionError, BoardError};
use crate::grid::{Direction, Position};

// ── Entities ────────────────────────────────────────────────────────

/// The player piece.
///
/// Invariant: `0 <= flowers_held <= max_capacity`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Robot {
    position: Position,
    orientation: Direction,
    flowers_held: u32,
    max_capacity: u32,
    flowers_delivered: u32,
    obstacles_cleaned: Vec<Position>,
}

impl Robot {
    pub fn new(position: Position, orientation: Direction, max_capacity: u32) -> Self {
        Self {
            position,
            orientation,
            flowers_held: 0,
            max_capacity,
            flowers_delivered: 0,
            obstacles_cleaned: Vec::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn orientation(&self) -> Direction {
        self.orientation
    }

    pub fn flowers_held(&self) -> u32 {
        self.flowers_held
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn flowers_delivered(&self) -> u32 {
        self.flowers_delivered
    }

    /// Positions of cleaned obstacles, in cleaning order.
    pub fn obstacles_cleaned(&self) -> &[Position] {
        &self.obstacles_cleaned
    }

    pub fn has_capacity(&self) -> bool {
        self.flowers_held < self.max_capacity
    }

    /// The cell the robot is facing.
    pub fn ahead(&self) -> Position {
        self.position.step(self.orientation)
    }

    pub(crate) fn face(&mut self, dir: Direction) {
        self.orientation = dir;
    }

    pub(crate) fn advance(&mut self, to: Position) {
        self.position = to;
    }

    pub(crate) fn collect(&mut self) -> Result<(), ActionError> {
        if !self.has_capacity() {
            return Err(ActionError::CapacityReached {
                capacity: self.max_capacity,
            });
        }
        self.flowers_held += 1;
        Ok(())
    }

    pub(crate) fn release(&mut self) -> Result<(), ActionError> {
        if self.flowers_held == 0 {
            return Err(ActionError::NothingToDrop);
        }
        self.flowers_held -= 1;
        Ok(())
    }

    /// Hand every held flower over. Returns how many changed hands.
    pub(crate) fn hand_over(&mut self) -> Result<u32, ActionError> {
        if self.flowers_held == 0 {
            return Err(ActionError::NoFlowersHeld);
        }
        let given = self.flowers_held;
        self.flowers_held = 0;
        self.flowers_delivered += given;
        Ok(given)
    }

    pub(crate) fn record_cleaned(&mut self, pos: Position) {
        self.obstacles_cleaned.push(pos);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Princess {
    position: Position,
    flowers_received: u32,
}

impl Princess {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            flowers_received: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn flowers_received(&self) -> u32 {
        self.flowers_received
    }
}

/// Derived game status. Never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Victory,
}

// ── Board ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    robot: Robot,
    princess: Princess,
    flowers: BTreeSet<Position>,
    obstacles: BTreeSet<Position>,
    initial_flower_count: usize,
    flowers_delivered: usize,
}

impl Board {
    /// Start an explicit layout. See [`BoardBuilder`].
    pub fn builder(rows: usize, cols: usize) -> BoardBuilder {
        BoardBuilder::new(rows, cols)
    }

    /// Random layout for game creation.
    ///
    /// Robot at `(0, 0)` facing east, princess in the opposite corner, then
    /// flowers and obstacles drawn from a shuffle of the remaining cells, so
    /// the two sets are disjoint by construction. Deterministic for a given rng
    /// state.
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        max_capacity: u32,
        rng: &mut R,
    ) -> Result<Board, BoardError> {
        check_dimensions(rows, cols)?;
        let robot = Position::new(0, 0);
        let princess = Position::new(rows as i32 - 1, cols as i32 - 1);

        let mut free: Vec<Position> = (0..rows as i32)
            .flat_map(|r| (0..cols as i32).map(move |c| Position::new(r, c)))
            .filter(|&p| p != robot && p != princess)
            .collect();
        free.shuffle(rng);

        let n_flowers = flower_count_for(rows, cols).min(free.len());
        let n_obstacles = obstacle_count_for(rows, cols).min(free.len() - n_flowers);
        let flowers = free[..n_flowers].to_vec();
        let obstacles = free[n_flowers..n_flowers + n_obstacles].to_vec();

        Board::builder(rows, cols)
            .robot(robot, Direction::East)
            .princess(princess)
            .flowers(flowers)
            .obstacles(obstacles)
            .capacity(max_capacity)
            .build()
    }

    /// Rebuild a board from its wire form, including robot progress.
    pub fn from_snapshot(snap: &BoardSnapshot) -> Result<Board, BoardError> {
        let mut board = Board::builder(snap.rows, snap.cols)
            .robot(snap.robot.position, snap.robot.orientation)
            .princess(snap.princess.position)
            .flowers(snap.flowers.iter().copied())
            .obstacles(snap.obstacles.iter().copied())
            .capacity(snap.robot.max_capacity)
            .build()?;
        if snap.robot.flowers_held > snap.robot.max_capacity {
            return Err(BoardError::CapacityExceeded {
                held: snap.robot.flowers_held,
                capacity: snap.robot.max_capacity,
            });
        }
        board.robot.flowers_held = snap.robot.flowers_held;
        board.robot.flowers_delivered = snap.robot.flowers_delivered;
        board.robot.obstacles_cleaned = snap.robot.obstacles_cleaned.clone();
        board.princess.flowers_received = snap.princess.flowers_received;
        board.flowers_delivered = snap.flowers_delivered;
        board.initial_flower_count = snap.initial_flower_count;
        Ok(board)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn princess(&self) -> &Princess {
        &self.princess
    }

    pub fn flowers(&self) -> &BTreeSet<Position> {
        &self.flowers
    }

    pub fn obstacles(&self) -> &BTreeSet<Position> {
        &self.obstacles
    }

    pub fn initial_flower_count(&self) -> usize {
        self.initial_flower_count
    }

    pub fn flowers_delivered(&self) -> usize {
        self.flowers_delivered
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.rows && (pos.col as usize) < self.cols
    }

    pub fn has_obstacle(&self, pos: Position) -> bool {
        self.obstacles.contains(&pos)
    }

    pub fn has_flower(&self, pos: Position) -> bool {
        self.flowers.contains(&pos)
    }

    /// What occupies `pos`, if anything. Out-of-bounds cells report `None`.
    pub fn occupant(&self, pos: Position) -> Option<&'static str> {
        if self.princess.position == pos {
            Some("the princess")
        } else if self.robot.position == pos {
            Some("the robot")
        } else if self.obstacles.contains(&pos) {
            Some("an obstacle")
        } else if self.flowers.contains(&pos) {
            Some("a flower")
        } else {
            None
        }
    }

    /// In bounds and empty.
    #[inline]
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.occupant(pos).is_none()
    }

    pub fn adjacent_to_princess(&self, pos: Position) -> bool {
        pos.is_adjacent(self.princess.position)
    }

    /// In-bounds orthogonal neighbours of `pos`, in [`Direction::ALL`] order.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = (Direction, Position)> + '_ {
        pos.neighbors().filter(move |&(_, p)| self.in_bounds(p))
    }

    pub fn status(&self) -> GameStatus {
        if self.flowers_delivered >= self.initial_flower_count {
            GameStatus::Victory
        } else {
            GameStatus::InProgress
        }
    }

    #[inline]
    pub fn is_victory(&self) -> bool {
        self.status() == GameStatus::Victory
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            rows: self.rows,
            cols: self.cols,
            robot: RobotSnapshot {
                position: self.robot.position,
                orientation: self.robot.orientation,
                flowers_held: self.robot.flowers_held,
                max_capacity: self.robot.max_capacity,
                flowers_delivered: self.robot.flowers_delivered,
                obstacles_cleaned: self.robot.obstacles_cleaned.clone(),
            },
            princess: PrincessSnapshot {
                position: self.princess.position,
                flowers_received: self.princess.flowers_received,
            },
            flowers: self.flowers.iter().copied().collect(),
            obstacles: self.obstacles.iter().copied().collect(),
            initial_flower_count: self.initial_flower_count,
            flowers_delivered: self.flowers_delivered,
            status: self.status(),
        }
    }

    // ── Mutators (crate-private, validated by `actions`) ────────────

    pub(crate) fn robot_mut(&mut self) -> &mut Robot {
        &mut self.robot
    }

    pub(crate) fn take_flower(&mut self, pos: Position) -> bool {
        self.flowers.remove(&pos)
    }

    pub(crate) fn place_flower(&mut self, pos: Position) {
        self.flowers.insert(pos);
    }

    pub(crate) fn remove_obstacle(&mut self, pos: Position) -> bool {
        self.obstacles.remove(&pos)
    }

    pub(crate) fn record_delivery(&mut self, count: u32) {
        self.princess.flowers_received += count;
        self.flowers_delivered += count as usize;
    }
}

/// Check dimensions the way game creation does.
pub fn check_dimensions(rows: usize, cols: usize) -> Result<(), BoardError> {
    let ok = |n: usize| (MIN_BOARD_SIDE..=MAX_BOARD_SIDE).contains(&n);
    if ok(rows) && ok(cols) {
        Ok(())
    } else {
        Err(BoardError::InvalidDimensions {
            rows,
            cols,
            min: MIN_BOARD_SIDE,
            max: MAX_BOARD_SIDE,
        })
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Explicit board layout.
///
/// Unlike [`Board::generate`], any non-empty size is accepted, so hand-made
/// puzzles can be smaller than the creation minimum. Bounds and disjointness
/// are still enforced by [`BoardBuilder::build`].
#[derive(Clone, Debug)]
pub struct BoardBuilder {
    rows: usize,
    cols: usize,
    robot: Position,
    orientation: Direction,
    princess: Option<Position>,
    flowers: Vec<Position>,
    obstacles: Vec<Position>,
    max_capacity: u32,
}

impl BoardBuilder {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            robot: Position::new(0, 0),
            orientation: Direction::East,
            princess: None,
            flowers: Vec::new(),
            obstacles: Vec::new(),
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }

    pub fn robot(mut self, pos: Position, orientation: Direction) -> Self {
        self.robot = pos;
        self.orientation = orientation;
        self
    }

    /// Defaults to the bottom-right corner.
    pub fn princess(mut self, pos: Position) -> Self {
        self.princess = Some(pos);
        self
    }

    pub fn flowers(mut self, flowers: impl IntoIterator<Item = Position>) -> Self {
        self.flowers.extend(flowers);
        self
    }

    pub fn obstacles(mut self, obstacles: impl IntoIterator<Item = Position>) -> Self {
        self.obstacles.extend(obstacles);
        self
    }

    pub fn capacity(mut self, max_capacity: u32) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn build(self) -> Result<Board, BoardError> {
        if self.rows == 0 || self.cols == 0 || self.rows > MAX_BOARD_SIDE || self.cols > MAX_BOARD_SIDE {
            return Err(BoardError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
                min: 1,
                max: MAX_BOARD_SIDE,
            });
        }
        if self.max_capacity == 0 {
            return Err(BoardError::ZeroCapacity);
        }
        let princess = self
            .princess
            .unwrap_or(Position::new(self.rows as i32 - 1, self.cols as i32 - 1));

        let in_bounds = |p: Position| {
            p.row >= 0 && p.col >= 0 && (p.row as usize) < self.rows && (p.col as usize) < self.cols
        };
        let mut taken: BTreeSet<Position> = BTreeSet::new();
        let mut claim = |what: &'static str, pos: Position| -> Result<(), BoardError> {
            if !in_bounds(pos) {
                return Err(BoardError::OutOfBounds {
                    what,
                    pos,
                    rows: self.rows,
                    cols: self.cols,
                });
            }
            if !taken.insert(pos) {
                return Err(BoardError::Overlap { what, pos });
            }
            Ok(())
        };

        claim("robot", self.robot)?;
        claim("princess", princess)?;
        for &f in &self.flowers {
            claim("flower", f)?;
        }
        for &o in &self.obstacles {
            claim("obstacle", o)?;
        }

        let flowers: BTreeSet<Position> = self.flowers.into_iter().collect();
        Ok(Board {
            rows: self.rows,
            cols: self.cols,
            robot: Robot::new(self.robot, self.orientation, self.max_capacity),
            princess: Princess::new(princess),
            initial_flower_count: flowers.len(),
            flowers,
            obstacles: self.obstacles.into_iter().collect(),
            flowers_delivered: 0,
        })
    }
}

// ── Wire representation ─────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub position: Position,
    pub orientation: Direction,
    pub flowers_held: u32,
    pub max_capacity: u32,
    pub flowers_delivered: u32,
    pub obstacles_cleaned: Vec<Position>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincessSnapshot {
    pub position: Position,
    pub flowers_received: u32,
}

/// Full board state as sent to clients and to the prediction service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub robot: RobotSnapshot,
    pub princess: PrincessSnapshot,
    pub flowers: Vec<Position>,
    pub obstacles: Vec<Position>,
    pub initial_flower_count: usize,
    pub flowers_delivered: usize,
    pub status: GameStatus,
}
