//! Property-based tests for board invariants under arbitrary play.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use flowerbot::actions::{apply, ActionKind};
use flowerbot::board::Board;
use flowerbot::grid::{Direction, Position};
use flowerbot::session::GameSession;

/// Strategy: any of the six actions.
fn action_strategy() -> impl Strategy<Value = ActionKind> {
    prop::sample::select(ActionKind::ALL.to_vec())
}

/// Strategy: any of the four directions.
fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

/// Strategy: a random sequence of (action, direction) pairs.
fn moves_strategy() -> impl Strategy<Value = Vec<(ActionKind, Direction)>> {
    prop::collection::vec((action_strategy(), direction_strategy()), 0..200)
}

fn generated(rows: usize, cols: usize, seed: u64, capacity: u32) -> Board {
    Board::generate(rows, cols, capacity, &mut StdRng::seed_from_u64(seed)).unwrap()
}

fn in_bounds(board: &Board, p: Position) -> bool {
    p.row >= 0 && p.col >= 0 && (p.row as usize) < board.rows() && (p.col as usize) < board.cols()
}

proptest! {
    // 1. Entity sets stay disjoint and in bounds whatever is played
    #[test]
    fn invariants_hold_under_random_play(
        rows in 3..12usize,
        cols in 3..12usize,
        seed in any::<u64>(),
        moves in moves_strategy(),
    ) {
        let mut board = generated(rows, cols, seed, 3);
        for (action, direction) in moves {
            let _ = apply(&mut board, action, direction);
            let robot = board.robot().position();
            let princess = board.princess().position();
            prop_assert!(board.flowers().is_disjoint(board.obstacles()));
            prop_assert!(in_bounds(&board, robot));
            prop_assert!(in_bounds(&board, princess));
            prop_assert!(!board.flowers().contains(&robot) && !board.obstacles().contains(&robot));
            prop_assert!(!board.flowers().contains(&princess) && !board.obstacles().contains(&princess));
            prop_assert!(board.robot().flowers_held() <= board.robot().max_capacity());
        }
    }

    // 2. Flowers are conserved: on the board + held + delivered = initial
    #[test]
    fn flowers_are_conserved(seed in any::<u64>(), moves in moves_strategy()) {
        let mut board = generated(6, 6, seed, 2);
        let initial = board.initial_flower_count();
        for (action, direction) in moves {
            let _ = apply(&mut board, action, direction);
            let held = board.robot().flowers_held() as usize;
            prop_assert_eq!(board.flowers().len() + held + board.flowers_delivered(), initial);
        }
    }

    // 3. A rejected action changes nothing but the orientation
    #[test]
    fn rejection_only_turns_the_robot(seed in any::<u64>(), moves in moves_strategy()) {
        let mut board = generated(5, 5, seed, 12);
        for (action, direction) in moves {
            let before = board.clone();
            if apply(&mut board, action, direction).is_err() {
                prop_assert_eq!(board.robot().orientation(), direction);
                prop_assert_eq!(board.robot().position(), before.robot().position());
                prop_assert_eq!(board.robot().flowers_held(), before.robot().flowers_held());
                prop_assert_eq!(board.flowers(), before.flowers());
                prop_assert_eq!(board.obstacles(), before.obstacles());
            }
        }
    }

    // 4. History records every attempt, in order
    #[test]
    fn history_records_every_attempt(seed in any::<u64>(), moves in moves_strategy()) {
        let mut session = GameSession::new("prop", generated(4, 4, seed, 12));
        for &(action, direction) in &moves {
            session.perform(action, direction);
        }
        prop_assert_eq!(session.history().len(), moves.len());
        for (record, &(action, direction)) in session.history().iter().zip(&moves) {
            prop_assert_eq!(record.action, action);
            prop_assert_eq!(record.direction, direction);
        }
    }

    // 5. Picking at capacity never changes the load
    #[test]
    fn pick_beyond_capacity_is_rejected(direction in direction_strategy()) {
        let around = Position::new(1, 1);
        let flowers: Vec<Position> = Direction::ALL.iter().map(|&d| around.step(d)).collect();
        let mut board = Board::builder(3, 3)
            .robot(around, Direction::North)
            .princess(Position::new(2, 2))
            .flowers(flowers)
            .capacity(1)
            .build()
            .unwrap();
        apply(&mut board, ActionKind::Pick, Direction::North).unwrap();
        if direction != Direction::North {
            prop_assert!(apply(&mut board, ActionKind::Pick, direction).is_err());
            prop_assert_eq!(board.robot().flowers_held(), 1);
            prop_assert!(board.has_flower(around.step(direction)));
        }
    }
}
