//! Local predictor: weighted move scoring with the [`StrategyConfig`] presets.
//!
//! Priority cascade (first match wins):
//! 1. Princess adjacent and flowers held → give
//! 2. Flower adjacent and capacity left → pick (row-major first)
//! 3. Moves that shorten the BFS distance to the current goal (flowers while
//!    there is room, else the princess) → the best-scoring one, where
//!
//!    `score = -(w_flower·d_flower·(1-fill) + w_princess·d_princess·fill)
//!             - w_obstacle·density + w_clear·clearance - risk·dead_end`
//!
//!    `fill` is the share of capacity in use, `density` the obstacle share of
//!    the 8 surrounding cells, `clearance` the empty share of the 4
//!    neighbours, `dead_end` 1 when at most one neighbour is empty
//! 4. No open route → step toward / clean the first obstacle of the shortest
//!    obstacle-crossing route
//! 5. Nothing at all → [`PredictorError::NoLegalMove`]
//!
//! Restricting step 3 to distance-reducing moves keeps the robot from
//! oscillating; the weights only choose between equally short routes.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::actions::ActionKind;
use crate::board::Board;
use crate::grid::{Direction, Position};
use crate::pathfinding::{
    approach_cells, bfs_nearest, distance_map, first_obstacle, flower_approach_cells, Terrain,
};

use super::{PredictionRequest, PredictionResponse, Predictor, PredictorError, StrategyConfig};

#[derive(Clone, Debug, Default)]
pub struct HeuristicPredictor;

impl HeuristicPredictor {
    pub fn new() -> Self {
        Self
    }

    /// Pick the next action for `board` under `config`.
    pub fn choose(
        &self,
        board: &Board,
        config: &StrategyConfig,
    ) -> Result<(ActionKind, Direction, f64), PredictorError> {
        let robot = board.robot();
        let here = robot.position();
        let princess = board.princess().position();

        if robot.flowers_held() > 0 && board.adjacent_to_princess(here) {
            if let Some(d) = Direction::between(here, princess) {
                return Ok((ActionKind::Give, d, 1.0));
            }
        }
        if robot.has_capacity() {
            let next = board.flowers().iter().find(|f| here.is_adjacent(**f));
            if let Some(d) = next.and_then(|&f| Direction::between(here, f)) {
                return Ok((ActionKind::Pick, d, 1.0));
            }
        }

        let want_flowers = robot.has_capacity() && !board.flowers().is_empty();
        let flower_goals = if want_flowers {
            flower_approach_cells(board, Terrain::Open)
        } else {
            BTreeSet::new()
        };
        let princess_goals = approach_cells(board, princess, Terrain::Open);

        let here_flower = goal_distance(board, here, &flower_goals);
        let here_princess = goal_distance(board, here, &princess_goals);
        // Primary goal: flowers while there is room and one is reachable.
        let chase_flowers = want_flowers && here_flower.is_some();
        let primary = if chase_flowers { here_flower } else { here_princess };

        if let Some(primary_dist) = primary.filter(|_| chase_flowers || robot.flowers_held() > 0) {
            let fill = if chase_flowers {
                robot.flowers_held() as f64 / robot.max_capacity() as f64
            } else {
                1.0
            };
            let unreachable = (board.rows() * board.cols()) as f64;

            let mut scored: Vec<(f64, Direction)> = Vec::new();
            for (dir, p) in board.neighbors(here) {
                if !board.is_walkable(p) {
                    continue;
                }
                let d_flower = goal_distance(board, p, &flower_goals);
                let d_princess = goal_distance(board, p, &princess_goals);
                let d_primary = if chase_flowers { d_flower } else { d_princess };
                if d_primary.map_or(true, |d| d >= primary_dist) {
                    continue;
                }
                let df = d_flower.map_or(unreachable, |d| d as f64);
                let dp = d_princess.map_or(unreachable, |d| d as f64);
                let (density, clearance, dead_end) = surroundings(board, p);
                let score = -(config.distance_to_flower_weight * df * (1.0 - fill)
                    + config.distance_to_princess_weight * dp * fill)
                    - config.obstacle_density_weight * density
                    + config.path_clearance_weight * clearance
                    - config.risk_aversion * dead_end;
                scored.push((score, dir));
            }

            // Strict `>` keeps Direction::ALL order on equal scores.
            let mut best: Option<(f64, Direction)> = None;
            for &(score, dir) in &scored {
                if best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, dir));
                }
            }
            if let Some((score, dir)) = best {
                let runner_up = scored
                    .iter()
                    .filter(|&&(_, d)| d != dir)
                    .map(|&(s, _)| s)
                    .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))));
                let confidence = match runner_up {
                    None => 1.0,
                    Some(r) => {
                        let gap = score - r;
                        (gap / (1.0 + gap)).clamp(0.05, 1.0)
                    }
                };
                return Ok((ActionKind::Move, dir, confidence));
            }
        }

        // Walled in: head for the nearest obstacle standing in the way.
        let mut blocked_goals: Vec<BTreeSet<Position>> = Vec::with_capacity(2);
        if want_flowers {
            blocked_goals.push(flower_approach_cells(board, Terrain::ThroughObstacles));
        }
        if robot.flowers_held() > 0 {
            blocked_goals.push(approach_cells(board, princess, Terrain::ThroughObstacles));
        }
        for goals in blocked_goals {
            let Some(path) = bfs_nearest(board, here, &goals, Terrain::ThroughObstacles) else {
                continue;
            };
            let (Some(&next), Some(idx)) = (path.first(), first_obstacle(board, &path)) else {
                continue;
            };
            if let Some(dir) = Direction::between(here, next) {
                let action = if idx == 0 { ActionKind::Clean } else { ActionKind::Move };
                return Ok((action, dir, 0.5));
            }
        }

        Err(PredictorError::NoLegalMove(format!("nothing reachable from {here}")))
    }
}

/// BFS distance from `from` to the nearest of `goals`.
fn goal_distance(board: &Board, from: Position, goals: &BTreeSet<Position>) -> Option<usize> {
    if goals.is_empty() {
        return None;
    }
    if goals.contains(&from) {
        return Some(0);
    }
    let dist = distance_map(board, from, Terrain::Open);
    goals
        .iter()
        .filter_map(|g| dist[g.row as usize * board.cols() + g.col as usize])
        .min()
}

/// `(obstacle density of the 8-neighbourhood, empty share of the 4
/// neighbours, dead-end flag)` around `p`.
fn surroundings(board: &Board, p: Position) -> (f64, f64, f64) {
    let mut obstacles = 0;
    for dr in -1..=1 {
        for dc in -1..=1 {
            if (dr, dc) != (0, 0) && board.has_obstacle(Position::new(p.row + dr, p.col + dc)) {
                obstacles += 1;
            }
        }
    }
    let open = p
        .neighbors()
        .filter(|&(_, n)| board.is_walkable(n) || n == board.robot().position())
        .count();
    let dead_end = if open <= 1 { 1.0 } else { 0.0 };
    (obstacles as f64 / 8.0, open as f64 / 4.0, dead_end)
}

#[async_trait]
impl Predictor for HeuristicPredictor {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResponse, PredictorError> {
        let config = StrategyConfig::preset(&req.strategy)
            .ok_or_else(|| PredictorError::UnknownStrategy(req.strategy.clone()))?;
        let board = Board::from_snapshot(&req.board)
            .map_err(|e| PredictorError::Malformed(e.to_string()))?;
        let (action, direction, confidence) = self.choose(&board, &config)?;
        Ok(PredictionResponse {
            action: action.as_str().to_string(),
            direction: Some(direction.as_str().to_string()),
            confidence,
            strategy: config.name.clone(),
            config: Some(config),
        })
    }

    async fn strategies(&self) -> Result<Vec<StrategyConfig>, PredictorError> {
        Ok(StrategyConfig::presets())
    }

    async fn strategy(&self, name: &str) -> Result<StrategyConfig, PredictorError> {
        StrategyConfig::preset(name).ok_or_else(|| PredictorError::UnknownStrategy(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::apply;

    fn drive(board: &Board, config: &StrategyConfig, limit: usize) -> Board {
        let p = HeuristicPredictor::new();
        let mut b = board.clone();
        for _ in 0..limit {
            if b.is_victory() {
                break;
            }
            let (action, dir, _) = p.choose(&b, config).unwrap();
            apply(&mut b, action, dir).unwrap();
        }
        b
    }

    #[test]
    fn test_every_preset_solves_open_board() {
        let flowers = [(0, 3), (3, 0), (2, 2)].map(|(r, c)| Position::new(r, c));
        let board = Board::builder(5, 5)
            .flowers(flowers)
            .obstacles([Position::new(1, 1)])
            .build()
            .unwrap();
        for config in StrategyConfig::presets() {
            let end = drive(&board, &config, 200);
            assert!(end.is_victory(), "preset {} failed", config.name);
        }
    }

    #[test]
    fn test_cleans_when_walled_in() {
        let board = Board::builder(4, 4)
            .robot(Position::new(0, 0), Direction::East)
            .princess(Position::new(3, 3))
            .flowers([Position::new(3, 0)])
            .obstacles([Position::new(0, 1), Position::new(1, 0)])
            .build()
            .unwrap();
        let (action, _, _) = HeuristicPredictor::new()
            .choose(&board, &StrategyConfig::balanced())
            .unwrap();
        assert_eq!(action, ActionKind::Clean);
    }

    #[test]
    fn test_no_legal_move_reported() {
        let board = Board::builder(1, 3)
            .robot(Position::new(0, 0), Direction::East)
            .princess(Position::new(0, 1))
            .flowers([Position::new(0, 2)])
            .build()
            .unwrap();
        let err = HeuristicPredictor::new()
            .choose(&board, &StrategyConfig::balanced())
            .unwrap_err();
        assert!(matches!(err, PredictorError::NoLegalMove(_)));
    }

    #[tokio::test]
    async fn test_unknown_preset_rejected() {
        let board = Board::builder(3, 3).flowers([Position::new(1, 1)]).build().unwrap();
        let req = PredictionRequest {
            game_id: "g".into(),
            board: board.snapshot(),
            strategy: "reckless".into(),
        };
        let err = HeuristicPredictor::new().predict(&req).await.unwrap_err();
        assert_eq!(err, PredictorError::UnknownStrategy("reckless".into()));
    }
}
