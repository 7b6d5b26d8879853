//! # Flowerbot: robot, flowers and a princess on a grid
//!
//! A robot on a rectangular board picks up flowers and hands them to a
//! princess. Obstacles block the way until the robot cleans them. Games are
//! served over HTTP, played one action at a time or solved by autoplay.
//!
//! ## Layers
//!
//! | Layer | Module | Description |
//! |-------|--------|-------------|
//! | Values | [`grid`] | `Position`, `Direction` |
//! | State | [`board`] | Robot, princess, flower and obstacle sets, random generation |
//! | Rules | [`actions`] | The six validated transitions |
//! | Game | [`session`] | Board plus append-only history |
//! | Search | [`pathfinding`] | BFS and A* on the 4-connected grid |
//! | Strategies | [`solver`] | Greedy, optimal (A* + lookahead), ML proxy |
//! | Collaborators | [`predictor`], [`collector`] | Remote prediction service, local heuristic predictor, gameplay sink |
//! | Orchestration | [`autoplay`] | Plan on a copy, replay on the live game |
//! | Storage | [`repository`] | In-memory games, one lock per game |
//! | Surface | [`server`], [`env_config`] | axum router, environment settings |
//!
//! ## Autoplay
//!
//! Strategies never mutate a live game. They plan against a clone, validating
//! every action on it, and the orchestrator replays the resulting list through
//! [`session::GameSession::perform`] so that each step lands in the history.
//! Running out of moves is a [`solver::StopReason`]; only an unreachable
//! prediction service is a [`solver::SolverError`].

pub mod actions;
pub mod autoplay;
pub mod board;
pub mod collector;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod predictor;
pub mod repository;
pub mod server;
pub mod session;
pub mod solver;
