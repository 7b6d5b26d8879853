//! Prediction collaborators consulted by the ML proxy strategy.
//!
//! A [`Predictor`] answers one question per call: given this board, what
//! single `(action, direction)` should the robot take next? Two
//! implementations exist:
//!
//! - [`http::HttpPredictor`]: the remote prediction service (`POST /predict`,
//!   `GET /strategies`, `GET /strategies/{name}`), with a request timeout and
//!   bounded retries
//! - [`heuristic::HeuristicPredictor`]: local weighted scoring driven by the
//!   same [`StrategyConfig`] presets, used when no remote service is configured
//!
//! Both are constructed once at startup and shared as `Arc<dyn Predictor>`.

pub mod heuristic;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::BoardSnapshot;

pub use heuristic::HeuristicPredictor;
pub use http::HttpPredictor;

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub game_id: String,
    pub board: BoardSnapshot,
    /// Preset name: `default`, `aggressive` or `conservative`.
    pub strategy: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Action wire name, or `none` when the predictor sees no legal move.
    pub action: String,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub config: Option<StrategyConfig>,
}

// ── Strategy presets ────────────────────────────────────────────────

/// Named weight bundle for heuristic / ML-assisted move scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub distance_to_flower_weight: f64,
    pub distance_to_princess_weight: f64,
    pub obstacle_density_weight: f64,
    pub path_clearance_weight: f64,
    pub risk_aversion: f64,
    pub lookahead_depth: u32,
    #[serde(default)]
    pub use_ml_model: bool,
}

pub const PRESET_NAMES: [&str; 3] = ["default", "aggressive", "conservative"];

impl StrategyConfig {
    /// Balanced weights.
    pub fn balanced() -> Self {
        Self {
            name: "default".to_string(),
            distance_to_flower_weight: 1.0,
            distance_to_princess_weight: 0.8,
            obstacle_density_weight: 0.5,
            path_clearance_weight: 0.6,
            risk_aversion: 0.5,
            lookahead_depth: 3,
            use_ml_model: true,
        }
    }

    /// Chases flowers, ignores clutter.
    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            distance_to_flower_weight: 1.5,
            distance_to_princess_weight: 1.0,
            obstacle_density_weight: 0.2,
            path_clearance_weight: 0.3,
            risk_aversion: 0.2,
            lookahead_depth: 2,
            use_ml_model: true,
        }
    }

    /// Prefers open ground and avoids dead ends.
    pub fn conservative() -> Self {
        Self {
            name: "conservative".to_string(),
            distance_to_flower_weight: 0.8,
            distance_to_princess_weight: 0.6,
            obstacle_density_weight: 0.9,
            path_clearance_weight: 1.0,
            risk_aversion: 0.9,
            lookahead_depth: 4,
            use_ml_model: true,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::balanced()),
            "aggressive" => Some(Self::aggressive()),
            "conservative" => Some(Self::conservative()),
            _ => None,
        }
    }

    pub fn presets() -> Vec<Self> {
        vec![Self::balanced(), Self::aggressive(), Self::conservative()]
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictorError {
    #[error("prediction service timed out after {0} ms")]
    Timeout(u64),
    #[error("prediction service returned HTTP {0}")]
    Http(u16),
    #[error("prediction service unreachable: {0}")]
    Transport(String),
    #[error("malformed prediction: {0}")]
    Malformed(String),
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
    #[error("no legal move: {0}")]
    NoLegalMove(String),
}

// ── Trait ───────────────────────────────────────────────────────────

#[async_trait]
pub trait Predictor: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResponse, PredictorError>;

    async fn strategies(&self) -> Result<Vec<StrategyConfig>, PredictorError>;

    async fn strategy(&self, name: &str) -> Result<StrategyConfig, PredictorError>;
}
