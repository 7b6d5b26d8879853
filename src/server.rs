//! Axum HTTP server: game lifecycle, manual actions and autoplay.
//!
//! Game state lives in the shared [`GameRepository`]; everything a handler
//! needs is reached through [`AppState`], built once by the binary.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/games` | Create a random game (`rows`, `cols`, optional `seed`) |
//! | GET | `/api/games` | List games |
//! | GET | `/api/games/{id}` | Current board |
//! | POST | `/api/games/{id}/action` | Apply one action |
//! | POST | `/api/games/{id}/autoplay` | Solve with `?strategy=greedy\|optimal\|ml&ml_strategy=...` |
//! | GET | `/api/games/{id}/history` | Every attempted action, in order |
//! | GET | `/api/ml/strategies` | Strategy presets of the configured predictor |
//! | GET | `/api/ml/strategies/{name}` | One preset |
//!
//! Malformed bodies and query strings are answered with 422 and an
//! `{"error": ...}` body. A rejected action is not an HTTP error: it comes
//! back as 200 with `success: false`.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::actions::ActionKind;
use crate::autoplay::{Autoplay, AutoplayResult};
use crate::collector::{self, GameplayCollector, GameplaySample, NoopCollector};
use crate::constants::DEFAULT_MAX_CAPACITY;
use crate::error::GameError;
use crate::grid::Direction;
use crate::predictor::{HeuristicPredictor, Predictor, PredictorError, StrategyConfig};
use crate::repository::GameRepository;
use crate::solver::StrategyKind;

/// Shared handler state.
pub struct AppContext {
    pub repo: Arc<GameRepository>,
    pub autoplay: Autoplay,
    pub predictor: Arc<dyn Predictor>,
    pub collector: Arc<dyn GameplayCollector>,
    /// Robot capacity for newly created games.
    pub max_capacity: u32,
}

pub type AppState = Arc<AppContext>;

impl AppContext {
    pub fn new(
        repo: Arc<GameRepository>,
        predictor: Arc<dyn Predictor>,
        collector: Arc<dyn GameplayCollector>,
        max_capacity: u32,
    ) -> Self {
        let autoplay = Autoplay::new(Arc::clone(&repo), Arc::clone(&predictor));
        Self {
            repo,
            autoplay,
            predictor,
            collector,
            max_capacity,
        }
    }

    /// Local predictor, no collector, default capacity.
    pub fn local() -> Self {
        Self::new(
            Arc::new(GameRepository::new()),
            Arc::new(HeuristicPredictor::new()),
            Arc::new(NoopCollector),
            DEFAULT_MAX_CAPACITY,
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/api/games", post(handle_create_game).get(handle_list_games))
        .route("/api/games/{id}", get(handle_get_game))
        .route("/api/games/{id}/action", post(handle_action))
        .route("/api/games/{id}/autoplay", post(handle_autoplay))
        .route("/api/games/{id}/history", get(handle_history))
        .route("/api/ml/strategies", get(handle_list_strategies))
        .route("/api/ml/strategies/{name}", get(handle_get_strategy))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ── Request/Response types ──────────────────────────────────────────

#[derive(Deserialize)]
struct CreateGameRequest {
    rows: usize,
    cols: usize,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct ActionRequest {
    action: ActionKind,
    direction: Direction,
}

#[derive(Deserialize)]
struct AutoplayQuery {
    #[serde(default)]
    strategy: StrategyKind,
    #[serde(default = "default_ml_strategy")]
    ml_strategy: String,
}

fn default_ml_strategy() -> String {
    "default".to_string()
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(status: StatusCode, msg: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg })))
}

fn game_error(err: GameError) -> ApiError {
    let status = match err {
        GameError::NotFound(_) => StatusCode::NOT_FOUND,
        GameError::InvalidInput(_) | GameError::Board(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, &err.to_string())
}

fn predictor_error(err: PredictorError) -> ApiError {
    let status = match err {
        PredictorError::UnknownStrategy(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    error_response(status, &err.to_string())
}

fn invalid_input(msg: String) -> ApiError {
    game_error(GameError::InvalidInput(msg))
}

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_list_games(State(state): State<AppState>) -> Json<serde_json::Value> {
    let games = state.repo.list().await;
    Json(serde_json::json!({ "games": games }))
}

async fn handle_get_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.repo.get(&id).await.map_err(game_error)?;
    let session = session.lock().await;
    Ok(Json(serde_json::json!({
        "game_id": session.id(),
        "board": session.board().snapshot(),
    })))
}

async fn handle_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.repo.get(&id).await.map_err(game_error)?;
    let session = session.lock().await;
    Ok(Json(serde_json::json!({
        "game_id": session.id(),
        "actions": session.history(),
    })))
}

async fn handle_list_strategies(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let strategies = state.predictor.strategies().await.map_err(predictor_error)?;
    Ok(Json(serde_json::json!({ "strategies": strategies })))
}

async fn handle_get_strategy(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StrategyConfig>, ApiError> {
    let config = state.predictor.strategy(&name).await.map_err(predictor_error)?;
    Ok(Json(config))
}

// ── POST handlers ───────────────────────────────────────────────────

async fn handle_create_game(
    State(state): State<AppState>,
    payload: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(|e| invalid_input(e.body_text()))?;
    let created = state
        .repo
        .create(req.rows, req.cols, req.seed, state.max_capacity)
        .await
        .map_err(game_error)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "game_id": created.game_id,
            "seed": created.seed,
            "board": created.board,
        })),
    ))
}

async fn handle_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state.repo.get(&id).await.map_err(game_error)?;
    let Json(req) = payload.map_err(|e| invalid_input(e.body_text()))?;

    let mut session = session.lock().await;
    let state_before = session.board().snapshot();
    let result = session.perform(req.action, req.direction);
    collector::submit(
        &state.collector,
        GameplaySample {
            game_id: id,
            state_before,
            action: req.action,
            direction: req.direction,
            success: result.success,
            message: result.message.clone(),
        },
    );

    Ok(Json(serde_json::json!({
        "success": result.success,
        "board": session.board().snapshot(),
        "message": result.message,
    })))
}

async fn handle_autoplay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<AutoplayQuery>, QueryRejection>,
) -> Result<Json<AutoplayResult>, ApiError> {
    let Query(q) = query.map_err(|e| invalid_input(e.body_text()))?;
    let result = state
        .autoplay
        .execute(&id, q.strategy, &q.ml_strategy)
        .await
        .map_err(game_error)?;
    Ok(Json(result))
}
