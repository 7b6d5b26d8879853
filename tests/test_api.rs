//! Integration tests for the HTTP API endpoints.
//!
//! Uses axum's oneshot pattern (via tower::ServiceExt), so no TCP binding is needed.
//! Each test builds its own state, so games never leak between tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use flowerbot::board::Board;
use flowerbot::grid::{Direction, Position};
use flowerbot::server::{create_router, AppContext, AppState};

fn state() -> AppState {
    Arc::new(AppContext::local())
}

/// Parse response body as JSON.
async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    (status, body_json(resp.into_body()).await)
}

/// Robot (0,0) facing east, obstacle east of it, flower south of it.
async fn seeded_game(state: &AppState) -> String {
    let board = Board::builder(4, 4)
        .robot(Position::new(0, 0), Direction::East)
        .princess(Position::new(3, 3))
        .flowers([Position::new(1, 0)])
        .obstacles([Position::new(0, 1)])
        .build()
        .unwrap();
    state.repo.insert(board).await
}

// ── GET /health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200() {
    let app = create_router(state());
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["status"], "OK");
}

// ── POST /api/games ──────────────────────────────────────────────────

#[tokio::test]
async fn create_game_returns_board() {
    let app = create_router(state());
    let (status, json) = send(
        &app,
        json_request("POST", "/api/games", serde_json::json!({"rows": 6, "cols": 8, "seed": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["game_id"].as_str().unwrap().len(), 32);
    assert_eq!(json["seed"], 5);
    let board = &json["board"];
    assert_eq!(board["rows"], 6);
    assert_eq!(board["cols"], 8);
    assert_eq!(board["robot"]["position"], serde_json::json!({"row": 0, "col": 0}));
    assert_eq!(board["robot"]["orientation"], "east");
    assert_eq!(board["robot"]["max_capacity"], 12);
    assert_eq!(board["princess"]["position"], serde_json::json!({"row": 5, "col": 7}));
    assert_eq!(board["status"], "in_progress");
    assert!(board["initial_flower_count"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn create_game_same_seed_same_layout() {
    let app = create_router(state());
    let body = serde_json::json!({"rows": 10, "cols": 10, "seed": 99});
    let (_, a) = send(&app, json_request("POST", "/api/games", body.clone())).await;
    let (_, b) = send(&app, json_request("POST", "/api/games", body)).await;
    assert_ne!(a["game_id"], b["game_id"]);
    assert_eq!(a["board"], b["board"]);
}

#[tokio::test]
async fn create_game_rejects_bad_dimensions() {
    let app = create_router(state());
    for (rows, cols) in [(2, 10), (10, 51), (0, 0)] {
        let (status, json) = send(
            &app,
            json_request("POST", "/api/games", serde_json::json!({"rows": rows, "cols": cols})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{rows}x{cols}");
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn create_game_rejects_malformed_body() {
    let app = create_router(state());
    let (status, json) = send(
        &app,
        json_request("POST", "/api/games", serde_json::json!({"rows": -3, "cols": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());
}

// ── GET /api/games ───────────────────────────────────────────────────

#[tokio::test]
async fn list_games_contains_created() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (status, json) = send(&app, Request::get("/api/games").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let games = json["games"].as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["game_id"], id.as_str());
    assert_eq!(games[0]["status"], "in_progress");
}

// ── GET /api/games/{id} ──────────────────────────────────────────────

#[tokio::test]
async fn get_game_unknown_id_is_404() {
    let app = create_router(state());
    let (status, json) = send(
        &app,
        Request::get("/api/games/does-not-exist").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("does-not-exist"));
}

// ── POST /api/games/{id}/action ──────────────────────────────────────

#[tokio::test]
async fn action_move_blocked_then_clean() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let uri = format!("/api/games/{id}/action");

    let (status, json) = send(
        &app,
        json_request("POST", &uri, serde_json::json!({"action": "move", "direction": "east"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["board"]["robot"]["position"], serde_json::json!({"row": 0, "col": 0}));

    let (status, json) = send(
        &app,
        json_request("POST", &uri, serde_json::json!({"action": "clean", "direction": "east"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["board"]["obstacles"].as_array().unwrap().is_empty());
    assert_eq!(
        json["board"]["robot"]["obstacles_cleaned"],
        serde_json::json!([{"row": 0, "col": 1}])
    );
}

#[tokio::test]
async fn action_pick_flower() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (_, json) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/games/{id}/action"),
            serde_json::json!({"action": "pickFlower", "direction": "south"}),
        ),
    )
    .await;
    assert_eq!(json["success"], true);
    assert_eq!(json["board"]["robot"]["flowers_held"], 1);
    assert_eq!(json["board"]["robot"]["orientation"], "south");
}

#[tokio::test]
async fn action_invalid_direction_is_422() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (status, json) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/games/{id}/action"),
            serde_json::json!({"action": "move", "direction": "up"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn action_invalid_action_is_422() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/games/{id}/action"),
            serde_json::json!({"action": "jump", "direction": "east"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn action_unknown_game_is_404() {
    let app = create_router(state());
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/games/nope/action",
            serde_json::json!({"action": "rotate", "direction": "west"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── GET /api/games/{id}/history ──────────────────────────────────────

#[tokio::test]
async fn history_preserves_order_including_failures() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let uri = format!("/api/games/{id}/action");
    let steps = [
        ("move", "east"),
        ("rotate", "south"),
        ("rotate", "south"),
        ("pickFlower", "south"),
    ];
    for (action, direction) in steps {
        send(
            &app,
            json_request("POST", &uri, serde_json::json!({"action": action, "direction": direction})),
        )
        .await;
    }

    let (status, json) = send(
        &app,
        Request::get(format!("/api/games/{id}/history")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["game_id"], id.as_str());
    let actions = json["actions"].as_array().unwrap();
    assert_eq!(actions.len(), steps.len());
    for (record, (action, direction)) in actions.iter().zip(steps) {
        assert_eq!(record["action"], action);
        assert_eq!(record["direction"], direction);
    }
    assert_eq!(actions[0]["success"], false);
    assert!(actions[1..].iter().all(|r| r["success"] == true));
}

// ── POST /api/games/{id}/autoplay ────────────────────────────────────

#[tokio::test]
async fn autoplay_default_strategy_is_greedy() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (status, json) = send(&app, empty_post(&format!("/api/games/{id}/autoplay"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["strategy"], "greedy");
    assert_eq!(json["success"], true, "{}", json["message"]);
    assert_eq!(json["board"]["status"], "victory");
    assert!(json["actions_taken"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn autoplay_each_strategy_on_generated_game() {
    let st = state();
    let app = create_router(st.clone());
    for strategy in ["greedy", "optimal", "ml"] {
        let (_, created) = send(
            &app,
            json_request("POST", "/api/games", serde_json::json!({"rows": 8, "cols": 8, "seed": 21})),
        )
        .await;
        let id = created["game_id"].as_str().unwrap().to_string();
        let (status, json) = send(
            &app,
            empty_post(&format!("/api/games/{id}/autoplay?strategy={strategy}&ml_strategy=conservative")),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{strategy}");
        assert_eq!(json["strategy"], strategy);
        assert!(json["success"].is_boolean());
        assert!(json["message"].is_string());

        // The replayed actions are all in the history.
        let (_, history) = send(
            &app,
            Request::get(format!("/api/games/{id}/history")).body(Body::empty()).unwrap(),
        )
        .await;
        let recorded = history["actions"].as_array().unwrap();
        let ok = recorded.iter().filter(|r| r["success"] == true).count() as u64;
        assert_eq!(ok, json["actions_taken"].as_u64().unwrap(), "{strategy}");
    }
}

#[tokio::test]
async fn autoplay_unknown_strategy_is_422() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (status, json) = send(&app, empty_post(&format!("/api/games/{id}/autoplay?strategy=random"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn autoplay_unknown_game_is_404() {
    let app = create_router(state());
    let (status, _) = send(&app, empty_post("/api/games/nope/autoplay?strategy=optimal")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn autoplay_unknown_ml_preset_reports_unavailable() {
    let st = state();
    let app = create_router(st.clone());
    let id = seeded_game(&st).await;
    let (status, json) = send(
        &app,
        empty_post(&format!("/api/games/{id}/autoplay?strategy=ml&ml_strategy=reckless")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["actions_taken"], 0);
    assert!(json["message"].as_str().unwrap().starts_with("Strategy 'ml' unavailable:"));
}

// ── GET /api/ml/strategies ───────────────────────────────────────────

#[tokio::test]
async fn strategies_list_and_lookup() {
    let app = create_router(state());
    let (status, json) = send(&app, Request::get("/api/ml/strategies").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["strategies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["default", "aggressive", "conservative"]);

    let (status, json) = send(
        &app,
        Request::get("/api/ml/strategies/conservative").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lookahead_depth"], 4);

    let (status, _) = send(
        &app,
        Request::get("/api/ml/strategies/reckless").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
