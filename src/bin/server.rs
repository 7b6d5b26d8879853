use std::sync::Arc;

use tracing::{info, warn};

use flowerbot::collector::{GameplayCollector, HttpCollector, NoopCollector};
use flowerbot::env_config::{self, Settings};
use flowerbot::predictor::{HeuristicPredictor, HttpPredictor, Predictor};
use flowerbot::repository::GameRepository;
use flowerbot::server::{create_router, AppContext};

#[tokio::main]
async fn main() {
    env_config::init_tracing();
    let settings = Settings::from_env();
    info!("Starting flowerbot API server...");

    let predictor: Arc<dyn Predictor> = match &settings.ml_url {
        Some(url) => {
            let p = HttpPredictor::new(url, settings.ml_timeout, settings.ml_retries)
                .expect("failed to build prediction service client");
            info!(
                url = %p.base_url(),
                timeout_ms = settings.ml_timeout.as_millis() as u64,
                retries = settings.ml_retries,
                "ML strategy uses the remote prediction service"
            );
            Arc::new(p)
        }
        None => {
            info!("FLOWERBOT_ML_URL not set, ML strategy uses the local heuristic predictor");
            Arc::new(HeuristicPredictor::new())
        }
    };

    let collector: Arc<dyn GameplayCollector> = match &settings.collector_url {
        Some(url) => match HttpCollector::new(url) {
            Ok(c) => {
                info!(%url, "gameplay collection enabled");
                Arc::new(c)
            }
            Err(e) => {
                warn!(error = %e, "gameplay collector unavailable, collection disabled");
                Arc::new(NoopCollector)
            }
        },
        None => Arc::new(NoopCollector),
    };

    let state = Arc::new(AppContext::new(
        Arc::new(GameRepository::new()),
        predictor,
        collector,
        settings.max_capacity,
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port))
        .await
        .expect("failed to bind server port");
    info!("Server is running on port {}. Press Ctrl+C to stop.", settings.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("Stopping server...");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
}
