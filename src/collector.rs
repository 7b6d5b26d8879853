//! Gameplay sample sink for offline training.
//!
//! Submission is fire-and-forget: [`submit`] detaches a task and returns
//! immediately, and whatever the collector does never reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actions::ActionKind;
use crate::board::BoardSnapshot;
use crate::grid::Direction;

const COLLECTOR_TIMEOUT: Duration = Duration::from_secs(2);

/// One attempted action and the board it was attempted on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameplaySample {
    pub game_id: String,
    pub state_before: BoardSnapshot,
    pub action: ActionKind,
    pub direction: Direction,
    pub success: bool,
    pub message: String,
}

#[async_trait]
pub trait GameplayCollector: Send + Sync {
    async fn record(&self, sample: GameplaySample) -> Result<(), String>;
}

/// Discards everything. Used when no collector URL is configured.
#[derive(Clone, Debug, Default)]
pub struct NoopCollector;

#[async_trait]
impl GameplayCollector for NoopCollector {
    async fn record(&self, _sample: GameplaySample) -> Result<(), String> {
        Ok(())
    }
}

/// `POST {url}` with the sample as JSON.
pub struct HttpCollector {
    client: reqwest::Client,
    url: String,
}

impl HttpCollector {
    pub fn new(url: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(COLLECTOR_TIMEOUT)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl GameplayCollector for HttpCollector {
    async fn record(&self, sample: GameplaySample) -> Result<(), String> {
        let resp = self
            .client
            .post(&self.url)
            .json(&sample)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("collector returned HTTP {}", resp.status().as_u16()));
        }
        Ok(())
    }
}

/// Hand `sample` to `collector` on a detached task.
pub fn submit(collector: &Arc<dyn GameplayCollector>, sample: GameplaySample) {
    let collector = Arc::clone(collector);
    tokio::spawn(async move {
        let game = sample.game_id.clone();
        if let Err(e) = collector.record(sample).await {
            debug!(%game, error = %e, "gameplay sample dropped");
        }
    });
}
