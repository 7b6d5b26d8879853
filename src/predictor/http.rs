//! Client adapter for the remote prediction service.
//!
//! Every call is bounded: `reqwest` enforces the per-request timeout, and a
//! failed call is retried at most `retries` times (timeouts, transport errors
//! and 5xx only). Client errors and malformed bodies are never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{PredictionRequest, PredictionResponse, Predictor, PredictorError, StrategyConfig};

const RETRY_BACKOFF: Duration = Duration::from_millis(100);

pub struct HttpPredictor {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retries: u32,
}

impl HttpPredictor {
    pub fn new(base_url: &str, timeout: Duration, retries: u32) -> Result<Self, PredictorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PredictorError::Transport(e.to_string()))?;
        let base_url = Url::parse(base_url)
            .map_err(|e| PredictorError::Transport(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PredictorError::Transport(format!("invalid base url '{base_url}'")));
        }
        Ok(Self {
            client,
            base_url,
            timeout,
            retries,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `base_url` with `segments` appended, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn classify(&self, err: reqwest::Error) -> PredictorError {
        if err.is_timeout() {
            PredictorError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            PredictorError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            PredictorError::Http(status.as_u16())
        } else {
            PredictorError::Transport(err.to_string())
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, PredictorError> {
        let resp = req.send().await.map_err(|e| self.classify(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PredictorError::Http(status.as_u16()));
        }
        resp.json::<T>().await.map_err(|e| self.classify(e))
    }

    /// Run `build` up to `1 + retries` times.
    async fn call<T, F>(&self, what: &str, build: F) -> Result<T, PredictorError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match self.send_once::<T>(build()).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.retries && is_retryable(&e) => {
                    attempt += 1;
                    debug!(%what, attempt, error = %e, "retrying prediction service call");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => {
                    warn!(%what, attempts = attempt + 1, error = %e, "prediction service call failed");
                    return Err(e);
                }
            }
        }
    }
}

fn is_retryable(err: &PredictorError) -> bool {
    match err {
        PredictorError::Timeout(_) | PredictorError::Transport(_) => true,
        PredictorError::Http(code) => *code >= 500,
        _ => false,
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    fn name(&self) -> &str {
        "http"
    }

    async fn predict(&self, req: &PredictionRequest) -> Result<PredictionResponse, PredictorError> {
        let url = self.endpoint(&["predict"]);
        self.call("predict", || self.client.post(url.clone()).json(req)).await
    }

    async fn strategies(&self) -> Result<Vec<StrategyConfig>, PredictorError> {
        let url = self.endpoint(&["strategies"]);
        self.call("strategies", || self.client.get(url.clone())).await
    }

    async fn strategy(&self, name: &str) -> Result<StrategyConfig, PredictorError> {
        let url = self.endpoint(&["strategies", name]);
        match self.call("strategy", || self.client.get(url.clone())).await {
            Err(PredictorError::Http(404)) => Err(PredictorError::UnknownStrategy(name.to_string())),
            other => other,
        }
    }
}
