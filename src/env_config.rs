//! Environment configuration for the flowerbot server.
//!
//! Consolidates the `FLOWERBOT_*` reads and the tracing subscriber setup.
//! Malformed values fall back to their defaults.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::constants::DEFAULT_MAX_CAPACITY;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_ML_TIMEOUT_MS: u64 = 5000;
const DEFAULT_ML_RETRIES: u32 = 1;
const DEFAULT_LOG_FILTER: &str = "flowerbot=info,tower_http=info";

/// Everything the server binary reads from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    /// Base URL of the prediction service; `None` selects the local predictor.
    pub ml_url: Option<String>,
    pub ml_timeout: Duration,
    pub ml_retries: u32,
    /// Gameplay collector endpoint; `None` disables collection.
    pub collector_url: Option<String>,
    pub max_capacity: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ml_url: None,
            ml_timeout: Duration::from_millis(DEFAULT_ML_TIMEOUT_MS),
            ml_retries: DEFAULT_ML_RETRIES,
            collector_url: None,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let parsed = |key: &str| get(key).and_then(|s| s.trim().parse::<u64>().ok());
        let url = |key: &str| get(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            port: parsed("FLOWERBOT_PORT")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(d.port),
            ml_url: url("FLOWERBOT_ML_URL"),
            ml_timeout: parsed("FLOWERBOT_ML_TIMEOUT_MS")
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(d.ml_timeout),
            ml_retries: parsed("FLOWERBOT_ML_RETRIES")
                .and_then(|r| u32::try_from(r).ok())
                .unwrap_or(d.ml_retries),
            collector_url: url("FLOWERBOT_COLLECTOR_URL"),
            max_capacity: parsed("FLOWERBOT_MAX_CAPACITY")
                .and_then(|c| u32::try_from(c).ok())
                .filter(|&c| c > 0)
                .unwrap_or(d.max_capacity),
        }
    }
}

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter.
/// Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok(); // already installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(settings(&[]), Settings::default());
    }

    #[test]
    fn test_values_are_read() {
        let s = settings(&[
            ("FLOWERBOT_PORT", "9100"),
            ("FLOWERBOT_ML_URL", "http://ml:5000/"),
            ("FLOWERBOT_ML_TIMEOUT_MS", "250"),
            ("FLOWERBOT_ML_RETRIES", "0"),
            ("FLOWERBOT_MAX_CAPACITY", "3"),
        ]);
        assert_eq!(s.port, 9100);
        assert_eq!(s.ml_url.as_deref(), Some("http://ml:5000/"));
        assert_eq!(s.ml_timeout, Duration::from_millis(250));
        assert_eq!(s.ml_retries, 0);
        assert_eq!(s.max_capacity, 3);
        assert!(s.collector_url.is_none());
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let s = settings(&[
            ("FLOWERBOT_PORT", "99999"),
            ("FLOWERBOT_ML_TIMEOUT_MS", "soon"),
            ("FLOWERBOT_MAX_CAPACITY", "0"),
            ("FLOWERBOT_COLLECTOR_URL", "  "),
        ]);
        assert_eq!(s, Settings::default());
    }
}
