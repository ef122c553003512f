//! Recommender configuration

use crate::embed::EmbeddingConfig;
use crate::fetch::FetchPolicy;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything the recommender needs, passed in explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Seconds between two page requests for the same field
    pub crawl_delay_secs: f64,
    /// Pages fetched per field attempt
    pub max_pages: usize,
    /// Whole-field retry rounds
    pub max_retries: u32,
    pub request_timeout_secs: u64,
    pub max_recommendations: usize,
    /// Authors shown per weighted field
    pub max_results_per_field: usize,
    /// Weighted fields explored per request
    pub top_fields: usize,
    pub embedding: EmbeddingConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            crawl_delay_secs: 1.0,
            max_pages: 3,
            max_retries: 3,
            request_timeout_secs: 10,
            max_recommendations: 5,
            max_results_per_field: 5,
            top_fields: 5,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl RecommenderConfig {
    pub fn from_yaml_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.crawl_delay_secs.is_finite() && self.crawl_delay_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "crawl_delay_secs must be a non-negative number, got {}",
                self.crawl_delay_secs
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".to_string()));
        }
        self.embedding
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            crawl_delay: Duration::try_from_secs_f64(self.crawl_delay_secs)
                .unwrap_or(Duration::ZERO),
            max_pages: self.max_pages,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Parse `raw`, falling back to `default` when it is not a valid `T`
pub fn parse_or_default<T>(raw: &str, default: T, name: &str) -> T
where
    T: FromStr + Display,
{
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Invalid {} '{}', using default {}", name, raw, default);
            default
        }
    }
}
