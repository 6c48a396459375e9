//! Configuration management for the fraud risk service

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub retraining: RetrainingConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub prediction_subject: String,
    /// Subject for outgoing decisions
    pub decision_subject: String,
    /// Subject for retraining submissions
    pub retrain_subject: String,
    /// Request/reply subject for task status queries
    pub status_subject: String,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory holding versioned model artifacts
    pub artifacts_dir: String,
    /// Probability cutoff for the fraud label
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Seed an untrained artifact when the store is empty, instead of
    /// failing startup. Intended for fresh deployments only.
    #[serde(default)]
    pub bootstrap_if_missing: bool,
}

/// Retraining orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrainingConfig {
    /// Maximum retraining jobs running concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bound on queued (not yet running) jobs
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Directory for per-job staged dataset copies
    pub staging_dir: String,
    /// Fraction of the dataset held out for validation
    #[serde(default = "default_validation_fraction")]
    pub validation_fraction: f64,
    /// Seed for the reproducible train/validation shuffle
    #[serde(default = "default_split_seed")]
    pub split_seed: u64,
    /// Wall-clock budget per job in seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn default_threshold() -> f64 {
    0.5
}

fn default_workers() -> usize {
    2
}

fn default_queue_depth() -> usize {
    64
}

fn default_validation_fraction() -> f64 {
    0.2
}

fn default_split_seed() -> u64 {
    42
}

fn default_job_timeout_secs() -> u64 {
    300
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                prediction_subject: "fraud.predict".to_string(),
                decision_subject: "fraud.decisions".to_string(),
                retrain_subject: "fraud.retrain.submit".to_string(),
                status_subject: "fraud.retrain.status".to_string(),
            },
            model: ModelConfig {
                artifacts_dir: "model".to_string(),
                threshold: default_threshold(),
                bootstrap_if_missing: false,
            },
            retraining: RetrainingConfig {
                workers: default_workers(),
                queue_depth: default_queue_depth(),
                staging_dir: "staging".to_string(),
                validation_fraction: default_validation_fraction(),
                split_seed: default_split_seed(),
                job_timeout_secs: default_job_timeout_secs(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.model.threshold, 0.5);
        assert_eq!(config.retraining.validation_fraction, 0.2);
        assert_eq!(config.retraining.split_seed, 42);
        assert!(!config.model.bootstrap_if_missing);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[nats]
url = "nats://example:4222"
prediction_subject = "fraud.predict"
decision_subject = "fraud.decisions"
retrain_subject = "fraud.retrain.submit"
status_subject = "fraud.retrain.status"

[model]
artifacts_dir = "/var/lib/fraud/model"
bootstrap_if_missing = true

[retraining]
staging_dir = "/var/lib/fraud/staging"
workers = 4

[logging]
level = "debug"
format = "pretty"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.nats.url, "nats://example:4222");
        assert_eq!(config.retraining.workers, 4);
        // Defaulted fields
        assert_eq!(config.retraining.job_timeout_secs, 300);
        assert_eq!(config.model.threshold, 0.5);
        assert!(config.model.bootstrap_if_missing);
    }
}
