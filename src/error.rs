//! Error taxonomy for the fraud risk pipeline.
//!
//! Feature transformation and model code return these errors synchronously.
//! The retraining orchestrator converts every error into a terminal `Failed`
//! job status; nothing here is allowed to escape a background worker.

use thiserror::Error;

/// Convenience alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Structured pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required field or column is missing, or schema versions disagree.
    #[error("schema error: {0}")]
    Schema(String),

    /// A value violates a numeric precondition (e.g. negative amount).
    #[error("data quality error: {0}")]
    DataQuality(String),

    /// A referenced model artifact is missing from storage.
    #[error("model artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The dataset reference handed to `submit` is not usable.
    #[error("invalid dataset reference: {0}")]
    InvalidReference(String),

    /// The retraining job queue cannot accept more work right now.
    #[error("retraining queue is full")]
    QueueFull,

    /// A retraining job exceeded its wall-clock budget.
    #[error("retraining timed out after {0}s")]
    Timeout(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("artifact serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PipelineError {
    /// Schema error naming every missing column, not just the first.
    pub fn missing_columns(missing: &[String]) -> Self {
        PipelineError::Schema(format!(
            "missing required columns: {}",
            missing.join(", ")
        ))
    }
}
