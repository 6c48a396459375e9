//! Retraining job identity, lifecycle states, and wire types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One queued retraining execution, operating on its own staged dataset copy.
#[derive(Debug, Clone)]
pub struct RetrainingJob {
    pub task_id: String,
    pub dataset_path: PathBuf,
    pub submitted_at: DateTime<Utc>,
}

/// Result payload of a successful retraining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainReport {
    /// Number of labeled rows in the dataset.
    pub data_size: usize,
    /// Held-out evaluation score of the refit model.
    pub validation_score: f64,
    /// Where the new versioned artifact was persisted.
    pub model_path: String,
}

/// Externally observable lifecycle state of a retraining job.
///
/// `Succeeded` and `Failed` are terminal and immutable once reached.
/// `Unknown` is what a query for an unseen task id returns; it is never
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded(RetrainReport),
    Failed(String),
    Unknown,
}

impl JobStatus {
    /// Whether this state can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded(_) | JobStatus::Failed(_))
    }
}

/// Submission request as carried over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainRequest {
    pub dataset_path: String,
}

/// Acknowledgement returned once a job is accepted and queued. The
/// "started" status signals acceptance, not completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainAck {
    pub task_id: String,
    pub status: String,
}

impl RetrainAck {
    pub fn started(task_id: String) -> Self {
        Self {
            task_id,
            status: "started".to_string(),
        }
    }
}

/// Status query as carried over the wire (request/reply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub task_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
        assert!(JobStatus::Failed("boom".to_string()).is_terminal());
        assert!(JobStatus::Succeeded(RetrainReport {
            data_size: 10,
            validation_score: 0.9,
            model_path: "/tmp/m.json".to_string(),
        })
        .is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        let status = JobStatus::Succeeded(RetrainReport {
            data_size: 100,
            validation_score: 0.95,
            model_path: "model/fraud_model_v1.json".to_string(),
        });

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"succeeded\""));
        assert!(json.contains("\"data_size\":100"));

        let back: JobStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_ack_signals_queued_not_done() {
        let ack = RetrainAck::started("abc".to_string());
        assert_eq!(ack.status, "started");
        let json = serde_json::to_string(&ack).unwrap();
        assert!(json.contains("\"task_id\":\"abc\""));
    }
}
