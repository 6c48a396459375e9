//! Shared registry of retraining job statuses.
//!
//! The registry is the only channel through which a job's outcome becomes
//! visible outside the worker that ran it. Job records are never removed
//! automatically; they are retained for audit.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::retraining::job::JobStatus;

/// Queryable store of job lifecycle states, cheap to clone and share.
#[derive(Clone, Default)]
pub struct TaskStatusRegistry {
    inner: Arc<RwLock<HashMap<String, JobStatus>>>,
}

impl TaskStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of a job. Unseen ids report `Unknown` rather than
    /// erroring; a caller may legitimately query before the submission is
    /// visible or after retention expiry.
    pub fn get(&self, task_id: &str) -> JobStatus {
        self.inner
            .read()
            .get(task_id)
            .cloned()
            .unwrap_or(JobStatus::Unknown)
    }

    /// Record a state transition. Terminal states are immutable: an attempt
    /// to move a completed or failed job is dropped.
    pub(crate) fn set(&self, task_id: &str, status: JobStatus) {
        let mut map = self.inner.write();
        if let Some(existing) = map.get(task_id) {
            if existing.is_terminal() {
                warn!(
                    task_id = %task_id,
                    attempted = ?status,
                    "ignoring transition out of a terminal job state"
                );
                return;
            }
        }
        map.insert(task_id.to_string(), status);
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_id_returns_unknown() {
        let registry = TaskStatusRegistry::new();
        assert_eq!(registry.get("no-such-task"), JobStatus::Unknown);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let registry = TaskStatusRegistry::new();
        registry.set("t1", JobStatus::Pending);
        assert_eq!(registry.get("t1"), JobStatus::Pending);

        registry.set("t1", JobStatus::Running);
        assert_eq!(registry.get("t1"), JobStatus::Running);

        registry.set("t1", JobStatus::Failed("bad data".to_string()));
        assert_eq!(registry.get("t1"), JobStatus::Failed("bad data".to_string()));
    }

    #[test]
    fn test_terminal_state_is_immutable() {
        let registry = TaskStatusRegistry::new();
        registry.set("t1", JobStatus::Failed("first".to_string()));

        registry.set("t1", JobStatus::Running);
        assert_eq!(registry.get("t1"), JobStatus::Failed("first".to_string()));

        registry.set("t1", JobStatus::Failed("second".to_string()));
        assert_eq!(registry.get("t1"), JobStatus::Failed("first".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let registry = TaskStatusRegistry::new();
        let view = registry.clone();
        registry.set("t1", JobStatus::Pending);
        assert_eq!(view.get("t1"), JobStatus::Pending);
        assert_eq!(view.len(), 1);
    }
}
