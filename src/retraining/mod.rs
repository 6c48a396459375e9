//! Background model retraining: dataset loading, job lifecycle tracking,
//! and the orchestrator that runs jobs on a bounded worker pool.

pub mod dataset;
pub mod job;
pub mod orchestrator;
pub mod registry;

pub use dataset::{Dataset, REQUIRED_COLUMNS};
pub use job::{JobStatus, RetrainAck, RetrainReport, RetrainRequest, RetrainingJob, StatusRequest};
pub use orchestrator::RetrainingOrchestrator;
pub use registry::TaskStatusRegistry;
