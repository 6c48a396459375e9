//! Fraud Risk Service Library
//!
//! Real-time fraud scoring over NATS with asynchronous model retraining.
//! Predictions are served synchronously from the active model artifact;
//! retraining jobs run on a bounded background worker pool and produce new
//! versioned candidate artifacts without interrupting serving.

pub mod config;
pub mod consumer;
pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod producer;
pub mod retraining;
pub mod serving;
pub mod types;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{PipelineError, Result};
pub use features::{FeatureSchema, FeatureTransform, FeatureVector};
pub use metrics::{MetricsReporter, PipelineMetrics};
pub use model::{ActiveModel, ArtifactStore, ModelArtifact};
pub use producer::DecisionProducer;
pub use retraining::{JobStatus, RetrainingOrchestrator, TaskStatusRegistry};
pub use serving::PredictionService;
pub use types::{Decision, TransactionRecord};
