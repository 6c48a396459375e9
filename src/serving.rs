//! Synchronous prediction serving.
//!
//! Every request is scored against whatever artifact is active at the moment
//! the request arrives. The artifact handle is grabbed once per request, so
//! a retraining promotion mid-request cannot mix two models.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::error::{PipelineError, Result};
use crate::features::FeatureTransform;
use crate::model::ActiveModel;
use crate::types::{Decision, TransactionRecord};

/// Stateless scoring facade over the feature transform and the active model.
pub struct PredictionService {
    transform: FeatureTransform,
    active: Arc<ActiveModel>,
}

impl PredictionService {
    pub fn new(active: Arc<ActiveModel>) -> Self {
        Self {
            transform: FeatureTransform::new(),
            active,
        }
    }

    /// Score a single transaction against the currently active artifact.
    pub fn predict(&self, record: &TransactionRecord) -> Result<Decision> {
        let started = Instant::now();

        let artifact = self.active.current().ok_or_else(|| {
            PipelineError::ArtifactNotFound("no active model artifact loaded".to_string())
        })?;

        let features = self.transform.transform(record)?;
        let prediction = artifact.predict(&features)?;
        let elapsed = started.elapsed();

        let decision = Decision {
            prediction: prediction.label,
            fraud_probability: round_to(prediction.probability, 4),
            processing_time: round_to(elapsed.as_secs_f64(), 3),
        };

        info!(
            tx_type = %record.tx_type,
            amount = record.amount,
            fraud = decision.prediction,
            probability = decision.fraud_probability,
            elapsed_us = elapsed.as_micros() as u64,
            "Prediction served"
        );

        Ok(decision)
    }

    /// Elapsed wall time for the caller's own latency accounting.
    pub fn predict_timed(&self, record: &TransactionRecord) -> Result<(Decision, std::time::Duration)> {
        let started = Instant::now();
        let decision = self.predict(record)?;
        Ok((decision, started.elapsed()))
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSchema;
    use crate::model::{ModelArtifact, DEFAULT_THRESHOLD};

    fn service_with_bootstrap() -> PredictionService {
        let artifact = ModelArtifact::bootstrap(&FeatureSchema::v1(), DEFAULT_THRESHOLD);
        PredictionService::new(Arc::new(ActiveModel::with_artifact(artifact)))
    }

    #[test]
    fn test_predict_returns_rounded_decision() {
        let service = service_with_bootstrap();
        let record = TransactionRecord::new(5, "TRANSFER", 1000.0)
            .with_balances(5000.0, 4000.0, 0.0, 1000.0);

        let decision = service.predict(&record).unwrap();
        assert!((0.0..=1.0).contains(&decision.fraud_probability));
        // Four decimal places on probability.
        let scaled = decision.fraud_probability * 10_000.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
        assert!(decision.processing_time >= 0.0);
    }

    #[test]
    fn test_predict_without_active_model_fails() {
        let service = PredictionService::new(Arc::new(ActiveModel::empty()));
        let record = TransactionRecord::new(1, "PAYMENT", 10.0);
        assert!(matches!(
            service.predict(&record),
            Err(PipelineError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_predict_rejects_bad_input() {
        let service = service_with_bootstrap();
        let record = TransactionRecord::new(1, "PAYMENT", -5.0);
        assert!(matches!(
            service.predict(&record),
            Err(PipelineError::DataQuality(_))
        ));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(0.0004999, 3), 0.0);
        assert_eq!(round_to(1.0, 4), 1.0);
    }
}
