//! Versioned, self-describing model artifacts.
//!
//! An artifact bundles the fitted model with the feature schema version it
//! was trained against and its decision threshold, so schema mismatches are
//! caught as typed errors instead of silent column misalignment. Artifacts
//! are immutable once created: `fit` is save-as, never save-over.

use std::fs::OpenOptions;
use std::io::{BufReader, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::model::logistic::LogisticModel;

/// Default probability cutoff for the fraud label.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Thresholded prediction for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: bool,
    pub probability: f64,
}

/// A serialized unit of fitted model plus its expected input schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    schema_version: String,
    created_at: DateTime<Utc>,
    threshold: f64,
    model: LogisticModel,
}

impl ModelArtifact {
    /// An untrained artifact for the given schema, used to seed a fresh
    /// deployment before any retraining has happened.
    pub fn bootstrap(schema: &FeatureSchema, threshold: f64) -> Self {
        Self {
            schema_version: schema.version().to_string(),
            created_at: Utc::now(),
            threshold,
            model: LogisticModel::new(schema.len()),
        }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn check_input(&self, fv: &FeatureVector) -> Result<()> {
        if fv.schema_version() != self.schema_version {
            return Err(PipelineError::Schema(format!(
                "feature vector schema {} does not match artifact schema {}",
                fv.schema_version(),
                self.schema_version
            )));
        }
        if fv.values().len() != self.model.dim() {
            return Err(PipelineError::Schema(format!(
                "feature vector has {} columns, artifact expects {}",
                fv.values().len(),
                self.model.dim()
            )));
        }
        Ok(())
    }

    fn check_training_set(&self, features: &[FeatureVector], labels: &[bool]) -> Result<()> {
        if features.is_empty() {
            return Err(PipelineError::DataQuality(
                "empty feature set".to_string(),
            ));
        }
        if features.len() != labels.len() {
            return Err(PipelineError::DataQuality(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        for fv in features {
            self.check_input(fv)?;
        }
        Ok(())
    }

    /// Positive-class probability for one vector.
    pub fn predict_proba(&self, fv: &FeatureVector) -> Result<f64> {
        self.check_input(fv)?;
        Ok(self.model.predict_proba(fv.values()))
    }

    /// Probability plus the thresholded label.
    pub fn predict(&self, fv: &FeatureVector) -> Result<Prediction> {
        let probability = self.predict_proba(fv)?;
        Ok(Prediction {
            label: probability >= self.threshold,
            probability,
        })
    }

    /// Refit on labeled data, returning a NEW artifact stamped with a fresh
    /// creation time. The artifact `fit` is called on is never modified, so
    /// a failed or inferior retraining run cannot degrade live serving.
    pub fn fit(&self, features: &[FeatureVector], labels: &[bool]) -> Result<ModelArtifact> {
        self.check_training_set(features, labels)?;
        let xs: Vec<&[f64]> = features.iter().map(|fv| fv.values()).collect();
        Ok(ModelArtifact {
            schema_version: self.schema_version.clone(),
            created_at: Utc::now(),
            threshold: self.threshold,
            model: self.model.fitted(&xs, labels),
        })
    }

    /// Held-out accuracy on labeled data.
    pub fn score(&self, features: &[FeatureVector], labels: &[bool]) -> Result<f64> {
        self.check_training_set(features, labels)?;
        let xs: Vec<&[f64]> = features.iter().map(|fv| fv.values()).collect();
        Ok(self.model.accuracy(&xs, labels))
    }

    /// Serialize to a new file. Refuses to overwrite an existing artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let payload = serde_json::to_vec_pretty(self)?;
        file.write_all(&payload)?;
        Ok(())
    }

    /// Load an artifact from storage.
    pub fn load(path: &Path) -> Result<ModelArtifact> {
        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::ArtifactNotFound(path.display().to_string())
            } else {
                PipelineError::Io(e)
            }
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
