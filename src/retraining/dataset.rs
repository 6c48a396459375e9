//! Labeled dataset loading and deterministic splitting for retraining.

use std::collections::HashSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::types::TransactionRecord;

/// Columns a retraining dataset must carry: the transaction fields plus the
/// label. Validation reports the full missing set, not just the first hit.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "step",
    "type",
    "amount",
    "nameOrig",
    "oldbalanceOrg",
    "newbalanceOrig",
    "nameDest",
    "oldbalanceDest",
    "newbalanceDest",
    "isFraud",
];

/// One CSV row of labeled training data.
#[derive(Debug, Deserialize)]
struct DatasetRow {
    step: u64,
    #[serde(rename = "type")]
    tx_type: String,
    amount: f64,
    #[serde(rename = "nameOrig")]
    name_orig: String,
    #[serde(rename = "oldbalanceOrg")]
    oldbalance_org: f64,
    #[serde(rename = "newbalanceOrig")]
    newbalance_orig: f64,
    #[serde(rename = "nameDest")]
    name_dest: String,
    #[serde(rename = "oldbalanceDest")]
    oldbalance_dest: f64,
    #[serde(rename = "newbalanceDest")]
    newbalance_dest: f64,
    #[serde(rename = "isFraud")]
    is_fraud: u8,
    #[serde(default, rename = "avgDailyVolumeSoFar")]
    avg_daily_volume: Option<f64>,
    #[serde(default, rename = "amountToAvgVolumeRatio")]
    amount_to_avg_volume: Option<f64>,
    #[serde(default, rename = "isFirstTransaction")]
    is_first_transaction: Option<bool>,
}

impl DatasetRow {
    fn into_labeled(self) -> (TransactionRecord, bool) {
        let record = TransactionRecord {
            step: Some(self.step),
            timestamp: None,
            tx_type: self.tx_type,
            amount: self.amount,
            name_orig: Some(self.name_orig),
            oldbalance_org: self.oldbalance_org,
            newbalance_orig: self.newbalance_orig,
            name_dest: Some(self.name_dest),
            oldbalance_dest: self.oldbalance_dest,
            newbalance_dest: self.newbalance_dest,
            avg_daily_volume: self.avg_daily_volume,
            amount_to_avg_volume: self.amount_to_avg_volume,
            is_first_transaction: self.is_first_transaction,
        };
        (record, self.is_fraud != 0)
    }
}

/// An in-memory labeled dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<TransactionRecord>,
    pub labels: Vec<bool>,
}

impl Dataset {
    /// Load a labeled CSV, validating the header before reading any rows.
    pub fn load_csv(path: &Path) -> Result<Dataset> {
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let present: HashSet<&str> = headers.iter().collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !present.contains(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::missing_columns(&missing));
        }

        let mut records = Vec::new();
        let mut labels = Vec::new();
        for row in reader.deserialize::<DatasetRow>() {
            let (record, label) = row?.into_labeled();
            records.push(record);
            labels.push(label);
        }

        Ok(Dataset { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split into (train, validation) with a seeded shuffle, so retraining
    /// runs are comparable across invocations.
    pub fn split(&self, validation_fraction: f64, seed: u64) -> (Dataset, Dataset) {
        let n = self.len();
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let n_val = ((n as f64) * validation_fraction).round() as usize;
        let n_val = n_val.clamp(usize::from(n >= 2), n.saturating_sub(1));

        let mut train = Dataset::default();
        let mut validation = Dataset::default();
        for (position, &i) in indices.iter().enumerate() {
            let target = if position < n_val {
                &mut validation
            } else {
                &mut train
            };
            target.records.push(self.records[i].clone());
            target.labels.push(self.labels[i]);
        }
        (train, validation)
    }
}
