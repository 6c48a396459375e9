//! Deterministic feature engineering for fraud risk scoring.
//!
//! The transform is pure: the same record always yields the same vector, in
//! the same column order, at serving time and training time. Any drift here
//! silently degrades every model trained against the schema, so derivations
//! are fixed per schema version.

use chrono::{Datelike, Timelike};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::features::schema::{FeatureSchema, KNOWN_TYPES};
use crate::types::TransactionRecord;

/// A model-ready numeric vector tagged with the schema it was derived under.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    schema_version: String,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn new(schema_version: &str, values: Vec<f64>) -> Self {
        Self {
            schema_version: schema_version.to_string(),
            values,
        }
    }

    /// Schema version this vector was derived under.
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Feature values in schema column order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Look up a value by schema column name.
    pub fn get(&self, schema: &FeatureSchema, column: &str) -> Option<f64> {
        schema.index_of(column).map(|i| self.values[i])
    }
}

/// Pure transaction-to-feature-vector transform for one schema version.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureTransform {
    schema: FeatureSchema,
}

impl FeatureTransform {
    pub fn new() -> Self {
        Self {
            schema: FeatureSchema::v1(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Derive the feature vector for one record.
    ///
    /// Fails with a schema error when no temporal marker is present and with
    /// a data-quality error when a monetary field is negative. The input is
    /// never mutated.
    pub fn transform(&self, record: &TransactionRecord) -> Result<FeatureVector> {
        check_non_negative("amount", record.amount)?;
        check_non_negative("oldbalanceOrg", record.oldbalance_org)?;
        check_non_negative("newbalanceOrig", record.newbalance_orig)?;
        check_non_negative("oldbalanceDest", record.oldbalance_dest)?;
        check_non_negative("newbalanceDest", record.newbalance_dest)?;
        if let Some(volume) = record.avg_daily_volume {
            check_non_negative("avgDailyVolumeSoFar", volume)?;
        }
        if let Some(ratio) = record.amount_to_avg_volume {
            check_non_negative("amountToAvgVolumeRatio", ratio)?;
        }

        let (hour_of_day, day_of_month, is_weekend) = time_features(record)?;

        let mut values = Vec::with_capacity(self.schema.len());

        // Log-scaled monetary fields; amounts are heavy-tailed.
        values.push(record.amount.ln_1p());
        values.push(record.oldbalance_org.ln_1p());
        values.push(record.newbalance_orig.ln_1p());
        values.push(record.oldbalance_dest.ln_1p());
        values.push(record.newbalance_dest.ln_1p());

        // Raw balance deltas, orig side old-new and dest side new-old.
        values.push(record.oldbalance_org - record.newbalance_orig);
        values.push(record.newbalance_dest - record.oldbalance_dest);

        // The +1 offset keeps the ratios defined for zero balances.
        values.push((record.newbalance_orig + 1.0) / (record.oldbalance_org + 1.0));
        values.push((record.newbalance_dest + 1.0) / (record.oldbalance_dest + 1.0));

        let mut matched = false;
        for known in KNOWN_TYPES {
            let hit = record.tx_type == known;
            matched |= hit;
            values.push(if hit { 1.0 } else { 0.0 });
        }
        if !matched {
            debug!(
                tx_type = %record.tx_type,
                "unknown transaction type, encoding as all-zero indicators"
            );
        }

        values.push(hour_of_day);
        values.push(day_of_month);
        values.push(is_weekend);

        values.push(record.avg_daily_volume.unwrap_or(0.0).ln_1p());
        values.push(record.amount_to_avg_volume.unwrap_or(0.0).ln_1p());
        values.push(if record.is_first_transaction.unwrap_or(false) {
            1.0
        } else {
            0.0
        });

        debug_assert_eq!(values.len(), self.schema.len());
        Ok(FeatureVector::new(self.schema.version(), values))
    }

    /// Transform a batch of records, failing on the first bad record.
    pub fn transform_batch(&self, records: &[TransactionRecord]) -> Result<Vec<FeatureVector>> {
        records.iter().map(|r| self.transform(r)).collect()
    }
}

/// Normalize either temporal marker to (hourOfDay, dayOfMonth, isWeekend).
///
/// Weekend is canonically day-of-week >= 5; on the step path the epoch day
/// index modulo 7 stands in for day-of-week.
fn time_features(record: &TransactionRecord) -> Result<(f64, f64, f64)> {
    if let Some(step) = record.step {
        let day = step / 24;
        let hour = step % 24;
        let weekend = if day % 7 >= 5 { 1.0 } else { 0.0 };
        return Ok((hour as f64, day as f64, weekend));
    }

    if let Some(ts) = record.timestamp {
        let weekend = if ts.weekday().num_days_from_monday() >= 5 {
            1.0
        } else {
            0.0
        };
        return Ok((f64::from(ts.hour()), f64::from(ts.day()), weekend));
    }

    Err(PipelineError::Schema(
        "record carries neither `step` nor `timestamp`".to_string(),
    ))
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if value < 0.0 || !value.is_finite() {
        return Err(PipelineError::DataQuality(format!(
            "{field} must be a non-negative finite number, got {value}"
        )));
    }
    Ok(())
}
