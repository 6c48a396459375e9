//! Raw transaction records as received from upstream payment systems.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw transaction to be scored for fraud risk.
///
/// The temporal marker is either a simulator `step` (one step per hour) or a
/// calendar `timestamp`; at least one must be present for feature extraction.
/// Sender/receiver identifiers never enter the feature vector but are kept
/// for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Hour-granularity step counter (PaySim convention).
    #[serde(default)]
    pub step: Option<u64>,

    /// Calendar timestamp, accepted as an alternative to `step`.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Transaction type, e.g. "TRANSFER" or "CASH_OUT".
    #[serde(rename = "type")]
    pub tx_type: String,

    /// Monetary amount of the transaction.
    pub amount: f64,

    /// Sender account identifier (audit only).
    #[serde(default, rename = "nameOrig")]
    pub name_orig: Option<String>,

    /// Sender balance before the transaction.
    #[serde(rename = "oldbalanceOrg")]
    pub oldbalance_org: f64,

    /// Sender balance after the transaction.
    #[serde(rename = "newbalanceOrig")]
    pub newbalance_orig: f64,

    /// Receiver account identifier (audit only).
    #[serde(default, rename = "nameDest")]
    pub name_dest: Option<String>,

    /// Receiver balance before the transaction.
    #[serde(rename = "oldbalanceDest")]
    pub oldbalance_dest: f64,

    /// Receiver balance after the transaction.
    #[serde(rename = "newbalanceDest")]
    pub newbalance_dest: f64,

    /// Precomputed average daily volume for the sender, when available.
    #[serde(default, rename = "avgDailyVolumeSoFar")]
    pub avg_daily_volume: Option<f64>,

    /// Precomputed amount-to-average-volume ratio, when available.
    #[serde(default, rename = "amountToAvgVolumeRatio")]
    pub amount_to_avg_volume: Option<f64>,

    /// Whether this is the sender's first observed transaction.
    #[serde(default, rename = "isFirstTransaction")]
    pub is_first_transaction: Option<bool>,
}

impl TransactionRecord {
    /// Create a step-based record with the core monetary fields.
    pub fn new(step: u64, tx_type: &str, amount: f64) -> Self {
        Self {
            step: Some(step),
            timestamp: None,
            tx_type: tx_type.to_string(),
            amount,
            name_orig: None,
            oldbalance_org: 0.0,
            newbalance_orig: 0.0,
            name_dest: None,
            oldbalance_dest: 0.0,
            newbalance_dest: 0.0,
            avg_daily_volume: None,
            amount_to_avg_volume: None,
            is_first_transaction: None,
        }
    }

    /// Set the four balance fields.
    pub fn with_balances(
        mut self,
        oldbalance_org: f64,
        newbalance_orig: f64,
        oldbalance_dest: f64,
        newbalance_dest: f64,
    ) -> Self {
        self.oldbalance_org = oldbalance_org;
        self.newbalance_orig = newbalance_orig;
        self.oldbalance_dest = oldbalance_dest;
        self.newbalance_dest = newbalance_dest;
        self
    }

    /// Attach sender/receiver identifiers for audit logging.
    pub fn with_parties(mut self, name_orig: &str, name_dest: &str) -> Self {
        self.name_orig = Some(name_orig.to_string());
        self.name_dest = Some(name_dest.to_string());
        self
    }
}
