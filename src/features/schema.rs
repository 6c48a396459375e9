//! Versioned feature schema shared by the transform and model artifacts.
//!
//! The underlying model is positional, so the column order here is part of
//! the contract: a schema version identifies one exact derivation and
//! ordering. Changing either requires a new version, never an in-place edit.

/// Current schema version identifier.
pub const SCHEMA_V1: &str = "v1";

/// Closed set of transaction types with dedicated one-hot columns.
///
/// Unknown types degrade to all-zero indicators instead of failing so that
/// new transaction types do not block serving.
pub const KNOWN_TYPES: [&str; 5] = ["TRANSFER", "CASH_OUT", "PAYMENT", "DEBIT", "CASH_IN"];

/// Column names for schema v1, in model input order.
const COLUMNS_V1: [&str; 20] = [
    "amount_log",
    "oldbalanceOrg_log",
    "newbalanceOrig_log",
    "oldbalanceDest_log",
    "newbalanceDest_log",
    "balanceDiffOrig",
    "balanceDiffDest",
    "origBalanceRatio",
    "destBalanceRatio",
    "type_TRANSFER",
    "type_CASH_OUT",
    "type_PAYMENT",
    "type_DEBIT",
    "type_CASH_IN",
    "hourOfDay",
    "dayOfMonth",
    "isWeekend",
    "avgDailyVolume_log",
    "amountToAvgVolume_log",
    "isFirstTransaction",
];

/// A fixed, versioned feature layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    version: &'static str,
    columns: &'static [&'static str],
}

impl FeatureSchema {
    /// The canonical v1 schema.
    pub fn v1() -> Self {
        Self {
            version: SCHEMA_V1,
            columns: &COLUMNS_V1,
        }
    }

    /// Schema version identifier recorded in model artifacts.
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Column names in model input order.
    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    /// Number of feature columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == name)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_column_count() {
        let schema = FeatureSchema::v1();
        assert_eq!(schema.len(), 20);
        assert_eq!(schema.version(), "v1");
    }

    #[test]
    fn test_one_hot_columns_cover_known_types() {
        let schema = FeatureSchema::v1();
        for tx_type in KNOWN_TYPES {
            let column = format!("type_{tx_type}");
            assert!(
                schema.index_of(&column).is_some(),
                "missing one-hot column for {tx_type}"
            );
        }
    }

    #[test]
    fn test_index_of_is_positional() {
        let schema = FeatureSchema::v1();
        assert_eq!(schema.index_of("amount_log"), Some(0));
        assert_eq!(schema.index_of("balanceDiffOrig"), Some(5));
        assert_eq!(schema.index_of("hourOfDay"), Some(14));
        assert_eq!(schema.index_of("no_such_column"), None);
    }
}
