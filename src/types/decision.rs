//! Structured prediction decisions returned to callers.

use serde::{Deserialize, Serialize};

/// Outcome of scoring a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Thresholded fraud verdict.
    pub prediction: bool,

    /// Positive-class probability in [0, 1], rounded to 4 decimals.
    pub fraud_probability: f64,

    /// Wall-clock scoring time in seconds, rounded to 3 decimals.
    pub processing_time: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_serialization() {
        let decision = Decision {
            prediction: true,
            fraud_probability: 0.9731,
            processing_time: 0.002,
        };

        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"fraud_probability\":0.9731"));

        let back: Decision = serde_json::from_str(&json).unwrap();
        assert!(back.prediction);
        assert_eq!(back.processing_time, 0.002);
    }
}
