//! The statistical model behind the artifact surface.
//!
//! A binary logistic regression trained by deterministic full-pass SGD.
//! Sample order is preserved and no randomness is involved, so a given
//! (weights, data) pair always trains to the same result.

use serde::{Deserialize, Serialize};

/// Logistic regression over a fixed-width feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    bias: f64,
    learning_rate: f64,
    l2_reg: f64,
    epochs: u32,
}

impl LogisticModel {
    /// A zero-initialized model for `dim` features.
    pub fn new(dim: usize) -> Self {
        Self {
            weights: vec![0.0; dim],
            bias: 0.0,
            learning_rate: 0.05,
            l2_reg: 0.001,
            epochs: 50,
        }
    }

    /// Number of input features this model expects.
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Positive-class probability for one sample.
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.weights.len());
        let logit: f64 = self
            .weights
            .iter()
            .zip(x.iter())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias;
        sigmoid(logit)
    }

    /// Return a newly trained model; `self` is left untouched.
    pub fn fitted(&self, xs: &[&[f64]], ys: &[bool]) -> LogisticModel {
        let mut model = self.clone();
        for _ in 0..model.epochs {
            for (x, &y) in xs.iter().zip(ys.iter()) {
                model.step(x, y);
            }
        }
        model
    }

    fn step(&mut self, x: &[f64], y: bool) {
        let target = if y { 1.0 } else { 0.0 };
        let error = self.predict_proba(x) - target;
        for (w, &v) in self.weights.iter_mut().zip(x.iter()) {
            *w -= self.learning_rate * (error * v + self.l2_reg * *w);
        }
        self.bias -= self.learning_rate * error;
    }

    /// Held-out accuracy at the 0.5 probability cut.
    pub fn accuracy(&self, xs: &[&[f64]], ys: &[bool]) -> f64 {
        if xs.is_empty() {
            return 0.0;
        }
        let correct = xs
            .iter()
            .zip(ys.iter())
            .filter(|(x, &y)| (self.predict_proba(x) > 0.5) == y)
            .count();
        correct as f64 / xs.len() as f64
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
