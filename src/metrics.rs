//! Performance metrics and statistics tracking for the fraud risk service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::info;

/// Metrics collector shared across the serving path and retraining workers.
pub struct PipelineMetrics {
    /// Total predictions served
    pub predictions_served: AtomicU64,
    /// Predictions flagged as fraud
    pub frauds_flagged: AtomicU64,
    /// Retraining jobs that reached `Succeeded`
    pub retrainings_succeeded: AtomicU64,
    /// Retraining jobs that reached `Failed`
    pub retrainings_failed: AtomicU64,
    /// Prediction latencies (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            frauds_flagged: AtomicU64::new(0),
            retrainings_succeeded: AtomicU64::new(0),
            retrainings_failed: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record one served prediction.
    pub fn record_prediction(&self, processing_time: Duration, probability: f64, flagged: bool) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if flagged {
            self.frauds_flagged.fetch_add(1, Ordering::Relaxed);
        }

        let mut times = self.processing_times.write();
        times.push(processing_time.as_micros() as u64);
        // Keep only recent samples for memory efficiency
        if times.len() > 10_000 {
            times.drain(0..5_000);
        }
        drop(times);

        let bucket = ((probability * 10.0) as usize).min(9);
        self.score_buckets.write()[bucket] += 1;
    }

    /// Record a terminal retraining outcome.
    pub fn record_retraining(&self, succeeded: bool) {
        if succeeded {
            self.retrainings_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.retrainings_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Latency percentiles over the retained window.
    pub fn processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Predictions per second since startup.
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read()
    }

    /// Log a summary of everything tracked so far.
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let flagged = self.frauds_flagged.load(Ordering::Relaxed);
        let flag_rate = if served > 0 {
            (flagged as f64 / served as f64) * 100.0
        } else {
            0.0
        };
        let stats = self.processing_stats();

        info!(
            predictions = served,
            flagged = flagged,
            flag_rate = format!("{flag_rate:.1}%"),
            throughput = format!("{:.1} tx/s", self.throughput()),
            "Serving summary"
        );
        info!(
            mean_us = stats.mean_us,
            p50_us = stats.p50_us,
            p95_us = stats.p95_us,
            p99_us = stats.p99_us,
            "Prediction latency (us)"
        );
        info!(
            succeeded = self.retrainings_succeeded.load(Ordering::Relaxed),
            failed = self.retrainings_failed.load(Ordering::Relaxed),
            "Retraining jobs"
        );

        let distribution = self.score_distribution();
        let total: u64 = distribution.iter().sum();
        if total > 0 {
            for (i, &count) in distribution.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                info!(
                    bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                    count = count,
                    pct = format!("{pct:.1}%"),
                    "Fraud probability distribution"
                );
            }
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Prediction latency statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic reporter that logs metric summaries.
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), 0.2, false);
        metrics.record_prediction(Duration::from_micros(200), 0.9, true);

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.frauds_flagged.load(Ordering::Relaxed), 1);

        let distribution = metrics.score_distribution();
        assert_eq!(distribution[2], 1);
        assert_eq!(distribution[9], 1);
    }

    #[test]
    fn test_retraining_counters() {
        let metrics = PipelineMetrics::new();
        metrics.record_retraining(true);
        metrics.record_retraining(false);
        metrics.record_retraining(false);

        assert_eq!(metrics.retrainings_succeeded.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.retrainings_failed.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = PipelineMetrics::new();
        for us in [100, 200, 300, 400, 500] {
            metrics.record_prediction(Duration::from_micros(us), 0.5, false);
        }

        let stats = metrics.processing_stats();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean_us, 300);
        assert_eq!(stats.max_us, 500);
    }
}
