//! Test Transaction Producer
//!
//! Generates and publishes synthetic mobile-money transactions to NATS for
//! service testing.

use rand::Rng;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

/// Synthetic transaction generator
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    step: u64,
    counter: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            step: 1,
            counter: 0,
        }
    }

    /// Generate an ordinary payment or cash-in
    fn generate_legitimate(&mut self) -> serde_json::Value {
        self.counter += 1;
        self.advance_step();

        let tx_type = self.random_choice(&["PAYMENT", "CASH_IN", "DEBIT", "TRANSFER"]);
        let amount: f64 = self.rng.gen_range(10.0..500.0);
        let old_org: f64 = self.rng.gen_range(amount..50_000.0);
        let old_dest: f64 = self.rng.gen_range(0.0..20_000.0);

        json!({
            "step": self.step,
            "type": tx_type,
            "amount": amount,
            "nameOrig": format!("C{:09}", self.counter),
            "oldbalanceOrg": old_org,
            "newbalanceOrig": old_org - amount,
            "nameDest": format!("M{:09}", self.rng.gen_range(1..1_000_000)),
            "oldbalanceDest": old_dest,
            "newbalanceDest": old_dest + amount,
        })
    }

    /// Generate an account-draining transfer or cash-out
    fn generate_suspicious(&mut self) -> serde_json::Value {
        self.counter += 1;
        self.advance_step();

        let tx_type = self.random_choice(&["TRANSFER", "CASH_OUT"]);
        let amount: f64 = self.rng.gen_range(5_000.0..500_000.0);
        let old_dest: f64 = self.rng.gen_range(0.0..1_000.0);

        json!({
            "step": self.step,
            "type": tx_type,
            // Origin account fully drained
            "amount": amount,
            "nameOrig": format!("C{:09}", self.counter),
            "oldbalanceOrg": amount,
            "newbalanceOrig": 0.0,
            "nameDest": format!("C{:09}", self.rng.gen_range(1..1_000_000)),
            "oldbalanceDest": old_dest,
            "newbalanceDest": old_dest + amount,
        })
    }

    fn advance_step(&mut self) {
        if self.rng.gen_bool(0.2) {
            self.step += 1;
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("fraud.predict");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish transactions
    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} transactions...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&transaction)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} transactions ({} legitimate, {} suspicious)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} transactions ({} legitimate, {} suspicious)",
        count, legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let transaction = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample transaction {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
