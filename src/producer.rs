//! NATS message producer for fraud decisions

use crate::types::Decision;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing scoring decisions to NATS
#[derive(Clone)]
pub struct DecisionProducer {
    client: Client,
    subject: String,
}

impl DecisionProducer {
    /// Create a new decision producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a scoring decision
    pub async fn publish(&self, decision: &Decision) -> Result<()> {
        let payload = serde_json::to_vec(decision)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            fraud = decision.prediction,
            probability = decision.fraud_probability,
            "Published decision"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
