//! Typed NATS subscriptions for the service's inbound subjects.
//!
//! Each subject carries exactly one request payload type, so decoding lives
//! here instead of being repeated at every call site. A malformed payload is
//! logged and skipped; one bad client must not wedge a subject.

use std::marker::PhantomData;

use anyhow::Result;
use async_nats::{Client, Subject, Subscriber};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

/// A decoded inbound request and the reply subject it arrived with.
pub struct InboundRequest<T> {
    pub body: T,
    pub reply: Option<Subject>,
}

/// Consumer binding one subject to one request payload type.
pub struct RequestConsumer<T> {
    client: Client,
    subject: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RequestConsumer<T> {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
            _payload: PhantomData,
        }
    }

    /// Subscribe to the bound subject.
    pub async fn subscribe(&self) -> Result<RequestStream<T>> {
        let inner = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed");
        Ok(RequestStream {
            inner,
            subject: self.subject.clone(),
            _payload: PhantomData,
        })
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// A live subscription yielding decoded requests.
pub struct RequestStream<T> {
    inner: Subscriber,
    subject: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RequestStream<T> {
    /// Next well-formed request, or `None` once the subscription closes.
    pub async fn next(&mut self) -> Option<InboundRequest<T>> {
        while let Some(message) = self.inner.next().await {
            if let Some(body) = decode(&self.subject, &message.payload) {
                return Some(InboundRequest {
                    body,
                    reply: message.reply,
                });
            }
        }
        None
    }
}

fn decode<T: DeserializeOwned>(subject: &str, payload: &[u8]) -> Option<T> {
    match serde_json::from_slice(payload) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(subject = %subject, error = %e, "Discarding malformed request");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retraining::{RetrainRequest, StatusRequest};
    use crate::types::TransactionRecord;

    #[test]
    fn test_decode_transaction_payload() {
        let payload = br#"{
            "step": 5,
            "type": "TRANSFER",
            "amount": 1000.0,
            "oldbalanceOrg": 5000.0,
            "newbalanceOrig": 4000.0,
            "oldbalanceDest": 0.0,
            "newbalanceDest": 1000.0
        }"#;

        let record: TransactionRecord = decode("fraud.predict", payload).unwrap();
        assert_eq!(record.step, Some(5));
        assert_eq!(record.tx_type, "TRANSFER");
        assert_eq!(record.oldbalance_org, 5000.0);
    }

    #[test]
    fn test_decode_retrain_and_status_payloads() {
        let retrain: RetrainRequest = decode(
            "fraud.retrain.submit",
            br#"{"dataset_path":"/data/january.csv"}"#,
        )
        .unwrap();
        assert_eq!(retrain.dataset_path, "/data/january.csv");

        let status: StatusRequest =
            decode("fraud.retrain.status", br#"{"task_id":"abc-123"}"#).unwrap();
        assert_eq!(status.task_id, "abc-123");
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        assert!(decode::<TransactionRecord>("fraud.predict", b"not json").is_none());
        assert!(decode::<StatusRequest>("fraud.retrain.status", br#"{"wrong":1}"#).is_none());
    }
}
