//! Fraud Risk Service - Main Entry Point
//!
//! Serves fraud predictions from NATS requests and runs asynchronous model
//! retraining in the background. Supports parallel prediction processing.

use anyhow::Result;
use fraud_risk_service::{
    config::AppConfig,
    consumer::RequestConsumer,
    features::FeatureSchema,
    metrics::{MetricsReporter, PipelineMetrics},
    model::{ActiveModel, ArtifactStore, ModelArtifact},
    producer::DecisionProducer,
    retraining::{RetrainAck, RetrainRequest, RetrainingOrchestrator, StatusRequest},
    serving::PredictionService,
    types::TransactionRecord,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

const PREDICTION_WORKERS: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_risk_service={}", config.logging.level).parse()?);
    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Fraud Risk Service");
    info!(
        threshold = config.model.threshold,
        artifacts_dir = %config.model.artifacts_dir,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Open the artifact store and promote the latest artifact for serving
    let store = Arc::new(ArtifactStore::open(&config.model.artifacts_dir)?);
    let active = Arc::new(ActiveModel::empty());
    match store.load_latest() {
        Ok(artifact) => {
            info!(created_at = %artifact.created_at(), "Loaded latest model artifact");
            active.promote(artifact);
        }
        Err(e) if config.model.bootstrap_if_missing => {
            warn!(error = %e, "No artifact found, bootstrapping an untrained model");
            let artifact =
                ModelArtifact::bootstrap(&FeatureSchema::v1(), config.model.threshold);
            store.save(&artifact)?;
            active.promote(artifact);
        }
        Err(e) => return Err(e.into()),
    }

    // Start the retraining orchestrator
    let orchestrator = Arc::new(RetrainingOrchestrator::start(
        &config.retraining,
        store.clone(),
        active.clone(),
        metrics.clone(),
    )?);

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!(url = %config.nats.url, "Connected to NATS");

    let predictions =
        RequestConsumer::<TransactionRecord>::new(client.clone(), &config.nats.prediction_subject);
    let retrains =
        RequestConsumer::<RetrainRequest>::new(client.clone(), &config.nats.retrain_subject);
    let statuses =
        RequestConsumer::<StatusRequest>::new(client.clone(), &config.nats.status_subject);
    let producer = Arc::new(DecisionProducer::new(
        client.clone(),
        &config.nats.decision_subject,
    ));

    let service = Arc::new(PredictionService::new(active.clone()));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Retraining submission handler
    let mut retrain_sub = retrains.subscribe().await?;
    let retrain_client = client.clone();
    let retrain_orchestrator = orchestrator.clone();
    tokio::spawn(async move {
        while let Some(request) = retrain_sub.next().await {
            let ack = match retrain_orchestrator.submit(Path::new(&request.body.dataset_path)) {
                Ok(task_id) => serde_json::to_vec(&RetrainAck::started(task_id)).ok(),
                Err(e) => {
                    warn!(error = %e, "Retraining submission rejected");
                    serde_json::to_vec(&serde_json::json!({ "error": e.to_string() })).ok()
                }
            };
            if let (Some(reply), Some(payload)) = (request.reply, ack) {
                if let Err(e) = retrain_client.publish(reply, payload.into()).await {
                    error!(error = %e, "Failed to acknowledge retraining submission");
                }
            }
        }
    });

    // Task status request/reply handler
    let mut status_sub = statuses.subscribe().await?;
    let status_client = client.clone();
    let status_registry = orchestrator.registry().clone();
    tokio::spawn(async move {
        while let Some(request) = status_sub.next().await {
            let Some(reply) = request.reply else {
                continue;
            };
            let status = status_registry.get(&request.body.task_id);
            match serde_json::to_vec(&status) {
                Ok(payload) => {
                    if let Err(e) = status_client.publish(reply, payload.into()).await {
                        error!(error = %e, "Failed to reply with task status");
                    }
                }
                Err(e) => error!(error = %e, "Failed to serialize task status"),
            }
        }
    });

    // Parallel prediction loop
    info!(
        subject = %config.nats.prediction_subject,
        workers = PREDICTION_WORKERS,
        "Starting prediction processing loop"
    );
    let semaphore = Arc::new(Semaphore::new(PREDICTION_WORKERS));
    let mut subscription = predictions.subscribe().await?;

    while let Some(request) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let service = service.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let client = client.clone();

        tokio::spawn(async move {
            match service.predict_timed(&request.body) {
                Ok((decision, elapsed)) => {
                    metrics.record_prediction(
                        elapsed,
                        decision.fraud_probability,
                        decision.prediction,
                    );

                    // Reply directly when requested, publish otherwise.
                    if let Some(reply) = request.reply {
                        match serde_json::to_vec(&decision) {
                            Ok(payload) => {
                                if let Err(e) = client.publish(reply, payload.into()).await {
                                    error!(error = %e, "Failed to reply with decision");
                                }
                            }
                            Err(e) => error!(error = %e, "Failed to serialize decision"),
                        }
                    } else if let Err(e) = producer.publish(&decision).await {
                        error!(error = %e, "Failed to publish decision");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Prediction failed");
                }
            }

            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
