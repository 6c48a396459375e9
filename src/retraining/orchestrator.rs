//! Asynchronous retraining orchestration.
//!
//! Submission stages the dataset, registers the job as `Pending`, and
//! returns a task id without waiting for execution. A dispatcher drains the
//! job queue; a semaphore bounds how many jobs run at once; each job body is
//! blocking work and runs on the blocking pool under a wall-clock budget.
//! Every error becomes a terminal `Failed` status in the registry; nothing
//! escapes a worker. A job that succeeds saves a new candidate artifact;
//! promoting a candidate to live serving is a separate, explicit operation,
//! so no retraining outcome can degrade the model serving traffic.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::RetrainingConfig;
use crate::error::{PipelineError, Result};
use crate::features::FeatureTransform;
use crate::metrics::PipelineMetrics;
use crate::model::{ActiveModel, ArtifactStore};
use crate::retraining::dataset::Dataset;
use crate::retraining::job::{JobStatus, RetrainReport, RetrainingJob};
use crate::retraining::registry::TaskStatusRegistry;

/// Shared state handed to the dispatcher and its workers.
struct WorkerContext {
    registry: TaskStatusRegistry,
    store: Arc<ArtifactStore>,
    active: Arc<ActiveModel>,
    metrics: Arc<PipelineMetrics>,
    validation_fraction: f64,
    split_seed: u64,
    job_timeout_secs: u64,
}

/// Accepts retraining submissions and runs them on a background worker pool.
pub struct RetrainingOrchestrator {
    queue: mpsc::Sender<RetrainingJob>,
    registry: TaskStatusRegistry,
    staging_dir: PathBuf,
}

impl RetrainingOrchestrator {
    /// Start the orchestrator and its dispatcher task. Must be called from
    /// within a tokio runtime.
    pub fn start(
        config: &RetrainingConfig,
        store: Arc<ArtifactStore>,
        active: Arc<ActiveModel>,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self> {
        let staging_dir = PathBuf::from(&config.staging_dir);
        fs::create_dir_all(&staging_dir)?;

        let registry = TaskStatusRegistry::new();
        let (queue, rx) = mpsc::channel(config.queue_depth.max(1));

        let context = Arc::new(WorkerContext {
            registry: registry.clone(),
            store,
            active,
            metrics,
            validation_fraction: config.validation_fraction,
            split_seed: config.split_seed,
            job_timeout_secs: config.job_timeout_secs,
        });

        let workers = config.workers.max(1);
        tokio::spawn(dispatch(rx, context, workers));
        info!(workers, staging_dir = %staging_dir.display(), "Retraining orchestrator started");

        Ok(Self {
            queue,
            registry,
            staging_dir,
        })
    }

    /// Registry view for status queries.
    pub fn registry(&self) -> &TaskStatusRegistry {
        &self.registry
    }

    /// Stage a dataset and enqueue a retraining job, returning its task id
    /// immediately. Structurally invalid references and staging failures are
    /// rejected here, before the job ever becomes `Pending`.
    pub fn submit(&self, dataset: &Path) -> Result<String> {
        let is_csv = dataset
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv {
            return Err(PipelineError::InvalidReference(format!(
                "{} is not a .csv file",
                dataset.display()
            )));
        }
        if !dataset.is_file() {
            return Err(PipelineError::InvalidReference(format!(
                "{} does not exist",
                dataset.display()
            )));
        }

        // Reserve queue capacity before creating any observable state.
        let permit = self
            .queue
            .try_reserve()
            .map_err(|_| PipelineError::QueueFull)?;

        let task_id = Uuid::new_v4().to_string();
        let staged = self.staging_dir.join(format!("{task_id}.csv"));
        fs::copy(dataset, &staged)?;

        self.registry.set(&task_id, JobStatus::Pending);
        permit.send(RetrainingJob {
            task_id: task_id.clone(),
            dataset_path: staged,
            submitted_at: Utc::now(),
        });

        info!(task_id = %task_id, dataset = %dataset.display(), "Retraining job queued");
        Ok(task_id)
    }
}

/// Pull jobs off the queue, bounding concurrency with a semaphore.
async fn dispatch(
    mut rx: mpsc::Receiver<RetrainingJob>,
    context: Arc<WorkerContext>,
    workers: usize,
) {
    let semaphore = Arc::new(Semaphore::new(workers));
    while let Some(job) = rx.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let context = context.clone();
        tokio::spawn(async move {
            execute(job, context).await;
            drop(permit);
        });
    }
}

/// Run one claimed job to a terminal state.
async fn execute(job: RetrainingJob, context: Arc<WorkerContext>) {
    context.registry.set(&job.task_id, JobStatus::Running);
    info!(
        task_id = %job.task_id,
        dataset = %job.dataset_path.display(),
        "Retraining job started"
    );

    let store = context.store.clone();
    let active = context.active.clone();
    let dataset_path = job.dataset_path.clone();
    let validation_fraction = context.validation_fraction;
    let split_seed = context.split_seed;

    let outcome = tokio::time::timeout(
        Duration::from_secs(context.job_timeout_secs),
        tokio::task::spawn_blocking(move || {
            run_retraining(&dataset_path, &store, &active, validation_fraction, split_seed)
        }),
    )
    .await;

    let status = match outcome {
        Err(_) => JobStatus::Failed(PipelineError::Timeout(context.job_timeout_secs).to_string()),
        Ok(Err(join_error)) => {
            JobStatus::Failed(format!("retraining worker crashed: {join_error}"))
        }
        Ok(Ok(Err(e))) => JobStatus::Failed(e.to_string()),
        Ok(Ok(Ok(report))) => JobStatus::Succeeded(report),
    };

    match &status {
        JobStatus::Succeeded(report) => {
            context.metrics.record_retraining(true);
            info!(
                task_id = %job.task_id,
                data_size = report.data_size,
                validation_score = report.validation_score,
                model_path = %report.model_path,
                "Retraining job succeeded"
            );
        }
        JobStatus::Failed(message) => {
            context.metrics.record_retraining(false);
            error!(task_id = %job.task_id, error = %message, "Retraining job failed");
        }
        _ => {}
    }
    context.registry.set(&job.task_id, status);

    // The staged copy served its purpose; the job record stays for audit.
    if let Err(e) = fs::remove_file(&job.dataset_path) {
        warn!(
            task_id = %job.task_id,
            error = %e,
            "Could not remove staged dataset copy"
        );
    }
}

/// The blocking body of a retraining job.
///
/// The refit baseline is whatever artifact is active when the job starts;
/// concurrent jobs may share a baseline, which is fine because each writes
/// its own versioned output and none of them touches the active reference.
fn run_retraining(
    dataset_path: &Path,
    store: &ArtifactStore,
    active: &ActiveModel,
    validation_fraction: f64,
    split_seed: u64,
) -> Result<RetrainReport> {
    let dataset = Dataset::load_csv(dataset_path)?;
    if dataset.len() < 2 {
        return Err(PipelineError::DataQuality(format!(
            "dataset has {} rows, need at least 2 for a train/validation split",
            dataset.len()
        )));
    }

    let base = active.current().ok_or_else(|| {
        PipelineError::ArtifactNotFound("no active model artifact loaded".to_string())
    })?;

    let (train, validation) = dataset.split(validation_fraction, split_seed);

    let transform = FeatureTransform::new();
    let train_features = transform.transform_batch(&train.records)?;
    let validation_features = transform.transform_batch(&validation.records)?;

    let refit = base.fit(&train_features, &train.labels)?;
    let validation_score = refit.score(&validation_features, &validation.labels)?;
    let model_path = store.save(&refit)?;

    Ok(RetrainReport {
        data_size: dataset.len(),
        validation_score,
        model_path: model_path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSchema;
    use crate::model::{ModelArtifact, DEFAULT_THRESHOLD};
    use std::io::Write;

    const CSV_HEADER: &str = "step,type,amount,nameOrig,oldbalanceOrg,newbalanceOrig,nameDest,oldbalanceDest,newbalanceDest,isFraud";

    struct Env {
        _artifacts: tempfile::TempDir,
        data_dir: tempfile::TempDir,
        orchestrator: RetrainingOrchestrator,
    }

    fn start_env(active: ActiveModel) -> Env {
        start_env_with(active, |_| {})
    }

    fn start_env_with(active: ActiveModel, tweak: impl FnOnce(&mut RetrainingConfig)) -> Env {
        let artifacts = tempfile::tempdir().unwrap();
        let data_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ArtifactStore::open(artifacts.path()).unwrap());

        let mut config = RetrainingConfig {
            workers: 2,
            queue_depth: 8,
            staging_dir: data_dir.path().join("staging").display().to_string(),
            validation_fraction: 0.2,
            split_seed: 42,
            job_timeout_secs: 60,
        };
        tweak(&mut config);

        let orchestrator = RetrainingOrchestrator::start(
            &config,
            store,
            Arc::new(active),
            Arc::new(PipelineMetrics::new()),
        )
        .unwrap();

        Env {
            _artifacts: artifacts,
            data_dir,
            orchestrator,
        }
    }

    fn active_with_bootstrap() -> ActiveModel {
        ActiveModel::with_artifact(ModelArtifact::bootstrap(
            &FeatureSchema::v1(),
            DEFAULT_THRESHOLD,
        ))
    }

    fn write_dataset(dir: &Path, name: &str, rows: usize) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{CSV_HEADER}").unwrap();
        for i in 0..rows {
            if i % 2 == 0 {
                writeln!(
                    file,
                    "{i},TRANSFER,{amt},C{i},{amt},0.0,M{i},0.0,{amt},1",
                    amt = 800.0 + i as f64
                )
                .unwrap();
            } else {
                writeln!(file, "{i},PAYMENT,20.0,C{i},500.0,480.0,M{i},100.0,120.0,0").unwrap();
            }
        }
        path
    }

    async fn wait_terminal(registry: &TaskStatusRegistry, task_id: &str) -> JobStatus {
        for _ in 0..500 {
            let status = registry.get(task_id);
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {task_id} did not reach a terminal state");
    }

    #[tokio::test]
    async fn test_submit_rejects_wrong_extension() {
        let env = start_env(active_with_bootstrap());
        let bogus = env.data_dir.path().join("data.parquet");
        std::fs::write(&bogus, b"not csv").unwrap();

        assert!(matches!(
            env.orchestrator.submit(&bogus),
            Err(PipelineError::InvalidReference(_))
        ));
        assert!(env.orchestrator.registry().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_file() {
        let env = start_env(active_with_bootstrap());
        let missing = env.data_dir.path().join("missing.csv");

        assert!(matches!(
            env.orchestrator.submit(&missing),
            Err(PipelineError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_successful_retraining_job() {
        let env = start_env(active_with_bootstrap());
        let dataset = write_dataset(env.data_dir.path(), "train.csv", 20);

        let task_id = env.orchestrator.submit(&dataset).unwrap();
        let status = wait_terminal(env.orchestrator.registry(), &task_id).await;

        match status {
            JobStatus::Succeeded(report) => {
                assert_eq!(report.data_size, 20);
                assert!((0.0..=1.0).contains(&report.validation_score));
                assert!(Path::new(&report.model_path).exists());
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_label_column_fails_with_column_names() {
        let env = start_env(active_with_bootstrap());
        let path = env.data_dir.path().join("unlabeled.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "step,type,amount,nameOrig,oldbalanceOrg,newbalanceOrig,nameDest,oldbalanceDest,newbalanceDest"
        )
        .unwrap();
        writeln!(file, "1,TRANSFER,10.0,C1,10.0,0.0,M1,0.0,10.0").unwrap();
        drop(file);

        let task_id = env.orchestrator.submit(&path).unwrap();
        let status = wait_terminal(env.orchestrator.registry(), &task_id).await;

        match status {
            JobStatus::Failed(message) => assert!(message.contains("isFraud"), "{message}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_active_artifact_fails_job() {
        let env = start_env(ActiveModel::empty());
        let dataset = write_dataset(env.data_dir.path(), "train.csv", 10);

        let task_id = env.orchestrator.submit(&dataset).unwrap();
        let status = wait_terminal(env.orchestrator.registry(), &task_id).await;

        match status {
            JobStatus::Failed(message) => {
                assert!(message.contains("artifact not found"), "{message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_jobs_produce_distinct_artifacts() {
        let env = start_env(active_with_bootstrap());
        let first = write_dataset(env.data_dir.path(), "first.csv", 16);
        let second = write_dataset(env.data_dir.path(), "second.csv", 24);

        let id_a = env.orchestrator.submit(&first).unwrap();
        let id_b = env.orchestrator.submit(&second).unwrap();
        assert_ne!(id_a, id_b);

        let status_a = wait_terminal(env.orchestrator.registry(), &id_a).await;
        let status_b = wait_terminal(env.orchestrator.registry(), &id_b).await;

        let (JobStatus::Succeeded(report_a), JobStatus::Succeeded(report_b)) =
            (status_a, status_b)
        else {
            panic!("expected both jobs to complete");
        };
        assert_ne!(report_a.model_path, report_b.model_path);
        assert!(Path::new(&report_a.model_path).exists());
        assert!(Path::new(&report_b.model_path).exists());
        assert_eq!(report_a.data_size, 16);
        assert_eq!(report_b.data_size, 24);
    }

    #[tokio::test]
    async fn test_timeout_breach_fails_job() {
        let env = start_env_with(active_with_bootstrap(), |config| {
            config.job_timeout_secs = 0;
        });
        let dataset = write_dataset(env.data_dir.path(), "big.csv", 2000);

        let task_id = env.orchestrator.submit(&dataset).unwrap();
        let status = wait_terminal(env.orchestrator.registry(), &task_id).await;

        match status {
            JobStatus::Failed(message) => assert!(message.contains("timed out"), "{message}"),
            other => panic!("expected timeout failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submission() {
        let env = start_env_with(active_with_bootstrap(), |config| {
            config.queue_depth = 1;
        });
        let dataset = write_dataset(env.data_dir.path(), "train.csv", 8);

        // No await point between the two submissions, so the dispatcher
        // cannot drain the single-slot queue in between.
        let first = env.orchestrator.submit(&dataset);
        assert!(first.is_ok());

        let second = env.orchestrator.submit(&dataset);
        assert!(matches!(second, Err(PipelineError::QueueFull)));

        // The accepted job is tracked; the rejected one left no record.
        assert_eq!(env.orchestrator.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_task_id_reports_unknown() {
        let env = start_env(active_with_bootstrap());
        assert_eq!(
            env.orchestrator.registry().get("never-submitted"),
            JobStatus::Unknown
        );
    }

    #[tokio::test]
    async fn test_negative_amount_in_dataset_fails_job() {
        let env = start_env(active_with_bootstrap());
        let path = env.data_dir.path().join("dirty.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{CSV_HEADER}").unwrap();
        writeln!(file, "1,TRANSFER,-50.0,C1,10.0,0.0,M1,0.0,10.0,1").unwrap();
        writeln!(file, "2,PAYMENT,20.0,C2,500.0,480.0,M2,100.0,120.0,0").unwrap();
        drop(file);

        let task_id = env.orchestrator.submit(&path).unwrap();
        let status = wait_terminal(env.orchestrator.registry(), &task_id).await;

        match status {
            JobStatus::Failed(message) => {
                assert!(message.contains("data quality"), "{message}")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
