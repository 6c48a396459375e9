//! Durable artifact storage and the swappable serving reference.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::artifact::ModelArtifact;

const ARTIFACT_PREFIX: &str = "fraud_model";
const ARTIFACT_EXT: &str = "json";

/// Directory of versioned model artifacts.
///
/// File names embed the creation timestamp at microsecond precision, so
/// names are unique across concurrent retraining jobs and sort by recency.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if needed) an artifact directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an artifact under a fresh versioned name and return its path.
    /// Existing artifacts are never overwritten.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        let stamp = artifact.created_at().format("%Y%m%d_%H%M%S_%6f");
        let base = format!(
            "{ARTIFACT_PREFIX}_{}_{stamp}",
            artifact.schema_version()
        );

        // Timestamps are microsecond-precise; the counter only matters if
        // two saves of the same artifact instant collide.
        for attempt in 0..10 {
            let name = if attempt == 0 {
                format!("{base}.{ARTIFACT_EXT}")
            } else {
                format!("{base}_{attempt}.{ARTIFACT_EXT}")
            };
            let path = self.dir.join(name);
            match artifact.save(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "Persisted model artifact");
                    return Ok(path);
                }
                Err(PipelineError::Io(e))
                    if e.kind() == std::io::ErrorKind::AlreadyExists =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not allocate a unique artifact name",
        )))
    }

    /// Path of the most recent artifact, if any.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        let mut newest: Option<PathBuf> = None;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_artifact = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(ARTIFACT_PREFIX) && n.ends_with(ARTIFACT_EXT))
                .unwrap_or(false);
            if !is_artifact {
                continue;
            }
            // Timestamped names sort lexicographically by recency.
            if newest.as_ref().map(|n| path > *n).unwrap_or(true) {
                newest = Some(path);
            }
        }
        Ok(newest)
    }

    /// Load the most recent artifact, failing if the store is empty.
    pub fn load_latest(&self) -> Result<ModelArtifact> {
        match self.latest()? {
            Some(path) => ModelArtifact::load(&path),
            None => Err(PipelineError::ArtifactNotFound(format!(
                "no artifacts in {}",
                self.dir.display()
            ))),
        }
    }
}

/// The artifact currently used for live serving.
///
/// Reads are lock-light and always observe a fully consistent artifact;
/// promotion swaps the whole `Arc` and never mutates fields in place.
#[derive(Default)]
pub struct ActiveModel {
    current: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ActiveModel {
    /// A handle with no artifact loaded yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(artifact))),
        }
    }

    /// The artifact serving traffic right now.
    pub fn current(&self) -> Option<Arc<ModelArtifact>> {
        self.current.read().clone()
    }

    /// Explicitly promote an artifact to serve live traffic.
    pub fn promote(&self, artifact: ModelArtifact) {
        let created_at = artifact.created_at();
        *self.current.write() = Some(Arc::new(artifact));
        info!(created_at = %created_at, "Promoted model artifact to active");
    }
}
