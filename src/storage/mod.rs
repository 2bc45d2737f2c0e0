//! Artifact persistence.
//!
//! The published dataset is a single JSON file plus a small manifest,
//! both written atomically (temp file + rename) so a concurrent reader
//! sees either the complete old artifact or the complete new one.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Artifact;

// Re-export for convenience
pub use local::LocalStorage;

/// Count summary written next to the artifact for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Timestamp of the publishing run
    pub generated_at: DateTime<Utc>,

    /// Records in the artifact
    pub record_count: usize,

    /// Brochure language variants present across all records
    pub languages_extracted: usize,

    /// Non-blocking validation warnings of the publishing run
    pub warning_count: usize,
}

impl Manifest {
    /// Summarize an artifact after validation.
    pub fn for_artifact(artifact: &Artifact, warning_count: usize) -> Self {
        Self {
            generated_at: artifact.metadata.generated_at,
            record_count: artifact.initiatives.len(),
            languages_extracted: artifact
                .initiatives
                .iter()
                .map(|r| r.brochure_texts.len())
                .sum(),
            warning_count,
        }
    }
}

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Load the previously published artifact, if any.
    async fn load_artifact(&self) -> Result<Option<Artifact>>;

    /// Atomically replace the published artifact.
    async fn write_artifact(&self, artifact: &Artifact) -> Result<()>;

    /// Atomically replace the manifest.
    async fn write_manifest(&self, manifest: &Manifest) -> Result<()>;
}
