//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {output}/
//! ├── initiatives.json      # The published dataset
//! └── manifest.json         # Count summary of the last publish
//! ```
//!
//! Writes go to a sibling temp file first and are renamed into place, so
//! a killed run never leaves a half-written artifact behind.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Artifact, PathsConfig};
use crate::storage::{ArtifactStore, Manifest};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    artifact_file: String,
    manifest_file: String,
}

impl LocalStorage {
    /// Create a storage rooted at the given directory with default names.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::from_paths(&PathsConfig {
            output: root_dir.into(),
            ..PathsConfig::default()
        })
    }

    /// Create a storage from the configured paths.
    pub fn from_paths(paths: &PathsConfig) -> Self {
        Self {
            root_dir: paths.output.clone(),
            artifact_file: paths.artifact_file.clone(),
            manifest_file: paths.manifest_file.clone(),
        }
    }

    /// Full path of the published artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.root_dir.join(&self.artifact_file)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        // flush only empties the userspace buffer; the rename must not
        // land before the data is on disk
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalStorage {
    async fn load_artifact(&self) -> Result<Option<Artifact>> {
        self.read_json(&self.artifact_file).await
    }

    async fn write_artifact(&self, artifact: &Artifact) -> Result<()> {
        self.write_json(&self.artifact_file, artifact).await
    }

    async fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        self.write_json(&self.manifest_file, manifest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InitiativeRecord;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(vote_id: &str) -> InitiativeRecord {
        InitiativeRecord {
            vote_id: vote_id.to_string(),
            official_number: vote_id.to_string(),
            title: "Initiative für eine Zukunft".to_string(),
            keyword: None,
            voting_date: "30.11.2025".to_string(),
            legal_form: None,
            policy_area: None,
            initiators: Vec::new(),
            signature_count: None,
            federal_council_position: None,
            parliament_position: None,
            party_recommendations: BTreeMap::new(),
            brochure_pdf_url: None,
            initiative_text_pdf_url: None,
            federal_council_message_pdf_url: None,
            description_url: None,
            brochure_texts: BTreeMap::from([("de".to_string(), "Text".to_string())]),
            details_url: "https://swissvotes.ch/vote/681".to_string(),
            last_verified: Utc::now(),
        }
    }

    #[tokio::test]
    async fn write_and_read_bytes() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn read_nonexistent_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.load_artifact().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn artifact_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let artifact = Artifact::new(vec![record("681")], "1.0", vec![]);
        storage.write_artifact(&artifact).await.unwrap();

        let loaded = storage.load_artifact().await.unwrap().unwrap();
        assert_eq!(loaded.initiatives.len(), 1);
        assert_eq!(loaded.initiatives[0].vote_id, "681");
        assert_eq!(
            loaded.initiatives[0].brochure_texts.get("de").map(String::as_str),
            Some("Text")
        );
    }

    #[tokio::test]
    async fn rewrite_replaces_whole_artifact() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let first = Artifact::new(vec![record("681"), record("682")], "1.0", vec![]);
        storage.write_artifact(&first).await.unwrap();

        let second = Artifact::new(vec![record("681")], "1.0", vec![]);
        storage.write_artifact(&second).await.unwrap();

        let loaded = storage.load_artifact().await.unwrap().unwrap();
        assert_eq!(loaded.initiatives.len(), 1);
        // no temp file left behind
        assert!(!tmp.path().join("initiatives.tmp").exists());
    }

    #[tokio::test]
    async fn manifest_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let artifact = Artifact::new(vec![record("681")], "1.0", vec![]);
        let manifest = Manifest::for_artifact(&artifact, 2);
        storage.write_manifest(&manifest).await.unwrap();

        let loaded: Manifest = storage.read_json("manifest.json").await.unwrap().unwrap();
        assert_eq!(loaded.record_count, 1);
        assert_eq!(loaded.languages_extracted, 1);
        assert_eq!(loaded.warning_count, 2);
    }
}
