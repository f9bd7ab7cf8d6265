//! Manifest persistence
//!
//! Manifests are stored as `<backup_dir>/<timestamp>.json`. The timestamp in
//! the file name is authoritative for ordering.

use std::sync::Arc;

use crate::access::FileAccess;
use crate::error::{RewindError, RewindResult};
use crate::paths::join_path;
use crate::types::BackupManifest;

/// Reads and writes snapshot manifests through the collaborator
pub struct ManifestStore {
    fs: Arc<dyn FileAccess>,
    backup_dir: String,
    extension: String,
    pretty: bool,
}

impl ManifestStore {
    /// Create a store rooted at `backup_dir`
    pub fn new(fs: Arc<dyn FileAccess>, backup_dir: impl Into<String>) -> Self {
        Self {
            fs,
            backup_dir: backup_dir.into(),
            extension: "json".to_string(),
            pretty: false,
        }
    }

    /// Use a different manifest file extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Write indented JSON
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Backup directory holding the manifests
    pub fn backup_dir(&self) -> &str {
        &self.backup_dir
    }

    /// Path of the manifest for a timestamp
    pub fn manifest_path(&self, timestamp: i64) -> String {
        join_path(&self.backup_dir, &format!("{}.{}", timestamp, self.extension))
    }

    /// Create the backup directory
    pub async fn ensure_dir(&self) -> RewindResult<()> {
        self.fs.make_directory(&self.backup_dir, true).await
    }

    /// Timestamps of all stored manifests, ascending.
    ///
    /// Directory entries whose stem is not a canonical integer (no `+`,
    /// no leading zeros) are ignored. An unreadable backup directory lists
    /// as empty.
    pub async fn list_timestamps(&self) -> RewindResult<Vec<i64>> {
        let entries = match self.fs.list_directory(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to list backup directory {}: {}", self.backup_dir, e);
                return Ok(Vec::new());
            }
        };

        let suffix = format!(".{}", self.extension);
        let mut timestamps: Vec<i64> = entries
            .into_iter()
            .filter(|entry| !entry.is_directory)
            .filter_map(|entry| {
                entry
                    .name
                    .strip_suffix(&suffix)
                    .and_then(|stem| {
                        stem.parse::<i64>()
                            .ok()
                            .filter(|ts| ts.to_string() == stem)
                    })
            })
            .collect();

        timestamps.sort_unstable();
        timestamps.dedup();
        Ok(timestamps)
    }

    /// Load a manifest.
    ///
    /// Missing, empty or malformed manifests load as `None`; the caller then
    /// treats the snapshot as absent and rehashes everything.
    pub async fn load(&self, timestamp: i64) -> Option<BackupManifest> {
        let path = self.manifest_path(timestamp);
        let content = match self.fs.read_text(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Manifest {} not readable: {}", path, e);
                return None;
            }
        };

        if content.trim().is_empty() {
            tracing::warn!("Manifest {} is empty", path);
            return None;
        }

        match serde_json::from_str::<BackupManifest>(&content) {
            Ok(manifest) => {
                if manifest.timestamp != timestamp {
                    tracing::warn!(
                        "Manifest {} records timestamp {}, using file name",
                        path,
                        manifest.timestamp
                    );
                }
                Some(BackupManifest {
                    timestamp,
                    ..manifest
                })
            }
            Err(e) => {
                tracing::warn!("Failed to parse manifest {}: {}", path, e);
                None
            }
        }
    }

    /// Persist a manifest under its timestamp
    pub async fn save(&self, manifest: &BackupManifest) -> RewindResult<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(manifest)
        } else {
            serde_json::to_string(manifest)
        }
        .map_err(|e| RewindError::json(format!("Failed to serialize manifest: {}", e)))?;

        let path = self.manifest_path(manifest.timestamp);
        self.fs.write_text(&path, &json).await.map_err(|e| {
            RewindError::storage(format!("Failed to write manifest {}: {}", path, e))
        })?;

        tracing::debug!("Saved manifest {} ({} files)", path, manifest.file_count());
        Ok(())
    }

    /// Delete the manifest for a timestamp
    pub async fn delete(&self, timestamp: i64) -> RewindResult<()> {
        let path = self.manifest_path(timestamp);
        self.fs.delete_file(&path).await?;
        tracing::debug!("Deleted manifest {}", path);
        Ok(())
    }
}
