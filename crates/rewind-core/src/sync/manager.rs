//! Backup manager construction and the sync entry point

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use crate::access::FileAccess;
use crate::config::BackupConfig;
use crate::error::RewindResult;
use crate::manifest::ManifestStore;
use crate::objects::ObjectStore;
use crate::paths::join_path;
use crate::types::BackupManifest;

use super::{SyncOutcome, SyncPlan, plan_sync};

/// Snapshot and rewind engine for workspaces reachable through a
/// [`FileAccess`] collaborator
pub struct BackupManager {
    pub(super) fs: Arc<dyn FileAccess>,
    pub(super) config: BackupConfig,
}

impl BackupManager {
    /// Create a manager over a collaborator
    pub fn new(fs: Arc<dyn FileAccess>, config: BackupConfig) -> Self {
        Self { fs, config }
    }

    /// Create a manager with the default configuration
    pub fn with_defaults(fs: Arc<dyn FileAccess>) -> Self {
        Self::new(fs, BackupConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Backup directory of a workspace
    pub fn backup_dir(&self, workspace: &str) -> String {
        join_path(workspace, &self.config.backup_dir_name)
    }

    /// Object store directory of a workspace
    pub fn objects_dir(&self, workspace: &str) -> String {
        join_path(&self.backup_dir(workspace), &self.config.objects_dir_name)
    }

    /// Bring the workspace in line with `timestamp`.
    ///
    /// Rewinds when newer snapshots exist, skips when a snapshot for the
    /// timestamp exists, and snapshots otherwise. A missing workspace root
    /// is reported as [`SyncOutcome::WorkspaceUnavailable`].
    pub async fn sync_state(&self, workspace: &str, timestamp: i64) -> RewindResult<SyncOutcome> {
        if !self.workspace_available(workspace).await {
            return Ok(SyncOutcome::WorkspaceUnavailable);
        }

        let manifests = self.manifest_store(workspace);
        manifests.ensure_dir().await?;
        let existing = manifests.list_timestamps().await?;
        tracing::debug!(
            "Sync {} at {}, existing snapshots: {:?}",
            workspace,
            timestamp,
            existing
        );

        match plan_sync(&existing, timestamp) {
            SyncPlan::NoOp => {
                tracing::debug!("Snapshot {} already exists, skipping", timestamp);
                Ok(SyncOutcome::AlreadyExists)
            }
            SyncPlan::CreateNew => {
                tracing::info!("Creating snapshot {} for {}", timestamp, workspace);
                let report = self
                    .build_snapshot(workspace, &manifests, timestamp, &existing)
                    .await?;
                Ok(SyncOutcome::Created(report))
            }
            SyncPlan::Rewind { target, prune } => {
                tracing::info!(
                    "Newer snapshots found, rewinding {} to snapshot {}",
                    workspace,
                    target
                );
                let report = self
                    .restore_and_prune(workspace, &manifests, target, &prune)
                    .await?;
                Ok(SyncOutcome::Rewound(report))
            }
        }
    }

    /// Timestamps of the workspace's snapshots, ascending
    pub async fn list_snapshots(&self, workspace: &str) -> RewindResult<Vec<i64>> {
        self.manifest_store(workspace).list_timestamps().await
    }

    /// Load one snapshot manifest
    pub async fn load_manifest(&self, workspace: &str, timestamp: i64) -> Option<BackupManifest> {
        self.manifest_store(workspace).load(timestamp).await
    }

    // Internal helper methods

    pub(super) fn manifest_store(&self, workspace: &str) -> ManifestStore {
        ManifestStore::new(self.fs.clone(), self.backup_dir(workspace))
            .with_extension(self.config.manifest_extension.clone())
            .with_pretty(self.config.pretty_manifests)
    }

    pub(super) fn object_store(&self, workspace: &str) -> ObjectStore {
        ObjectStore::new(self.fs.clone(), self.objects_dir(workspace))
    }

    pub(super) async fn workspace_available(&self, workspace: &str) -> bool {
        match self.fs.exists(workspace).await {
            Ok(state) if state.is_existing_dir() => true,
            Ok(_) => {
                tracing::warn!(
                    "Workspace path does not exist or is not a directory: {}",
                    workspace
                );
                false
            }
            Err(e) => {
                tracing::warn!("Cannot check workspace {}: {}", workspace, e);
                false
            }
        }
    }

    pub(super) async fn read_bytes(&self, path: &str) -> RewindResult<Vec<u8>> {
        let encoded = self.fs.read_binary_base64(path).await?;
        Ok(STANDARD.decode(encoded)?)
    }
}
