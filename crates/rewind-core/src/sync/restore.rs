//! Rewind: delete, restore, then prune

use crate::error::{ResultExt, RewindError, RewindResult};
use crate::filter::WorkspaceFilter;
use crate::manifest::ManifestStore;
use crate::objects::{ObjectStore, content_hash};
use crate::paths::{is_safe_relative_path, join_path, parent_of};
use crate::types::RewindReport;

use super::{BackupManager, SyncOutcome};

impl BackupManager {
    /// Restore the workspace to the snapshot at `target`, then delete that
    /// snapshot and every newer one.
    pub async fn rewind_to(&self, workspace: &str, target: i64) -> RewindResult<SyncOutcome> {
        if !self.workspace_available(workspace).await {
            return Ok(SyncOutcome::WorkspaceUnavailable);
        }

        let manifests = self.manifest_store(workspace);
        let existing = manifests.list_timestamps().await?;
        if !existing.contains(&target) {
            return Err(RewindError::not_found(format!(
                "No snapshot {} in {}",
                target,
                manifests.backup_dir()
            )));
        }

        let prune: Vec<i64> = existing.into_iter().filter(|ts| *ts >= target).collect();
        let report = self
            .restore_and_prune(workspace, &manifests, target, &prune)
            .await?;
        Ok(SyncOutcome::Rewound(report))
    }

    pub(super) async fn restore_and_prune(
        &self,
        workspace: &str,
        manifests: &ManifestStore,
        target: i64,
        prune: &[i64],
    ) -> RewindResult<RewindReport> {
        let manifest = manifests.load(target).await.ok_or_else(|| {
            RewindError::not_found(format!("Snapshot {} is missing or unreadable", target))
        })?;
        let objects = self.object_store(workspace);
        let mut report = RewindReport {
            target,
            ..Default::default()
        };

        let filter = WorkspaceFilter::load(&*self.fs, workspace, &self.config).await;
        let tracked = filter
            .list_trackable_files(&*self.fs, workspace)
            .await
            .with_context(|| format!("listing {} before rewind", workspace))?;

        tracing::debug!("Deleting tracked files absent from snapshot {}", target);
        for file in &tracked {
            if manifest.hash_of(&file.relative_path).is_some() {
                continue;
            }
            match self.fs.delete_file(&file.full_path).await {
                Ok(()) => {
                    tracing::info!("Deleted {} (not in snapshot {})", file.relative_path, target);
                    report.deleted.push(file.relative_path.clone());
                }
                Err(e) => {
                    tracing::error!("Failed to delete {}: {}", file.relative_path, e);
                    report.skipped.push((file.relative_path.clone(), e.to_string()));
                }
            }
        }

        tracing::debug!("Restoring files from snapshot {}", target);
        for (relative_path, hash) in &manifest.files {
            if !is_safe_relative_path(relative_path) {
                tracing::error!("Refusing to restore {:?}: path escapes the workspace", relative_path);
                report
                    .skipped
                    .push((relative_path.clone(), "path escapes the workspace".to_string()));
                continue;
            }
            let target_path = join_path(workspace, relative_path);
            if !self.needs_restore(&target_path, hash).await {
                report.unchanged += 1;
                continue;
            }
            match self.restore_file(&objects, &target_path, hash).await {
                Ok(()) => {
                    tracing::info!("Restored {}", relative_path);
                    report.restored.push(relative_path.clone());
                }
                Err(e) => {
                    tracing::error!("Cannot restore {} from object {}: {}", relative_path, hash, e);
                    report.skipped.push((relative_path.clone(), e.to_string()));
                }
            }
        }

        for ts in prune {
            match manifests.delete(*ts).await {
                Ok(()) => report.pruned.push(*ts),
                Err(e) => tracing::warn!("Failed to delete snapshot {}: {}", ts, e),
            }
        }

        tracing::info!(
            "Rewound to snapshot {}: deleted={} restored={} unchanged={} skipped={} pruned={:?}",
            target,
            report.deleted.len(),
            report.restored.len(),
            report.unchanged,
            report.skipped.len(),
            report.pruned
        );

        Ok(report)
    }

    /// A file needs restoring when it is absent, unreadable or differs
    async fn needs_restore(&self, path: &str, hash: &str) -> bool {
        match self.fs.exists(path).await {
            Ok(state) if state.exists => {}
            Ok(_) => return true,
            Err(e) => {
                tracing::debug!("Cannot check {}, restoring: {}", path, e);
                return true;
            }
        }

        match self.read_bytes(path).await {
            Ok(bytes) => content_hash(&bytes) != hash,
            Err(e) => {
                tracing::debug!("Cannot read {}, restoring: {}", path, e);
                true
            }
        }
    }

    async fn restore_file(&self, objects: &ObjectStore, target_path: &str, hash: &str) -> RewindResult<()> {
        let encoded = objects.read_base64(hash).await?;
        if let Some(parent) = parent_of(target_path) {
            if !parent.is_empty() {
                self.fs
                    .make_directory(parent, true)
                    .await
                    .with_context(|| format!("creating {}", parent))?;
            }
        }
        self.fs
            .write_binary_base64(target_path, &encoded)
            .await
            .context("writing restored content")
    }
}
