//! Snapshot creation

use std::time::Instant;

use crate::detector::{ChangeDetector, FileOutcome};
use crate::error::{ResultExt, RewindResult};
use crate::filter::WorkspaceFilter;
use crate::manifest::ManifestStore;
use crate::types::{BackupManifest, SnapshotReport};

use super::{BackupManager, SyncOutcome};

impl BackupManager {
    /// Take a snapshot at `timestamp` unless one already exists.
    ///
    /// Unlike [`sync_state`](Self::sync_state) this never rewinds, even when
    /// newer snapshots exist.
    pub async fn create_snapshot(&self, workspace: &str, timestamp: i64) -> RewindResult<SyncOutcome> {
        if !self.workspace_available(workspace).await {
            return Ok(SyncOutcome::WorkspaceUnavailable);
        }

        let manifests = self.manifest_store(workspace);
        manifests.ensure_dir().await?;
        let existing = manifests.list_timestamps().await?;
        if existing.contains(&timestamp) {
            tracing::debug!("Snapshot {} already exists, skipping", timestamp);
            return Ok(SyncOutcome::AlreadyExists);
        }

        let report = self
            .build_snapshot(workspace, &manifests, timestamp, &existing)
            .await?;
        Ok(SyncOutcome::Created(report))
    }

    /// Walk the trackable files and persist a manifest for `timestamp`.
    ///
    /// The newest existing manifest is the reuse baseline. Per-file failures
    /// leave the file out of the manifest; anything else aborts before the
    /// manifest is written.
    pub(super) async fn build_snapshot(
        &self,
        workspace: &str,
        manifests: &ManifestStore,
        timestamp: i64,
        existing: &[i64],
    ) -> RewindResult<SnapshotReport> {
        let started = Instant::now();
        let objects = self.object_store(workspace);
        objects
            .ensure_root()
            .await
            .with_context(|| format!("creating object store {}", objects.objects_dir()))?;

        let previous = match existing.last() {
            Some(&ts) => manifests.load(ts).await,
            None => None,
        };
        if let Some(previous) = &previous {
            tracing::debug!(
                "Using snapshot {} ({} files) as reuse baseline",
                previous.timestamp,
                previous.file_count()
            );
        }

        let filter = WorkspaceFilter::load(&*self.fs, workspace, &self.config).await;
        let files = filter
            .list_trackable_files(&*self.fs, workspace)
            .await
            .with_context(|| format!("listing {} for snapshot {}", workspace, timestamp))?;
        let detector = ChangeDetector::new(&*self.fs, &objects);

        let mut manifest = BackupManifest::new(timestamp);
        let mut report = SnapshotReport {
            timestamp,
            files_seen: files.len(),
            ..Default::default()
        };

        for file in &files {
            let record = match detector
                .process_file(&file.full_path, &file.relative_path, previous.as_ref())
                .await
            {
                Ok(record) => record,
                Err(e) if e.is_per_file() => {
                    tracing::error!("Failed to snapshot {}: {}", file.relative_path, e);
                    report.failed.push((file.relative_path.clone(), e.to_string()));
                    continue;
                }
                Err(e) => {
                    return Err(e.with_context(format!("snapshot {} of {}", timestamp, workspace)));
                }
            };

            match record.outcome {
                FileOutcome::Reused => report.reused += 1,
                FileOutcome::Hashed {
                    object_written,
                    stat_missing,
                } => {
                    report.hashed += 1;
                    if object_written {
                        report.objects_written += 1;
                    }
                    if stat_missing {
                        report.stat_missing += 1;
                    }
                }
            }
            manifest.insert(file.relative_path.clone(), record.hash, record.stat);
        }

        manifests
            .save(&manifest)
            .await
            .with_context(|| format!("saving snapshot {}", timestamp))?;
        report.recorded = manifest.file_count();
        report.elapsed = started.elapsed();

        tracing::info!(
            "Snapshot {} done: elapsed={}ms files={} reused={} hashed={} objectsWritten={} statMissing={} failed={}",
            timestamp,
            report.elapsed.as_millis(),
            report.recorded,
            report.reused,
            report.hashed,
            report.objects_written,
            report.stat_missing,
            report.failed.len()
        );

        Ok(report)
    }
}
