//! Read-only rewind previews

use crate::diff::{estimate_changed_lines, normalize_lines};
use crate::error::{RewindError, RewindResult};
use crate::filter::{TrackedFile, WorkspaceFilter};
use crate::objects::{ObjectStore, content_hash};
use crate::paths::{is_safe_relative_path, join_path};
use crate::types::{ChangeType, WorkspaceFileChange};

use super::{BackupManager, SyncPlan, plan_sync};

impl BackupManager {
    /// Describe what rewinding to `target` would change, sorted by path.
    ///
    /// Files whose snapshot object is missing are left out, matching the
    /// rewind, which skips them.
    pub async fn preview_changes(
        &self,
        workspace: &str,
        target: i64,
    ) -> RewindResult<Vec<WorkspaceFileChange>> {
        if !self.workspace_available(workspace).await {
            return Ok(Vec::new());
        }

        let manifest = self
            .manifest_store(workspace)
            .load(target)
            .await
            .ok_or_else(|| RewindError::not_found(format!("Snapshot {} not available", target)))?;
        let objects = self.object_store(workspace);
        let filter = WorkspaceFilter::load(&*self.fs, workspace, &self.config).await;
        let tracked = filter.list_trackable_files(&*self.fs, workspace).await?;

        let mut changes = Vec::new();
        for file in &tracked {
            match manifest.hash_of(&file.relative_path) {
                None => {
                    let lines = match self.read_bytes(&file.full_path).await {
                        Ok(bytes) => line_count(&bytes),
                        Err(e) => {
                            tracing::debug!("Cannot read {} for preview: {}", file.full_path, e);
                            0
                        }
                    };
                    changes.push(WorkspaceFileChange::new(
                        &file.relative_path,
                        ChangeType::Deleted,
                        lines,
                    ));
                }
                Some(hash) => {
                    if let Some(change) = self.preview_modified(&objects, file, hash).await {
                        changes.push(change);
                    }
                }
            }
        }

        for (relative_path, hash) in &manifest.files {
            if !is_safe_relative_path(relative_path) {
                tracing::warn!("Omitting {:?} from preview: path escapes the workspace", relative_path);
                continue;
            }
            let path = join_path(workspace, relative_path);
            if matches!(self.fs.exists(&path).await, Ok(state) if state.exists) {
                continue;
            }
            match objects.read(hash).await {
                Ok(bytes) => changes.push(WorkspaceFileChange::new(
                    relative_path,
                    ChangeType::Added,
                    line_count(&bytes),
                )),
                Err(e) => tracing::warn!("Omitting {} from preview: {}", relative_path, e),
            }
        }

        changes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(changes)
    }

    /// Preview the rewind a sync at `timestamp` would perform.
    ///
    /// Empty when the sync would not rewind.
    pub async fn preview_changes_for_rewind(
        &self,
        workspace: &str,
        timestamp: i64,
    ) -> RewindResult<Vec<WorkspaceFileChange>> {
        if !self.workspace_available(workspace).await {
            return Ok(Vec::new());
        }

        let existing = self.list_snapshots(workspace).await?;
        match plan_sync(&existing, timestamp) {
            SyncPlan::Rewind { target, .. } => self.preview_changes(workspace, target).await,
            _ => Ok(Vec::new()),
        }
    }

    async fn preview_modified(
        &self,
        objects: &ObjectStore,
        file: &TrackedFile,
        hash: &str,
    ) -> Option<WorkspaceFileChange> {
        let current = match self.read_bytes(&file.full_path).await {
            Ok(bytes) if content_hash(&bytes) == hash => return None,
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::debug!("Cannot read {} for preview: {}", file.full_path, e);
                None
            }
        };

        let snapshot = match objects.read(hash).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Omitting {} from preview: {}", file.relative_path, e);
                return None;
            }
        };

        let changed_lines = match current.map(String::from_utf8) {
            Some(Ok(current)) => match String::from_utf8(snapshot) {
                Ok(snapshot) => estimate_changed_lines(&current, &snapshot),
                Err(_) => 0,
            },
            _ => 0,
        };

        Some(WorkspaceFileChange::new(
            &file.relative_path,
            ChangeType::Modified,
            changed_lines,
        ))
    }
}

/// Normalized line count of UTF-8 content, 0 otherwise
fn line_count(bytes: &[u8]) -> usize {
    std::str::from_utf8(bytes)
        .map(|text| normalize_lines(text).len())
        .unwrap_or(0)
}
