//! Snapshot orchestration
//!
//! [`BackupManager`] is the entry point. For a requested timestamp it either
//! takes a new snapshot, rewinds the workspace to the oldest newer snapshot,
//! or does nothing, as decided by [`plan_sync`].
//!
//! Calls against the same workspace must be serialized by the caller; the
//! manager holds no lock over the backup directory.

mod manager;
mod preview;
mod restore;
mod snapshot;

pub use manager::BackupManager;

use crate::types::{RewindReport, SnapshotReport};

/// Action selected for a requested timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPlan {
    /// No snapshot at or after the timestamp exists
    CreateNew,
    /// Restore `target` and delete the manifests in `prune`
    Rewind { target: i64, prune: Vec<i64> },
    /// A snapshot for the timestamp already exists and nothing is newer
    NoOp,
}

/// Decide what a sync at `timestamp` does given the existing snapshots.
///
/// The rewind target is the smallest timestamp strictly greater than the
/// requested one; it is pruned together with every newer snapshot.
pub fn plan_sync(existing: &[i64], timestamp: i64) -> SyncPlan {
    let target = existing.iter().copied().filter(|ts| *ts > timestamp).min();

    match target {
        Some(target) => {
            let mut prune: Vec<i64> = existing.iter().copied().filter(|ts| *ts >= target).collect();
            prune.sort_unstable();
            prune.dedup();
            SyncPlan::Rewind { target, prune }
        }
        None if existing.contains(&timestamp) => SyncPlan::NoOp,
        None => SyncPlan::CreateNew,
    }
}

/// Result of a sync call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The workspace root is missing or not a directory; nothing was done
    WorkspaceUnavailable,
    /// A snapshot for the timestamp already existed
    AlreadyExists,
    /// A new snapshot was written
    Created(SnapshotReport),
    /// The workspace was rewound
    Rewound(RewindReport),
}

impl SyncOutcome {
    /// Whether the call changed nothing
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::WorkspaceUnavailable | Self::AlreadyExists)
    }

    /// Snapshot report, if a snapshot was taken
    pub fn snapshot(&self) -> Option<&SnapshotReport> {
        match self {
            Self::Created(report) => Some(report),
            _ => None,
        }
    }

    /// Rewind report, if a rewind ran
    pub fn rewind(&self) -> Option<&RewindReport> {
        match self {
            Self::Rewound(report) => Some(report),
            _ => None,
        }
    }
}
