//! Rewind Core Library
//!
//! Content-addressed snapshots and rewind for workspace directories reached
//! through an abstract [`FileAccess`] collaborator.
//!
//! # Overview
//!
//! Each snapshot is a manifest mapping workspace-relative paths to SHA-256
//! hashes, stored as `<workspace>/.backup/<timestamp>.json`. File contents
//! live once per hash in `<workspace>/.backup/objects/<hash[..2]>/<hash>`.
//! Files whose size and modification time match the previous snapshot are
//! not re-read.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rewind_core::{BackupManager, SyncOutcome};
//!
//! let manager = BackupManager::with_defaults(Arc::new(my_file_access));
//!
//! // Snapshot the workspace before handling message 1000
//! manager.sync_state("/workspace", 1000).await?;
//!
//! // Going back to message 500 rewinds to the first snapshot after it
//! let preview = manager.preview_changes_for_rewind("/workspace", 500).await?;
//! if let SyncOutcome::Rewound(report) = manager.sync_state("/workspace", 500).await? {
//!     println!("Restored {} files", report.restored.len());
//! }
//! ```

pub mod access;
pub mod config;
pub mod detector;
pub mod diff;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod objects;
pub mod paths;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use access::{DirEntry, FileAccess, FileExists, FileInfo, MemoryFileAccess};
pub use config::{BackupConfig, LoggingConfig};
pub use detector::{ChangeDetector, Decision, FileOutcome, FileRecord};
pub use diff::{Delta, DeltaKind, LineDiff, estimate_changed_lines, normalize_lines};
pub use error::{ResultExt, RewindError, RewindResult};
pub use filter::{GitIgnoreRules, IgnoreFilter, TextClassifier, TrackedFile, WorkspaceFilter};
pub use manifest::ManifestStore;
pub use objects::{ObjectPathScheme, ObjectStore, content_hash};
pub use sync::{BackupManager, SyncOutcome, SyncPlan, plan_sync};
pub use types::*;
