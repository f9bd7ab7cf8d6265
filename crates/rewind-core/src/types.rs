//! Snapshot data model
//!
//! A manifest maps workspace-relative paths to content hashes, plus a cheap
//! `(size, lastModified)` fingerprint per path used to skip rehashing files
//! that have not changed since the previous snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Cheap per-file fingerprint.
///
/// Equality of two stats means "probably unchanged"; it is never a substitute
/// for a content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub size: u64,
    pub last_modified: i64,
}

impl FileStat {
    /// Create a stat fingerprint
    pub fn new(size: u64, last_modified: i64) -> Self {
        Self {
            size,
            last_modified,
        }
    }

    /// Stat derived from content that was read without a usable timestamp
    pub fn degraded(size: u64) -> Self {
        Self::new(size, 0)
    }
}

/// A timestamped snapshot of the trackable workspace files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    /// Snapshot timestamp (epoch milliseconds)
    pub timestamp: i64,
    /// Relative path -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
    /// Relative path -> stat fingerprint
    #[serde(default)]
    pub file_stats: BTreeMap<String, FileStat>,
}

impl BackupManifest {
    /// Create an empty manifest
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            files: BTreeMap::new(),
            file_stats: BTreeMap::new(),
        }
    }

    /// Record a file entry
    pub fn insert(&mut self, relative_path: impl Into<String>, hash: impl Into<String>, stat: FileStat) {
        let relative_path = relative_path.into();
        self.file_stats.insert(relative_path.clone(), stat);
        self.files.insert(relative_path, hash.into());
    }

    /// Recorded hash for a path
    pub fn hash_of(&self, relative_path: &str) -> Option<&str> {
        self.files.get(relative_path).map(String::as_str)
    }

    /// Recorded stat for a path
    pub fn stat_of(&self, relative_path: &str) -> Option<&FileStat> {
        self.file_stats.get(relative_path)
    }

    /// Whether `files` and `file_stats` share the same key set
    pub fn is_consistent(&self) -> bool {
        self.files.len() == self.file_stats.len()
            && self.files.keys().all(|k| self.file_stats.contains_key(k))
    }

    /// Number of files in the manifest
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Kind of change a rewind would apply to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// In the target manifest, absent on disk
    Added,
    /// On disk, absent from the target manifest
    Deleted,
    /// Content differs from the target manifest
    Modified,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Deleted => write!(f, "deleted"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// One entry of a rewind preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFileChange {
    pub path: String,
    pub change_type: ChangeType,
    pub changed_lines: usize,
}

impl WorkspaceFileChange {
    /// Create a preview entry
    pub fn new(path: impl Into<String>, change_type: ChangeType, changed_lines: usize) -> Self {
        Self {
            path: path.into(),
            change_type,
            changed_lines,
        }
    }
}

/// Outcome counters for a snapshot run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Timestamp of the written manifest
    pub timestamp: i64,
    /// Trackable files found in the workspace
    pub files_seen: usize,
    /// Files recorded in the manifest
    pub recorded: usize,
    /// Files whose previous hash was reused
    pub reused: usize,
    /// Files that were read and hashed
    pub hashed: usize,
    /// New objects written to the store
    pub objects_written: usize,
    /// Files without a usable stat
    pub stat_missing: usize,
    /// Files left out after a per-file failure
    pub failed: Vec<(String, String)>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Outcome of a rewind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewindReport {
    /// Timestamp of the manifest the workspace was restored to
    pub target: i64,
    /// Tracked files deleted because the target does not contain them
    pub deleted: Vec<String>,
    /// Files written from the object store
    pub restored: Vec<String>,
    /// Files already matching the target
    pub unchanged: usize,
    /// Files that could not be deleted or restored, with the reason
    pub skipped: Vec<(String, String)>,
    /// Manifest timestamps removed after the restore
    pub pruned: Vec<i64>,
}

impl RewindReport {
    /// Whether every file reached the target state
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let mut manifest = BackupManifest::new(100);
        manifest.insert("a.txt", "abc123", FileStat::new(5, 1_700_000_000_000));

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["timestamp"], 100);
        assert_eq!(json["files"]["a.txt"], "abc123");
        assert_eq!(json["fileStats"]["a.txt"]["size"], 5);
        assert_eq!(json["fileStats"]["a.txt"]["lastModified"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_manifest_tolerates_missing_stats_and_unknown_keys() {
        let manifest: BackupManifest = serde_json::from_str(
            r#"{"timestamp": 7, "files": {"a.txt": "ff"}, "extra": true}"#,
        )
        .unwrap();

        assert_eq!(manifest.timestamp, 7);
        assert_eq!(manifest.hash_of("a.txt"), Some("ff"));
        assert!(manifest.file_stats.is_empty());
        assert!(!manifest.is_consistent());
    }

    #[test]
    fn test_insert_keeps_maps_consistent() {
        let mut manifest = BackupManifest::new(1);
        manifest.insert("a.txt", "h1", FileStat::new(1, 1));
        manifest.insert("b/c.md", "h2", FileStat::degraded(4));

        assert!(manifest.is_consistent());
        assert_eq!(manifest.file_count(), 2);
        assert_eq!(manifest.stat_of("b/c.md"), Some(&FileStat::new(4, 0)));
    }

    #[test]
    fn test_change_type_serialization() {
        let change = WorkspaceFileChange::new("a.txt", ChangeType::Modified, 3);
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["changeType"], "MODIFIED");
        assert_eq!(json["changedLines"], 3);
        assert_eq!(ChangeType::Added.to_string(), "added");
    }
}
