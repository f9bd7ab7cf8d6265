//! File access collaborator
//!
//! The engine never touches the filesystem directly. All reads, writes and
//! listings go through a [`FileAccess`] implementation, which may be the local
//! disk, a process bridge or a remote environment. Paths are `/`-separated
//! strings.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::RewindResult;

mod memory;

pub use memory::MemoryFileAccess;

/// Timestamp formats accepted from [`FileAccess::info`], tried in order
const LAST_MODIFIED_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Format used when producing `last_modified` strings
pub const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Result of an existence check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExists {
    pub exists: bool,
    pub is_directory: bool,
}

impl FileExists {
    /// An existing regular file
    pub fn file() -> Self {
        Self {
            exists: true,
            is_directory: false,
        }
    }

    /// An existing directory
    pub fn directory() -> Self {
        Self {
            exists: true,
            is_directory: true,
        }
    }

    /// Nothing at the path
    pub fn missing() -> Self {
        Self::default()
    }

    /// True when the path exists and is a directory
    pub fn is_existing_dir(&self) -> bool {
        self.exists && self.is_directory
    }
}

/// Size and modification time reported by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub size: u64,
    /// Formatted as `yyyy-MM-dd HH:mm:ss[.SSS]`
    pub last_modified: String,
}

impl FileInfo {
    /// Modification time in epoch milliseconds, if the string parses
    pub fn last_modified_millis(&self) -> Option<i64> {
        parse_last_modified(&self.last_modified)
    }
}

/// A single entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

/// Abstract filesystem bridge consumed by the engine
#[async_trait]
pub trait FileAccess: Send + Sync {
    /// Probe a path
    async fn exists(&self, path: &str) -> RewindResult<FileExists>;

    /// Size and modification time of a path
    async fn info(&self, path: &str) -> RewindResult<FileInfo>;

    /// Immediate children of a directory
    async fn list_directory(&self, path: &str) -> RewindResult<Vec<DirEntry>>;

    /// Absolute paths of all files under `root` whose name matches `pattern`
    async fn find_files(&self, root: &str, pattern: &str) -> RewindResult<Vec<String>>;

    /// Read a file as UTF-8 text
    async fn read_text(&self, path: &str) -> RewindResult<String>;

    /// Read a file as base64-encoded bytes
    async fn read_binary_base64(&self, path: &str) -> RewindResult<String>;

    /// Write (truncate) a text file
    async fn write_text(&self, path: &str, content: &str) -> RewindResult<()>;

    /// Write (truncate) a file from base64-encoded bytes
    async fn write_binary_base64(&self, path: &str, content_base64: &str) -> RewindResult<()>;

    /// Delete a regular file
    async fn delete_file(&self, path: &str) -> RewindResult<()>;

    /// Create a directory
    async fn make_directory(&self, path: &str, create_parents: bool) -> RewindResult<()>;
}

/// Parse a collaborator timestamp into epoch milliseconds.
///
/// Timestamps carry no zone and are interpreted as UTC. Blank or unparsable
/// values yield `None`.
pub fn parse_last_modified(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    LAST_MODIFIED_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(raw, format)
            .ok()
            .map(|dt| dt.and_utc().timestamp_millis())
    })
}

/// Format epoch milliseconds the way [`parse_last_modified`] expects
pub fn format_last_modified(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc().format(LAST_MODIFIED_FORMAT).to_string())
        .unwrap_or_default()
}
