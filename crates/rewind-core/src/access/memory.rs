//! In-memory file access implementation
//!
//! Used by tests across the workspace. Every write advances a fake clock so
//! modification times are distinct and deterministic, and content reads are
//! counted per path so callers can assert that a file was not re-read.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::{DirEntry, FileAccess, FileExists, FileInfo, format_last_modified};
use crate::error::{RewindError, RewindResult};
use crate::paths::{file_name, parent_of};

/// Starting point of the fake clock (2023-11-14T22:13:20Z)
const CLOCK_START_MILLIS: i64 = 1_700_000_000_000;

/// Clock advance per write
const CLOCK_STEP_MILLIS: i64 = 1_000;

#[derive(Debug, Clone)]
struct MemFile {
    bytes: Vec<u8>,
    modified: i64,
}

#[derive(Debug, Default)]
struct MemState {
    files: BTreeMap<String, MemFile>,
    dirs: BTreeSet<String>,
    clock: i64,
    reads: HashMap<String, usize>,
    failing_reads: HashSet<String>,
    unstatable: HashSet<String>,
}

impl MemState {
    fn tick(&mut self) -> i64 {
        self.clock += CLOCK_STEP_MILLIS;
        self.clock
    }

    fn add_dir_with_parents(&mut self, path: &str) {
        let mut current = Some(path.to_string());
        while let Some(dir) = current {
            if dir.is_empty() {
                break;
            }
            current = parent_of(&dir).map(str::to_string);
            self.dirs.insert(dir);
        }
    }

    fn parent_exists(&self, path: &str) -> bool {
        match parent_of(path) {
            Some(parent) if !parent.is_empty() => self.dirs.contains(parent),
            _ => true,
        }
    }

    fn read_bytes(&mut self, path: &str) -> RewindResult<Vec<u8>> {
        *self.reads.entry(path.to_string()).or_insert(0) += 1;
        if self.failing_reads.contains(path) {
            return Err(RewindError::io_with_path("Injected read failure", path));
        }
        self.files
            .get(path)
            .map(|f| f.bytes.clone())
            .ok_or_else(|| RewindError::not_found(format!("No such file: {}", path)))
    }

    fn write_bytes(&mut self, path: &str, bytes: Vec<u8>) -> RewindResult<()> {
        if self.dirs.contains(path) {
            return Err(RewindError::io_with_path("Is a directory", path));
        }
        if !self.parent_exists(path) {
            return Err(RewindError::io_with_path("Parent directory does not exist", path));
        }
        let modified = self.tick();
        self.files.insert(path.to_string(), MemFile { bytes, modified });
        Ok(())
    }
}

/// In-memory [`FileAccess`] implementation
pub struct MemoryFileAccess {
    state: Mutex<MemState>,
}

impl MemoryFileAccess {
    /// Create an empty in-memory filesystem
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemState {
                clock: CLOCK_START_MILLIS,
                ..Default::default()
            }),
        }
    }

    /// Seed a text file, creating parent directories
    pub fn add_file(&self, path: &str, content: impl AsRef<[u8]>) {
        let mut state = self.state.lock();
        if let Some(parent) = parent_of(path) {
            state.add_dir_with_parents(parent);
        }
        let modified = state.tick();
        state.files.insert(
            path.to_string(),
            MemFile {
                bytes: content.as_ref().to_vec(),
                modified,
            },
        );
    }

    /// Seed a directory and its parents
    pub fn add_dir(&self, path: &str) {
        self.state.lock().add_dir_with_parents(path);
    }

    /// Remove a file without going through the collaborator contract
    pub fn remove(&self, path: &str) -> bool {
        self.state.lock().files.remove(path).is_some()
    }

    /// Override a file's modification time
    pub fn set_modified(&self, path: &str, millis: i64) {
        if let Some(file) = self.state.lock().files.get_mut(path) {
            file.modified = millis;
        }
    }

    /// Make `info` return an unparsable timestamp for a path
    pub fn mark_unstatable(&self, path: &str) {
        self.state.lock().unstatable.insert(path.to_string());
    }

    /// Make content reads of a path fail
    pub fn fail_reads(&self, path: &str) {
        self.state.lock().failing_reads.insert(path.to_string());
    }

    /// Number of content reads issued for a path
    pub fn read_count(&self, path: &str) -> usize {
        self.state.lock().reads.get(path).copied().unwrap_or(0)
    }

    /// Reset all read counters
    pub fn reset_read_counts(&self) {
        self.state.lock().reads.clear();
    }

    /// Whether a regular file exists
    pub fn contains(&self, path: &str) -> bool {
        self.state.lock().files.contains_key(path)
    }

    /// Raw content of a file
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(path).map(|f| f.bytes.clone())
    }

    /// Content of a file decoded as UTF-8
    pub fn text(&self, path: &str) -> Option<String> {
        self.content(path)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// All file paths under a prefix, sorted
    pub fn files_under(&self, prefix: &str) -> Vec<String> {
        let prefix = format!("{}/", prefix.trim_end_matches('/'));
        self.state
            .lock()
            .files
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

impl Default for MemoryFileAccess {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileAccess for MemoryFileAccess {
    async fn exists(&self, path: &str) -> RewindResult<FileExists> {
        let state = self.state.lock();
        if state.files.contains_key(path) {
            Ok(FileExists::file())
        } else if state.dirs.contains(path) {
            Ok(FileExists::directory())
        } else {
            Ok(FileExists::missing())
        }
    }

    async fn info(&self, path: &str) -> RewindResult<FileInfo> {
        let state = self.state.lock();
        let file = state
            .files
            .get(path)
            .ok_or_else(|| RewindError::not_found(format!("No such file: {}", path)))?;

        let last_modified = if state.unstatable.contains(path) {
            "unknown".to_string()
        } else {
            format_last_modified(file.modified)
        };

        Ok(FileInfo {
            size: file.bytes.len() as u64,
            last_modified,
        })
    }

    async fn list_directory(&self, path: &str) -> RewindResult<Vec<DirEntry>> {
        let state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(RewindError::not_found(format!("No such directory: {}", path)));
        }

        let mut entries: Vec<DirEntry> = state
            .dirs
            .iter()
            .filter(|d| parent_of(d) == Some(path))
            .map(|d| DirEntry {
                name: file_name(d).to_string(),
                is_directory: true,
            })
            .chain(
                state
                    .files
                    .keys()
                    .filter(|f| parent_of(f) == Some(path))
                    .map(|f| DirEntry {
                        name: file_name(f).to_string(),
                        is_directory: false,
                    }),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn find_files(&self, root: &str, pattern: &str) -> RewindResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern).map_err(|e| {
            RewindError::invalid_input_field(format!("Invalid pattern: {}", e), "pattern")
        })?;
        let state = self.state.lock();
        if !state.dirs.contains(root) {
            return Err(RewindError::not_found(format!("No such directory: {}", root)));
        }

        let prefix = format!("{}/", root.trim_end_matches('/'));
        Ok(state
            .files
            .keys()
            .filter(|p| p.starts_with(&prefix) && matcher.matches(file_name(p)))
            .cloned()
            .collect())
    }

    async fn read_text(&self, path: &str) -> RewindResult<String> {
        let bytes = self.state.lock().read_bytes(path)?;
        Ok(String::from_utf8(bytes)?)
    }

    async fn read_binary_base64(&self, path: &str) -> RewindResult<String> {
        let bytes = self.state.lock().read_bytes(path)?;
        Ok(STANDARD.encode(bytes))
    }

    async fn write_text(&self, path: &str, content: &str) -> RewindResult<()> {
        self.state
            .lock()
            .write_bytes(path, content.as_bytes().to_vec())
    }

    async fn write_binary_base64(&self, path: &str, content_base64: &str) -> RewindResult<()> {
        let bytes = STANDARD.decode(content_base64)?;
        self.state.lock().write_bytes(path, bytes)
    }

    async fn delete_file(&self, path: &str) -> RewindResult<()> {
        match self.state.lock().files.remove(path) {
            Some(_) => Ok(()),
            None => Err(RewindError::not_found(format!("No such file: {}", path))),
        }
    }

    async fn make_directory(&self, path: &str, create_parents: bool) -> RewindResult<()> {
        let mut state = self.state.lock();
        if state.files.contains_key(path) {
            return Err(RewindError::io_with_path("File exists", path));
        }
        if create_parents {
            state.add_dir_with_parents(path);
        } else if state.parent_exists(path) {
            state.dirs.insert(path.to_string());
        } else {
            return Err(RewindError::io_with_path("Parent directory does not exist", path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_requires_parent() {
        let fs = MemoryFileAccess::new();
        fs.add_dir("/ws");

        assert!(fs.write_text("/ws/a.txt", "hi").await.is_ok());
        assert!(fs.write_text("/ws/sub/b.txt", "hi").await.is_err());

        fs.make_directory("/ws/sub", true).await.unwrap();
        assert!(fs.write_text("/ws/sub/b.txt", "hi").await.is_ok());
    }

    #[tokio::test]
    async fn test_writes_advance_clock() {
        let fs = MemoryFileAccess::new();
        fs.add_dir("/ws");
        fs.write_text("/ws/a.txt", "one").await.unwrap();
        let first = fs.info("/ws/a.txt").await.unwrap();
        fs.write_text("/ws/a.txt", "two").await.unwrap();
        let second = fs.info("/ws/a.txt").await.unwrap();

        assert_eq!(first.size, second.size);
        assert_ne!(first.last_modified, second.last_modified);
        assert!(second.last_modified_millis() > first.last_modified_millis());
    }

    #[tokio::test]
    async fn test_list_directory_sorted() {
        let fs = MemoryFileAccess::new();
        fs.add_file("/ws/b.txt", "b");
        fs.add_file("/ws/a.txt", "a");
        fs.add_file("/ws/sub/c.txt", "c");

        let entries = fs.list_directory("/ws").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert!(entries[2].is_directory);
    }

    #[tokio::test]
    async fn test_find_files_pattern() {
        let fs = MemoryFileAccess::new();
        fs.add_file("/ws/a.txt", "a");
        fs.add_file("/ws/sub/b.rs", "b");
        fs.add_file("/other/c.txt", "c");

        let all = fs.find_files("/ws", "*").await.unwrap();
        assert_eq!(all, vec!["/ws/a.txt".to_string(), "/ws/sub/b.rs".to_string()]);

        let rust = fs.find_files("/ws", "*.rs").await.unwrap();
        assert_eq!(rust, vec!["/ws/sub/b.rs".to_string()]);
    }

    #[tokio::test]
    async fn test_read_counters_and_failures() {
        let fs = MemoryFileAccess::new();
        fs.add_file("/ws/a.txt", "a");
        fs.read_text("/ws/a.txt").await.unwrap();
        fs.read_binary_base64("/ws/a.txt").await.unwrap();
        assert_eq!(fs.read_count("/ws/a.txt"), 2);

        fs.fail_reads("/ws/a.txt");
        assert!(fs.read_text("/ws/a.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_unstatable_info() {
        let fs = MemoryFileAccess::new();
        fs.add_file("/ws/a.txt", "abc");
        fs.mark_unstatable("/ws/a.txt");

        let info = fs.info("/ws/a.txt").await.unwrap();
        assert_eq!(info.size, 3);
        assert_eq!(info.last_modified_millis(), None);
    }

    #[tokio::test]
    async fn test_delete_missing_file_fails() {
        let fs = MemoryFileAccess::new();
        fs.add_dir("/ws");
        let err = fs.delete_file("/ws/nope.txt").await.unwrap_err();
        assert_eq!(err.error_code(), "REWIND_NOT_FOUND");
    }
}
