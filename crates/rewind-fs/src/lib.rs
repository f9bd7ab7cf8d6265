//! Local filesystem collaborator
//!
//! [`LocalFileAccess`] implements [`FileAccess`] over the host filesystem so
//! the rewind engine can run without a remote file bridge.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use glob::Pattern;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

use rewind_core::access::format_last_modified;
use rewind_core::{DirEntry, FileAccess, FileExists, FileInfo, RewindError, RewindResult};

/// [`FileAccess`] over `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileAccess;

impl LocalFileAccess {
    /// Create a local collaborator
    pub fn new() -> Self {
        Self
    }
}

fn io_error(err: std::io::Error, path: &str) -> RewindError {
    if err.kind() == ErrorKind::NotFound {
        RewindError::not_found(format!("{}: {}", path, err))
    } else {
        RewindError::io_with_path(err.to_string(), path)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[async_trait]
impl FileAccess for LocalFileAccess {
    async fn exists(&self, path: &str) -> RewindResult<FileExists> {
        match fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => Ok(FileExists::directory()),
            Ok(_) => Ok(FileExists::file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileExists::missing()),
            Err(e) => Err(io_error(e, path)),
        }
    }

    async fn info(&self, path: &str) -> RewindResult<FileInfo> {
        let meta = fs::metadata(path).await.map_err(|e| io_error(e, path))?;
        let last_modified = match meta.modified() {
            Ok(modified) => {
                let modified: DateTime<Utc> = modified.into();
                format_last_modified(modified.timestamp_millis())
            }
            Err(e) => {
                tracing::debug!("No modification time for {}: {}", path, e);
                String::new()
            }
        };

        Ok(FileInfo {
            size: meta.len(),
            last_modified,
        })
    }

    async fn list_directory(&self, path: &str) -> RewindResult<Vec<DirEntry>> {
        let mut reader = fs::read_dir(path).await.map_err(|e| io_error(e, path))?;
        let mut entries = Vec::new();

        while let Some(entry) = reader.next_entry().await.map_err(|e| io_error(e, path))? {
            let is_directory = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn find_files(&self, root: &str, pattern: &str) -> RewindResult<Vec<String>> {
        let matcher = Pattern::new(pattern).map_err(|e| {
            RewindError::invalid_input_field(format!("Invalid pattern: {}", e), "pattern")
        })?;
        if !fs::metadata(root)
            .await
            .map_err(|e| io_error(e, root))?
            .is_dir()
        {
            return Err(RewindError::io_with_path("Not a directory", root));
        }

        let root = root.to_string();
        tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::debug!("Skipping unreadable entry under {}: {}", root, e);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| matcher.matches(&entry.file_name().to_string_lossy()))
                .map(|entry| path_string(entry.path()))
                .collect::<Vec<String>>()
        })
        .await
        .map_err(|e| RewindError::other(format!("File search task failed: {}", e)))
    }

    async fn read_text(&self, path: &str) -> RewindResult<String> {
        fs::read_to_string(path).await.map_err(|e| io_error(e, path))
    }

    async fn read_binary_base64(&self, path: &str) -> RewindResult<String> {
        let bytes = fs::read(path).await.map_err(|e| io_error(e, path))?;
        Ok(STANDARD.encode(bytes))
    }

    async fn write_text(&self, path: &str, content: &str) -> RewindResult<()> {
        fs::write(path, content).await.map_err(|e| io_error(e, path))
    }

    async fn write_binary_base64(&self, path: &str, content_base64: &str) -> RewindResult<()> {
        let bytes = STANDARD.decode(content_base64)?;
        fs::write(path, bytes).await.map_err(|e| io_error(e, path))
    }

    async fn delete_file(&self, path: &str) -> RewindResult<()> {
        fs::remove_file(path).await.map_err(|e| io_error(e, path))
    }

    async fn make_directory(&self, path: &str, create_parents: bool) -> RewindResult<()> {
        let result = if create_parents {
            fs::create_dir_all(path).await
        } else {
            fs::create_dir(path).await
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && Path::new(path).is_dir() => Ok(()),
            Err(e) => Err(io_error(e, path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::access::parse_last_modified;
    use tempfile::TempDir;

    fn root(dir: &TempDir) -> String {
        path_string(dir.path())
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        let file = format!("{}/a.txt", root(&dir));
        std::fs::write(&file, "a").unwrap();

        assert!(fs.exists(&root(&dir)).await.unwrap().is_existing_dir());
        let state = fs.exists(&file).await.unwrap();
        assert!(state.exists && !state.is_directory);
        assert!(!fs.exists(&format!("{}/nope", root(&dir))).await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_info_reports_parsable_mtime() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        let file = format!("{}/a.txt", root(&dir));
        std::fs::write(&file, "hello").unwrap();

        let info = fs.info(&file).await.unwrap();
        assert_eq!(info.size, 5);
        assert!(parse_last_modified(&info.last_modified).is_some());
    }

    #[tokio::test]
    async fn test_text_and_binary_roundtrip() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        let text = format!("{}/a.txt", root(&dir));
        let binary = format!("{}/b.bin", root(&dir));

        fs.write_text(&text, "line one\nline two").await.unwrap();
        assert_eq!(fs.read_text(&text).await.unwrap(), "line one\nline two");

        let encoded = STANDARD.encode([0u8, 159, 146, 150]);
        fs.write_binary_base64(&binary, &encoded).await.unwrap();
        assert_eq!(std::fs::read(&binary).unwrap(), vec![0u8, 159, 146, 150]);
        assert_eq!(fs.read_binary_base64(&binary).await.unwrap(), encoded);
    }

    #[tokio::test]
    async fn test_list_directory_sorted() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let entries = fs.list_directory(&root(&dir)).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert!(entries[2].is_directory);
    }

    #[tokio::test]
    async fn test_find_files_recurses_and_filters() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/nested/lib.rs"), "").unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let all = fs.find_files(&root(&dir), "*").await.unwrap();
        assert_eq!(all.len(), 3);

        let rust = fs.find_files(&root(&dir), "*.rs").await.unwrap();
        assert_eq!(rust.len(), 2);
        assert!(rust.iter().all(|p| p.starts_with(&root(&dir))));
        assert!(rust.iter().all(|p| p.ends_with(".rs")));
    }

    #[tokio::test]
    async fn test_find_files_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        let result = fs.find_files(&format!("{}/missing", root(&dir)), "*").await;
        assert!(matches!(result, Err(RewindError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_and_make_directory() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileAccess::new();
        let nested = format!("{}/a/b/c", root(&dir));

        fs.make_directory(&nested, true).await.unwrap();
        fs.make_directory(&nested, true).await.unwrap();
        fs.make_directory(&nested, false).await.unwrap();
        assert!(dir.path().join("a/b/c").is_dir());

        let file = format!("{}/x.txt", nested);
        fs.write_text(&file, "x").await.unwrap();
        fs.delete_file(&file).await.unwrap();
        assert!(matches!(
            fs.delete_file(&file).await,
            Err(RewindError::NotFound { .. })
        ));
    }
}
