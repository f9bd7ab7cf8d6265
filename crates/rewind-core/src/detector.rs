//! Stat-based change detection
//!
//! A file whose `(size, lastModified)` matches the previous manifest exactly
//! keeps its previous hash without being read. Everything else is read,
//! hashed and written to the object store if the object is new.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::access::FileAccess;
use crate::error::RewindResult;
use crate::objects::{ObjectStore, content_hash};
use crate::types::{BackupManifest, FileStat};

/// What to do with a candidate file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Record the previous hash without reading content
    Reuse(String),
    /// Read and hash the content
    Rehash,
}

/// How a file's manifest entry was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Reused,
    Hashed {
        object_written: bool,
        stat_missing: bool,
    },
}

/// Manifest entry produced for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub hash: String,
    pub stat: FileStat,
    pub outcome: FileOutcome,
}

/// Decides between hash reuse and rehash for workspace files
pub struct ChangeDetector<'a> {
    fs: &'a dyn FileAccess,
    objects: &'a ObjectStore,
}

impl<'a> ChangeDetector<'a> {
    /// Create a detector writing new objects to `objects`
    pub fn new(fs: &'a dyn FileAccess, objects: &'a ObjectStore) -> Self {
        Self { fs, objects }
    }

    /// Reuse iff a previous hash and stat exist and the current stat is
    /// known and exactly equal to the previous one.
    pub fn decide(
        current: Option<&FileStat>,
        previous_hash: Option<&str>,
        previous_stat: Option<&FileStat>,
    ) -> Decision {
        match (current, previous_hash, previous_stat) {
            (Some(current), Some(hash), Some(previous))
                if current.size == previous.size
                    && current.last_modified == previous.last_modified =>
            {
                Decision::Reuse(hash.to_string())
            }
            _ => Decision::Rehash,
        }
    }

    /// Current stat of a file, or `None` when the collaborator cannot
    /// provide a parsable one
    pub async fn current_stat(&self, full_path: &str) -> Option<FileStat> {
        match self.fs.info(full_path).await {
            Ok(info) => {
                let stat = info
                    .last_modified_millis()
                    .map(|millis| FileStat::new(info.size, millis));
                if stat.is_none() {
                    tracing::debug!(
                        "Unparsable modification time {:?} for {}",
                        info.last_modified,
                        full_path
                    );
                }
                stat
            }
            Err(e) => {
                tracing::debug!("No file info for {}: {}", full_path, e);
                None
            }
        }
    }

    /// Produce the manifest entry for one file.
    ///
    /// Errors are scoped to this file; the caller logs them and omits the
    /// file from the manifest.
    pub async fn process_file(
        &self,
        full_path: &str,
        relative_path: &str,
        previous: Option<&BackupManifest>,
    ) -> RewindResult<FileRecord> {
        let current = self.current_stat(full_path).await;
        let previous_hash = previous.and_then(|m| m.hash_of(relative_path));
        let previous_stat = previous.and_then(|m| m.stat_of(relative_path));

        if let (Decision::Reuse(hash), Some(stat)) = (
            Self::decide(current.as_ref(), previous_hash, previous_stat),
            current,
        ) {
            tracing::debug!("Reusing hash for unchanged {}", relative_path);
            return Ok(FileRecord {
                hash,
                stat,
                outcome: FileOutcome::Reused,
            });
        }

        let encoded = self.fs.read_binary_base64(full_path).await?;
        let bytes = STANDARD.decode(&encoded)?;
        let hash = content_hash(&bytes);
        let stat_missing = current.is_none();
        let stat = current.unwrap_or_else(|| FileStat::degraded(bytes.len() as u64));
        let object_written = self.objects.put(&hash, &encoded).await?;

        tracing::debug!(
            "Hashed {} -> {} (object_written={})",
            relative_path,
            hash,
            object_written
        );

        Ok(FileRecord {
            hash,
            stat,
            outcome: FileOutcome::Hashed {
                object_written,
                stat_missing,
            },
        })
    }
}
