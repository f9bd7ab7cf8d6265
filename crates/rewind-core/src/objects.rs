//! Content-addressed object store
//!
//! Blobs live under `objects/<hash[:2]>/<hash>`. Older backups wrote
//! `objects/<hash>` directly; those paths are still tried on read but never
//! written.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::access::FileAccess;
use crate::error::{ResultExt, RewindError, RewindResult};
use crate::paths::join_path;

/// Bucket used for hashes too short to shard
const SHORT_HASH_BUCKET: &str = "__";

/// Lowercase hex SHA-256 of a byte slice
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Whether `hash` has the shape [`content_hash`] produces
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn check_hash(hash: &str) -> RewindResult<()> {
    if is_valid_hash(hash) {
        Ok(())
    } else {
        Err(RewindError::invalid_input_field(
            format!("Malformed object hash {:?}", hash),
            "hash",
        ))
    }
}

/// Two-character shard prefix of a hash
pub fn bucket_prefix(hash: &str) -> &str {
    hash.get(..2).unwrap_or(SHORT_HASH_BUCKET)
}

/// An object path layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPathScheme {
    /// `objects/<hash[:2]>/<hash>`
    Sharded,
    /// `objects/<hash>`
    LegacyFlat,
}

impl ObjectPathScheme {
    /// Path of an object under this layout
    pub fn object_path(&self, objects_dir: &str, hash: &str) -> String {
        match self {
            Self::Sharded => join_path(&join_path(objects_dir, bucket_prefix(hash)), hash),
            Self::LegacyFlat => join_path(objects_dir, hash),
        }
    }
}

/// Layouts tried on read, in order
const READ_SCHEMES: [ObjectPathScheme; 2] =
    [ObjectPathScheme::Sharded, ObjectPathScheme::LegacyFlat];

/// Hash-addressed, append-only blob storage
pub struct ObjectStore {
    fs: Arc<dyn FileAccess>,
    objects_dir: String,
    read_schemes: Vec<ObjectPathScheme>,
}

impl ObjectStore {
    /// Create a store rooted at `objects_dir`
    pub fn new(fs: Arc<dyn FileAccess>, objects_dir: impl Into<String>) -> Self {
        Self {
            fs,
            objects_dir: objects_dir.into(),
            read_schemes: READ_SCHEMES.to_vec(),
        }
    }

    /// Root directory of the store
    pub fn objects_dir(&self) -> &str {
        &self.objects_dir
    }

    /// Path new objects are written to
    pub fn sharded_path(&self, hash: &str) -> String {
        ObjectPathScheme::Sharded.object_path(&self.objects_dir, hash)
    }

    /// Flat path used by older backups
    pub fn legacy_path(&self, hash: &str) -> String {
        ObjectPathScheme::LegacyFlat.object_path(&self.objects_dir, hash)
    }

    /// Create the store root
    pub async fn ensure_root(&self) -> RewindResult<()> {
        self.fs.make_directory(&self.objects_dir, true).await
    }

    /// Store a blob under its hash.
    ///
    /// Returns `true` when the blob was written and `false` when an object
    /// already existed at the sharded path. Existing objects are never
    /// overwritten.
    pub async fn put(&self, hash: &str, content_base64: &str) -> RewindResult<bool> {
        check_hash(hash)?;
        let object_path = self.sharded_path(hash);
        if self.fs.exists(&object_path).await?.exists {
            return Ok(false);
        }

        let bucket_dir = join_path(&self.objects_dir, bucket_prefix(hash));
        self.fs
            .make_directory(&bucket_dir, true)
            .await
            .with_context(|| format!("creating object bucket {}", bucket_dir))?;
        self.fs
            .write_binary_base64(&object_path, content_base64)
            .await
            .with_context(|| format!("writing object {}", hash))?;

        tracing::debug!("Stored object {}", hash);
        Ok(true)
    }

    /// Store raw bytes, computing their hash
    pub async fn put_bytes(&self, bytes: &[u8]) -> RewindResult<(String, bool)> {
        let hash = content_hash(bytes);
        let written = self.put(&hash, &STANDARD.encode(bytes)).await?;
        Ok((hash, written))
    }

    /// Find the path holding an object, trying each layout in order
    pub async fn resolve_for_read(&self, hash: &str) -> RewindResult<String> {
        check_hash(hash)?;
        for scheme in &self.read_schemes {
            let candidate = scheme.object_path(&self.objects_dir, hash);
            if self.fs.exists(&candidate).await?.exists {
                return Ok(candidate);
            }
        }
        Err(RewindError::object_missing(hash))
    }

    /// Read an object as base64
    pub async fn read_base64(&self, hash: &str) -> RewindResult<String> {
        let path = self.resolve_for_read(hash).await?;
        self.fs.read_binary_base64(&path).await
    }

    /// Read an object as bytes
    pub async fn read(&self, hash: &str) -> RewindResult<Vec<u8>> {
        let encoded = self.read_base64(hash).await?;
        Ok(STANDARD.decode(encoded)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MemoryFileAccess;

    fn store() -> (Arc<MemoryFileAccess>, ObjectStore) {
        let fs = Arc::new(MemoryFileAccess::new());
        fs.add_dir("/ws/.backup/objects");
        let store = ObjectStore::new(fs.clone(), "/ws/.backup/objects");
        (fs, store)
    }

    #[test]
    fn test_content_hash_is_lowercase_sha256() {
        assert_eq!(
            content_hash(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(content_hash(b"").len(), 64);
    }

    #[test]
    fn test_bucket_prefix() {
        assert_eq!(bucket_prefix("abcdef"), "ab");
        assert_eq!(bucket_prefix("a"), "__");
        assert_eq!(bucket_prefix(""), "__");
    }

    #[test]
    fn test_paths() {
        let (_fs, store) = store();
        assert_eq!(store.sharded_path("abcd"), "/ws/.backup/objects/ab/abcd");
        assert_eq!(store.legacy_path("abcd"), "/ws/.backup/objects/abcd");
    }

    #[tokio::test]
    async fn test_put_writes_once() {
        let (fs, store) = store();
        let (hash, written) = store.put_bytes(b"hello").await.unwrap();
        assert!(written);
        assert!(fs.contains(&store.sharded_path(&hash)));

        let (again, written) = store.put_bytes(b"hello").await.unwrap();
        assert_eq!(again, hash);
        assert!(!written);
        assert_eq!(fs.files_under("/ws/.backup/objects").len(), 1);
    }

    #[tokio::test]
    async fn test_put_never_overwrites() {
        let (fs, store) = store();
        let hash = content_hash(b"original");
        fs.add_file(&store.sharded_path(&hash), "tampered");

        let written = store.put(&hash, &STANDARD.encode(b"original")).await.unwrap();
        assert!(!written);
        assert_eq!(fs.text(&store.sharded_path(&hash)).as_deref(), Some("tampered"));
    }

    #[tokio::test]
    async fn test_read_falls_back_to_legacy_path() {
        let (fs, store) = store();
        let hash = content_hash(b"old object");
        fs.add_file(&store.legacy_path(&hash), "old object");

        assert_eq!(store.resolve_for_read(&hash).await.unwrap(), store.legacy_path(&hash));
        assert_eq!(store.read(&hash).await.unwrap(), b"old object".to_vec());
    }

    #[tokio::test]
    async fn test_sharded_path_preferred() {
        let (fs, store) = store();
        let hash = content_hash(b"both");
        fs.add_file(&store.legacy_path(&hash), "legacy");
        fs.add_file(&store.sharded_path(&hash), "sharded");

        assert_eq!(store.read(&hash).await.unwrap(), b"sharded".to_vec());
    }

    #[tokio::test]
    async fn test_missing_object() {
        let (_fs, store) = store();
        let err = store.read(&content_hash(b"never stored")).await.unwrap_err();
        assert_eq!(err.error_code(), "REWIND_OBJECT_MISSING");
        assert!(err.is_per_file());
    }

    #[tokio::test]
    async fn test_put_failure_carries_context() {
        let (fs, store) = store();
        fs.add_file("/ws/.backup/objects/2c", "not a directory");

        let err = store.put_bytes(b"hello").await.unwrap_err();
        assert_eq!(err.error_code(), "REWIND_IO");
        assert_eq!(err.context(), Some("creating object bucket /ws/.backup/objects/2c"));
    }

    #[tokio::test]
    async fn test_malformed_hash_never_reaches_storage() {
        let (fs, store) = store();
        fs.add_file("/ws/secret.txt", "outside the store");

        for hash in ["../../secret.txt", "feedface", &"G".repeat(64)] {
            let err = store.read(hash).await.unwrap_err();
            assert_eq!(err.error_code(), "REWIND_INVALID_INPUT");
            let err = store.put(hash, "aGk=").await.unwrap_err();
            assert_eq!(err.error_code(), "REWIND_INVALID_INPUT");
        }
        assert!(fs.files_under("/ws/.backup/objects").is_empty());
    }

    #[test]
    fn test_is_valid_hash() {
        assert!(is_valid_hash(&content_hash(b"x")));
        assert!(!is_valid_hash(&content_hash(b"x").to_uppercase()));
        assert!(!is_valid_hash("abcd"));
    }
}
