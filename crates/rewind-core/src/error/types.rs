//! Core error type and result extensions

use thiserror::Error;

/// Result type alias for engine operations
pub type RewindResult<T> = Result<T, RewindError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> RewindResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> RewindResult<T>;
}

impl<T> ResultExt<T> for RewindResult<T> {
    fn context<C: std::fmt::Display>(self, context: C) -> RewindResult<T> {
        self.map_err(|e| e.with_context(context.to_string()))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> RewindResult<T> {
        self.map_err(|e| e.with_context(f().to_string()))
    }
}

/// Main error type for the engine
#[derive(Error, Debug, Clone)]
pub enum RewindError {
    /// Collaborator I/O failures
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// Manifest serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Base64 or UTF-8 payload decoding errors
    #[error("Encoding error: {message}")]
    Encoding {
        message: String,
        context: Option<String>,
    },

    /// Backup directory layout errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        context: Option<String>,
    },

    /// A manifest references an object that is not present on disk
    #[error("Object {hash} not found in object store")]
    ObjectMissing {
        hash: String,
        context: Option<String>,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}

impl RewindError {
    /// Stable code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "REWIND_IO",
            Self::Json { .. } => "REWIND_JSON",
            Self::Encoding { .. } => "REWIND_ENCODING",
            Self::Storage { .. } => "REWIND_STORAGE",
            Self::ObjectMissing { .. } => "REWIND_OBJECT_MISSING",
            Self::NotFound { .. } => "REWIND_NOT_FOUND",
            Self::InvalidInput { .. } => "REWIND_INVALID_INPUT",
            Self::Config { .. } => "REWIND_CONFIG",
            Self::Other { .. } => "REWIND_OTHER",
        }
    }

    /// Optional context attached to the error
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::Encoding { context, .. }
            | Self::Storage { context, .. }
            | Self::ObjectMissing { context, .. }
            | Self::NotFound { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Config { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
        }
    }

    /// Whether the failure is scoped to a single file.
    ///
    /// Per-file failures are logged and the file is skipped; anything else
    /// aborts the running operation.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::Encoding { .. }
                | Self::ObjectMissing { .. }
                | Self::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RewindError::io("boom").error_code(), "REWIND_IO");
        assert_eq!(
            RewindError::object_missing("abcd").error_code(),
            "REWIND_OBJECT_MISSING"
        );
        assert_eq!(RewindError::config("bad").error_code(), "REWIND_CONFIG");
    }

    #[test]
    fn test_object_missing_display() {
        let err = RewindError::object_missing("deadbeef");
        assert_eq!(err.to_string(), "Object deadbeef not found in object store");
    }

    #[test]
    fn test_context_extension() {
        let result: RewindResult<()> = Err(RewindError::io("read failed"));
        let err = result.context("while reading a.txt").unwrap_err();
        assert_eq!(err.context(), Some("while reading a.txt"));
        assert!(err.is_per_file());
    }

    #[test]
    fn test_storage_errors_are_not_per_file() {
        assert!(!RewindError::storage("manifest write failed").is_per_file());
        assert!(!RewindError::json("bad manifest").is_per_file());
    }
}
