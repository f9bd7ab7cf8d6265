//! Rewind
//!
//! Workspace snapshots and rewind. The engine lives in [`rewind_core`]; this
//! crate adds the local filesystem collaborator and logging setup.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rewind::{BackupManager, LocalFileAccess, LoggingConfig, init_logging};
//!
//! init_logging(&LoggingConfig::default())?;
//! let manager = BackupManager::with_defaults(Arc::new(LocalFileAccess::new()));
//! manager.sync_state("/path/to/workspace", message_timestamp).await?;
//! ```

pub use rewind_core::*;
pub use rewind_fs::LocalFileAccess;

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `Ok(false)` when
/// a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> RewindResult<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            RewindError::config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        "pretty" => builder.pretty().try_init(),
        other => {
            return Err(RewindError::config(format!(
                "Unknown log format '{}', expected json, pretty or compact",
                other
            )));
        }
    };

    Ok(installed.is_ok())
}
