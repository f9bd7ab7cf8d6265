//! Engine configuration
//!
//! Configuration can be built in code or loaded from a TOML document:
//!
//! ```toml
//! backup_dir_name = ".backup"
//! respect_gitignore = true
//! extra_text_extensions = ["proto", "tf"]
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{RewindError, RewindResult};

/// Configuration for the backup manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Name of the backup directory inside the workspace
    pub backup_dir_name: String,
    /// Name of the object directory inside the backup directory
    pub objects_dir_name: String,
    /// File extension used for manifests
    pub manifest_extension: String,
    /// Ignore rules applied ahead of the workspace gitignore
    pub builtin_ignore_rules: Vec<String>,
    /// Whether to read the workspace gitignore file
    pub respect_gitignore: bool,
    /// Gitignore file name, relative to the workspace root
    pub gitignore_file: String,
    /// Additional extensions treated as text
    pub extra_text_extensions: Vec<String>,
    /// Write manifests as indented JSON
    pub pretty_manifests: bool,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_dir_name: ".backup".to_string(),
            objects_dir_name: "objects".to_string(),
            manifest_extension: "json".to_string(),
            builtin_ignore_rules: vec![".backup".to_string(), ".operit".to_string()],
            respect_gitignore: true,
            gitignore_file: ".gitignore".to_string(),
            extra_text_extensions: Vec::new(),
            pretty_manifests: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl BackupConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> RewindResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file on the host filesystem
    pub fn load_from_file(path: impl AsRef<Path>) -> RewindResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RewindError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Set the backup directory name
    pub fn with_backup_dir_name(mut self, name: impl Into<String>) -> Self {
        self.backup_dir_name = name.into();
        self
    }

    /// Add a built-in ignore rule
    pub fn with_ignore_rule(mut self, rule: impl Into<String>) -> Self {
        self.builtin_ignore_rules.push(rule.into());
        self
    }

    /// Disable reading the workspace gitignore
    pub fn without_gitignore(mut self) -> Self {
        self.respect_gitignore = false;
        self
    }

    /// Treat additional extensions as text
    pub fn with_text_extensions(
        mut self,
        extensions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.extra_text_extensions
            .extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Validate directory names and extensions
    pub fn validate(&self) -> RewindResult<()> {
        for (field, value) in [
            ("backup_dir_name", &self.backup_dir_name),
            ("objects_dir_name", &self.objects_dir_name),
            ("manifest_extension", &self.manifest_extension),
        ] {
            if value.trim().is_empty() {
                return Err(RewindError::invalid_input_field(
                    format!("{} must not be empty", field),
                    field,
                ));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(RewindError::invalid_input_field(
                    format!("{} must be a single path component: {}", field, value),
                    field,
                ));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
