//! Trackable file selection
//!
//! A workspace file is trackable when it passes the ignore rules and is
//! classified as text. Binary files never enter a manifest.

mod gitignore;
mod text;

pub use gitignore::GitIgnoreRules;
pub use text::TextClassifier;

use crate::access::FileAccess;
use crate::config::BackupConfig;
use crate::paths::{file_name, join_path, relative_path};

/// Classifies a workspace-relative path as excluded or not
pub trait IgnoreFilter: Send + Sync {
    /// Whether the path must be left out of snapshots
    fn should_ignore(&self, relative_path: &str, name: &str, is_directory: bool) -> bool;
}

/// A trackable workspace file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// Absolute path as reported by the collaborator
    pub full_path: String,
    /// Path relative to the workspace root
    pub relative_path: String,
}

/// Combined ignore and text filter for one workspace
pub struct WorkspaceFilter {
    ignore: Box<dyn IgnoreFilter>,
    classifier: TextClassifier,
}

impl WorkspaceFilter {
    /// Build a filter from explicit parts
    pub fn new(ignore: Box<dyn IgnoreFilter>, classifier: TextClassifier) -> Self {
        Self { ignore, classifier }
    }

    /// Load the built-in rules plus the workspace gitignore.
    ///
    /// A missing or unreadable gitignore leaves only the built-in rules.
    pub async fn load(fs: &dyn FileAccess, workspace: &str, config: &BackupConfig) -> Self {
        let mut rules = GitIgnoreRules::from_lines(&config.builtin_ignore_rules);
        if !config.builtin_ignore_rules.contains(&config.backup_dir_name) {
            rules.extend([format!("/{}", config.backup_dir_name)]);
        }

        if config.respect_gitignore {
            let gitignore_path = join_path(workspace, &config.gitignore_file);
            match fs.read_text(&gitignore_path).await {
                Ok(content) => {
                    let before = rules.len();
                    rules.extend(content.lines());
                    tracing::debug!(
                        "Loaded {} ignore rules from {}",
                        rules.len() - before,
                        gitignore_path
                    );
                }
                Err(e) => {
                    tracing::debug!("No gitignore rules loaded from {}: {}", gitignore_path, e);
                }
            }
        }

        let classifier = TextClassifier::new().with_extensions(&config.extra_text_extensions);
        Self::new(Box::new(rules), classifier)
    }

    /// Whether a workspace-relative file path is trackable
    pub fn is_trackable(&self, relative_path: &str) -> bool {
        if relative_path.is_empty() {
            return false;
        }
        let name = file_name(relative_path);
        self.classifier.is_text_based_file_name(name)
            && !self.ignore.should_ignore(relative_path, name, false)
    }

    /// Enumerate trackable files under the workspace root.
    ///
    /// The result is sorted by relative path so manifest construction is
    /// deterministic.
    pub async fn list_trackable_files(
        &self,
        fs: &dyn FileAccess,
        workspace: &str,
    ) -> crate::error::RewindResult<Vec<TrackedFile>> {
        let all = fs.find_files(workspace, "*").await?;

        let mut tracked: Vec<TrackedFile> = all
            .into_iter()
            .filter_map(|full_path| {
                let relative = relative_path(workspace, &full_path)?;
                if !self.is_trackable(&relative) {
                    return None;
                }
                Some(TrackedFile {
                    full_path,
                    relative_path: relative,
                })
            })
            .collect();

        tracked.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        tracked.dedup_by(|a, b| a.relative_path == b.relative_path);
        Ok(tracked)
    }
}
