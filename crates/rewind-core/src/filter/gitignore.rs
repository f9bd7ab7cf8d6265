//! Gitignore-style exclusion rules
//!
//! Rules are compiled with the `ignore` crate's gitignore matcher and
//! evaluated against workspace-relative paths. A file below an excluded
//! directory stays excluded even when a later rule re-includes it, which
//! is how git treats negations under ignored parents.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use super::IgnoreFilter;

/// Root the matcher is anchored at; callers always pass relative paths.
const MATCH_ROOT: &str = ".";

/// Ordered gitignore rules for one workspace
#[derive(Debug, Clone)]
pub struct GitIgnoreRules {
    lines: Vec<String>,
    matcher: Gitignore,
}

impl Default for GitIgnoreRules {
    fn default() -> Self {
        Self::new()
    }
}

impl GitIgnoreRules {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            matcher: Gitignore::empty(),
        }
    }

    /// Compile rules from gitignore lines; invalid lines are skipped
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Self::new();
        rules.extend(lines);
        rules
    }

    /// Append more lines after the existing ones and recompile
    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lines
            .extend(lines.into_iter().map(|l| l.as_ref().to_string()));
        self.matcher = compile(&self.lines);
    }

    /// Number of effective rules, excluding comments and blank lines
    pub fn len(&self) -> usize {
        self.matcher.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

fn compile(lines: &[String]) -> Gitignore {
    let mut builder = GitignoreBuilder::new(MATCH_ROOT);
    for line in lines {
        if let Err(e) = builder.add_line(None, line) {
            tracing::debug!("Skipping ignore rule {:?}: {}", line, e);
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Failed to compile ignore rules: {}", e);
        Gitignore::empty()
    })
}

impl IgnoreFilter for GitIgnoreRules {
    fn should_ignore(&self, relative_path: &str, _name: &str, is_directory: bool) -> bool {
        let relative_path = relative_path.trim_start_matches('/');
        if relative_path.is_empty() || self.matcher.is_empty() {
            return false;
        }
        let path = Path::new(relative_path);

        let parent_excluded = path
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .any(|dir| self.matcher.matched(dir, true).is_ignore());
        if parent_excluded {
            return true;
        }

        self.matcher
            .matched_path_or_any_parents(path, is_directory)
            .is_ignore()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignored(rules: &GitIgnoreRules, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        rules.should_ignore(path, name, false)
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let rules = GitIgnoreRules::from_lines(["# comment", "", "   ", "*.log"]);
        assert_eq!(rules.len(), 1);
        assert!(ignored(&rules, "server.log"));
        assert!(!ignored(&rules, "# comment"));
    }

    #[test]
    fn test_unanchored_name_matches_any_depth() {
        let rules = GitIgnoreRules::from_lines([".backup", "*.log"]);
        assert!(ignored(&rules, ".backup/100.json"));
        assert!(ignored(&rules, "nested/.backup/objects/ab/abcd"));
        assert!(ignored(&rules, "logs/today.log"));
        assert!(!ignored(&rules, "src/main.rs"));
    }

    #[test]
    fn test_dir_only_rule() {
        let rules = GitIgnoreRules::from_lines(["build/"]);
        assert!(ignored(&rules, "build/output.txt"));
        assert!(ignored(&rules, "app/build/output.txt"));
        assert!(rules.should_ignore("build", "build", true));
        assert!(!ignored(&rules, "scripts/build"));
    }

    #[test]
    fn test_anchored_rule() {
        let rules = GitIgnoreRules::from_lines(["/dist", "docs/*.tmp"]);
        assert!(ignored(&rules, "dist/bundle.js"));
        assert!(!ignored(&rules, "app/dist/bundle.js"));
        assert!(ignored(&rules, "docs/draft.tmp"));
        assert!(!ignored(&rules, "docs/nested/draft.tmp"));
    }

    #[test]
    fn test_double_star() {
        let rules = GitIgnoreRules::from_lines(["docs/**/*.tmp"]);
        assert!(ignored(&rules, "docs/a/b/draft.tmp"));
        assert!(!ignored(&rules, "src/draft.tmp"));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let rules = GitIgnoreRules::from_lines(["*.txt", "!keep.txt"]);
        assert!(ignored(&rules, "drop.txt"));
        assert!(!ignored(&rules, "keep.txt"));

        let rules = GitIgnoreRules::from_lines(["!keep.txt", "*.txt"]);
        assert!(ignored(&rules, "keep.txt"));
    }

    #[test]
    fn test_negation_cannot_reinclude_under_excluded_dir() {
        let rules = GitIgnoreRules::from_lines(["build/", "!build/keep.txt"]);
        assert!(ignored(&rules, "build/keep.txt"));
        assert!(ignored(&rules, "build/other.txt"));
    }

    #[test]
    fn test_escaped_hash_is_a_pattern() {
        let rules = GitIgnoreRules::from_lines(["\\#notes.txt"]);
        assert_eq!(rules.len(), 1);
        assert!(ignored(&rules, "#notes.txt"));
        assert!(!ignored(&rules, "notes.txt"));
    }

    #[test]
    fn test_invalid_line_is_skipped() {
        let rules = GitIgnoreRules::from_lines(["[oops", "*.log"]);
        assert_eq!(rules.len(), 1);
        assert!(ignored(&rules, "server.log"));
        assert!(!ignored(&rules, "[oops"));
    }

    #[test]
    fn test_extend_keeps_earlier_rules() {
        let mut rules = GitIgnoreRules::from_lines([".backup"]);
        rules.extend(["*.log"]);
        assert_eq!(rules.len(), 2);
        assert!(ignored(&rules, ".backup/100.json"));
        assert!(ignored(&rules, "debug.log"));
    }
}
