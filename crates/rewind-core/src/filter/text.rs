//! Text/binary classification by file name

use std::collections::HashSet;

/// Extensions of text-based formats (lowercase, without the dot)
const TEXT_EXTENSIONS: &[&str] = &[
    // Plain text and docs
    "txt", "md", "markdown", "rst", "adoc", "org", "tex", "log", "csv", "tsv",
    // Markup and styles
    "html", "htm", "xhtml", "xml", "svg", "css", "scss", "sass", "less", "vue", "svelte",
    // Config and data
    "json", "jsonc", "json5", "yaml", "yml", "toml", "ini", "cfg", "conf", "properties",
    "env", "lock", "gradle", "plist",
    // Scripts and shells
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd",
    // Programming languages
    "rs", "py", "pyi", "js", "mjs", "cjs", "jsx", "ts", "tsx", "java", "kt", "kts", "scala",
    "groovy", "go", "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "m", "mm", "swift", "rb",
    "php", "pl", "pm", "lua", "r", "dart", "ex", "exs", "erl", "hs", "clj", "cs", "fs",
    "vb", "sql", "graphql", "gql", "proto", "zig", "nim", "jl",
    // Build and tooling
    "cmake", "mk", "dockerfile", "tf", "hcl",
];

/// Well-known extensionless or dot-file names that are text
const TEXT_FILE_NAMES: &[&str] = &[
    "makefile",
    "dockerfile",
    "license",
    "readme",
    "changelog",
    "procfile",
    "gemfile",
    "rakefile",
    "jenkinsfile",
    ".gitignore",
    ".gitattributes",
    ".editorconfig",
    ".env",
    ".npmrc",
    ".prettierrc",
    ".eslintrc",
];

/// Decides whether a file name denotes a text-based file
#[derive(Debug, Clone)]
pub struct TextClassifier {
    extensions: HashSet<String>,
}

impl TextClassifier {
    /// Classifier with the built-in extension list
    pub fn new() -> Self {
        Self {
            extensions: TEXT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Treat additional extensions as text
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.extensions.extend(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase()),
        );
        self
    }

    /// Whether a bare file name is text-based
    pub fn is_text_based_file_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if TEXT_FILE_NAMES.contains(&lower.as_str()) {
            return true;
        }

        match lower.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.extensions.contains(ext),
            _ => false,
        }
    }
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self::new()
    }
}
