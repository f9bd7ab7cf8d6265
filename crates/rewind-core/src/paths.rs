//! `/`-separated path helpers
//!
//! Paths handed to the collaborator are plain strings so that remote bridges
//! see the same layout regardless of the host platform.

/// Join a child onto a parent with exactly one separator
pub fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    if parent.is_empty() {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// Path of `full` relative to `root`.
///
/// Returns `None` when `full` is not under `root`, and `Some("")` for the
/// root itself.
pub fn relative_path(root: &str, full: &str) -> Option<String> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return None;
    }
    let rest = full.strip_prefix(root)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    Some(rest.trim_start_matches('/').to_string())
}

/// Everything before the last separator, if there is one
pub fn parent_of(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Final path component
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Whether a manifest key stays inside the workspace when joined onto it.
///
/// Rejects empty keys, absolute keys, backslashes and `.`/`..`/empty
/// components.
pub fn is_safe_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
}
