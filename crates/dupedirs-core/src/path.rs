//! Component-wise path containment helpers.
//!
//! All comparisons work on path components, so `/data/docs` is under `/data`
//! but `/database` is not.

use std::path::Path;

/// Returns true if `ancestor` is a strict ancestor of `path`.
pub fn is_ancestor(ancestor: &Path, path: &Path) -> bool {
    ancestor != path && path.starts_with(ancestor)
}

/// Returns true if `ancestor` equals `path` or is one of its ancestors.
pub fn is_same_or_ancestor(ancestor: &Path, path: &Path) -> bool {
    path.starts_with(ancestor)
}

/// Returns true if the final component of `path` starts with `prefix`.
///
/// Paths without a final component (`/`, `..`) are never hidden.
pub fn is_hidden(path: &Path, prefix: char) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
}
