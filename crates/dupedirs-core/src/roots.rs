//! Ordered set of non-overlapping root directories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RootError;
use crate::path::is_same_or_ancestor;

/// Root directories in insertion order.
///
/// No root is equal to, an ancestor of, or a descendant of another root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSet {
    roots: Vec<PathBuf>,
}

impl RootSet {
    /// Create an empty root set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root.
    ///
    /// Fails if `path` is already covered by a root. Existing roots under
    /// `path` are removed and returned, since the new root implies them.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> Result<Vec<PathBuf>, RootError> {
        let path = path.into();
        if self.contains(&path) {
            return Err(RootError::AlreadyPresent { path });
        }
        let (evicted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.roots)
            .into_iter()
            .partition(|root| root.starts_with(&path));
        self.roots = kept;
        self.roots.push(path);
        Ok(evicted)
    }

    /// Check if `path` is a root or lies under one.
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| is_same_or_ancestor(root, path))
    }

    /// Remove the root at `index`.
    pub fn remove(&mut self, index: usize) -> Option<PathBuf> {
        (index < self.roots.len()).then(|| self.roots.remove(index))
    }

    /// Get the root at `index`.
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.roots.get(index).map(PathBuf::as_path)
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if there are no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterate roots in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Path> + ExactSizeIterator {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// Remove all roots.
    pub fn clear(&mut self) {
        self.roots.clear();
    }
}
