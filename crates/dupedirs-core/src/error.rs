//! Error types for root management, filesystem access and traversal.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors returned when adding a root directory.
#[derive(Debug, Error)]
pub enum RootError {
    /// The path is already a root, or lies under one.
    #[error("Already present: {path}")]
    AlreadyPresent { path: PathBuf },

    /// The path does not exist.
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },
}

/// A path could not be listed or classified by the filesystem facade.
///
/// Traversal treats every variant the same way: the subtree rooted at
/// [`FsError::path`] yields nothing further, and siblings are unaffected.
#[derive(Debug, Error)]
pub enum FsError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found (it may have vanished mid-scan).
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// The facade refuses to handle this path.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Any other I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid path error.
    pub fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The path the error occurred at.
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied { path }
            | Self::NotFound { path }
            | Self::InvalidPath { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

/// Traversal was stopped through its cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Scan cancelled")]
pub struct Cancelled;

/// Invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A glob pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Any other invalid setting.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}
