//! Records produced by traversal and by the filesystem facade.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A qualifying file found during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name.
    pub name: CompactString,
    /// Size in bytes (total content size for bundles).
    pub size: u64,
    /// Last modification time, if available.
    pub modified: Option<SystemTime>,
    /// The file is a directory bundle treated as one unit.
    pub is_bundle: bool,
    /// The file belongs to a reference tree.
    pub is_reference: bool,
}

impl FileRecord {
    /// Create a record for a regular file.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path),
            path,
            size,
            modified: None,
            is_bundle: false,
            is_reference: false,
        }
    }

    /// Set the modification time.
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }

    /// Mark this record as a bundle.
    pub fn into_bundle(mut self) -> Self {
        self.is_bundle = true;
        self
    }
}

/// A folder yielded by folder enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    /// Full path to the folder.
    pub path: PathBuf,
    /// Folder name.
    pub name: CompactString,
    /// The folder belongs to a reference tree.
    pub is_reference: bool,
}

impl FolderRecord {
    /// Create a folder record.
    pub fn new(path: impl Into<PathBuf>, is_reference: bool) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path),
            path,
            is_reference,
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name.
    pub name: CompactString,
    /// Full path to the entry.
    pub path: PathBuf,
    /// The entry is a directory (following symlinks).
    pub is_dir: bool,
    /// The entry itself is a symbolic link.
    pub is_symlink: bool,
    /// The entry is a directory reported as a single file.
    pub is_bundle: bool,
}

impl DirEntry {
    /// Create a plain directory entry.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: file_name(&path),
            path,
            is_dir: true,
            is_symlink: false,
            is_bundle: false,
        }
    }

    /// Create a plain file entry.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            is_dir: false,
            ..Self::dir(path)
        }
    }

    /// Check if traversal may descend into this entry.
    ///
    /// Symlinks are never followed and bundles are reported as files.
    pub fn is_traversable(&self) -> bool {
        self.is_dir && !self.is_symlink && !self.is_bundle
    }
}

fn file_name(path: &Path) -> CompactString {
    path.file_name()
        .map(|n| CompactString::new(n.to_string_lossy()))
        .unwrap_or_else(|| CompactString::new(path.to_string_lossy()))
}
