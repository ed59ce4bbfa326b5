//! Filesystem access used by traversal.

use std::path::Path;

use compact_str::CompactString;
use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use dupedirs_core::{ConfigError, DirEntry, FileRecord, FsConfig, FsError};

/// Lists directories and classifies files for the traversal engine.
///
/// Errors must be reported as [`FsError`]; traversal swallows them per
/// subtree.
pub trait FileSystem {
    /// Qualifying files directly inside `path`, bundles included.
    fn list_files(&self, path: &Path) -> Result<Vec<FileRecord>, FsError>;

    /// All entries directly inside `path`.
    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, FsError>;

    /// Check if `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone)]
pub struct LocalFs {
    config: FsConfig,
    excludes: GlobSet,
}

impl LocalFs {
    /// Create a facade with the given file qualification rules.
    pub fn new(config: FsConfig) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude_patterns {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let excludes = builder.build().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;
        Ok(Self { config, excludes })
    }

    /// The file qualification rules.
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    fn is_bundle_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.is_bundle_extension(ext))
    }

    fn qualifies(&self, name: &str, size: u64) -> bool {
        self.config.accepts_size(size) && !self.excludes.is_match(name)
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self {
            config: FsConfig::default(),
            excludes: GlobSet::empty(),
        }
    }
}

impl FileSystem for LocalFs {
    fn list_files(&self, path: &Path) -> Result<Vec<FileRecord>, FsError> {
        let mut files = Vec::new();
        for entry in self.list_entries(path)? {
            if entry.is_symlink || (entry.is_dir && !entry.is_bundle) {
                continue;
            }

            let metadata = match std::fs::symlink_metadata(&entry.path) {
                Ok(m) => m,
                Err(err) => {
                    debug!(path = %entry.path.display(), %err, "Skipping unreadable file");
                    continue;
                }
            };
            let size = if entry.is_bundle {
                bundle_size(&entry.path)
            } else if metadata.is_file() {
                metadata.len()
            } else {
                continue;
            };
            if !self.qualifies(&entry.name, size) {
                continue;
            }

            let record = FileRecord::new(entry.path, size).with_modified(metadata.modified().ok());
            files.push(if entry.is_bundle {
                record.into_bundle()
            } else {
                record
            });
        }
        Ok(files)
    }

    fn list_entries(&self, path: &Path) -> Result<Vec<DirEntry>, FsError> {
        let read_dir = std::fs::read_dir(path).map_err(|e| FsError::io(path, e))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| FsError::io(path, e))?;
            let entry_path = entry.path();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(err) => {
                    debug!(path = %entry_path.display(), %err, "Skipping entry without file type");
                    continue;
                }
            };

            let is_symlink = file_type.is_symlink();
            let is_dir = if is_symlink {
                entry_path.is_dir()
            } else {
                file_type.is_dir()
            };
            let is_bundle = is_dir && !is_symlink && self.is_bundle_path(&entry_path);

            entries.push(DirEntry {
                name: CompactString::new(entry.file_name().to_string_lossy()),
                path: entry_path,
                is_dir,
                is_symlink,
                is_bundle,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Total size of the regular files inside a bundle.
fn bundle_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}
