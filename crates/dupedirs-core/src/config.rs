//! Configuration for state resolution and file qualification.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::path::is_hidden;
use crate::state::ScanState;

/// Policy for the state a path gets when nothing overrides it.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DirectoriesConfig {
    /// Exclude hidden folders by default.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub exclude_hidden: bool,

    /// Leading character marking a hidden name.
    #[builder(default = "'.'")]
    #[serde(default = "default_hidden_prefix")]
    pub hidden_prefix: char,

    /// Paths that are excluded unless explicitly overridden.
    #[builder(default)]
    #[serde(default)]
    pub excluded_paths: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_hidden_prefix() -> char {
    '.'
}

impl DirectoriesConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref paths) = self.excluded_paths {
            for path in paths {
                if path.as_os_str().is_empty() {
                    return Err("Excluded path cannot be empty".to_string());
                }
                if !path.is_absolute() {
                    return Err(format!("Excluded path must be absolute: {}", path.display()));
                }
            }
        }
        Ok(())
    }
}

impl DirectoriesConfig {
    /// Create a new config builder.
    pub fn builder() -> DirectoriesConfigBuilder {
        DirectoriesConfigBuilder::default()
    }

    /// The state `path` has by virtue of what it is, if any.
    ///
    /// This is consulted before inheritance, so a hidden folder under a
    /// reference root is still excluded.
    pub fn default_state(&self, path: &Path) -> Option<ScanState> {
        if self.excluded_paths.iter().any(|p| p == path) {
            return Some(ScanState::Excluded);
        }
        if self.exclude_hidden && is_hidden(path, self.hidden_prefix) {
            return Some(ScanState::Excluded);
        }
        None
    }
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            exclude_hidden: true,
            hidden_prefix: '.',
            excluded_paths: Vec::new(),
        }
    }
}

/// Which files the local filesystem facade reports.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FsConfig {
    /// Minimum file size in bytes.
    #[builder(default = "0")]
    #[serde(default)]
    pub min_size: u64,

    /// Maximum file size in bytes (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_size: Option<u64>,

    /// File name patterns to skip (glob syntax).
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Directory extensions reported as single files (e.g. `app`).
    #[builder(default)]
    #[serde(default)]
    pub bundle_extensions: Vec<String>,
}

impl FsConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let min = self.min_size.unwrap_or(0);
        if let Some(Some(max)) = self.max_size {
            if min > max {
                return Err(format!("min_size ({min}) exceeds max_size ({max})"));
            }
        }
        if let Some(ref exts) = self.bundle_extensions {
            if exts.iter().any(|e| e.is_empty() || e.starts_with('.')) {
                return Err("Bundle extensions must be non-empty and without a leading dot".to_string());
            }
        }
        Ok(())
    }
}

impl FsConfig {
    /// Create a new config builder.
    pub fn builder() -> FsConfigBuilder {
        FsConfigBuilder::default()
    }

    /// Check if a file of `size` bytes is within the configured bounds.
    pub fn accepts_size(&self, size: u64) -> bool {
        size >= self.min_size && self.max_size.is_none_or(|max| size <= max)
    }

    /// Check if a directory with this extension is a bundle.
    pub fn is_bundle_extension(&self, ext: &str) -> bool {
        self.bundle_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: None,
            exclude_patterns: Vec::new(),
            bundle_extensions: Vec::new(),
        }
    }
}
