//! Core types for dupedirs.
//!
//! This crate provides the I/O-free building blocks of the directory state
//! engine: scan states and their sparse override table, the root set, path
//! containment helpers, traversal records and configuration.

mod config;
mod error;
pub mod path;
mod record;
mod roots;
mod state;

pub use config::{
    DirectoriesConfig, DirectoriesConfigBuilder, DirectoriesConfigBuilderError, FsConfig,
    FsConfigBuilder, FsConfigBuilderError,
};
pub use error::{Cancelled, ConfigError, FsError, RootError};
pub use record::{DirEntry, FileRecord, FolderRecord};
pub use roots::RootSet;
pub use state::{ScanState, StateStore, resolve_state};
