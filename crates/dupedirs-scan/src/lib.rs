//! Directory state tracking and traversal engine for dupedirs.
//!
//! # Overview
//!
//! [`Directories`] holds the roots a duplicate scan starts from and an
//! inheritable [`ScanState`] for every path beneath them:
//!
//! - **Roots** never overlap; adding a parent of existing roots replaces them
//! - **States** resolve as override, then type default (hidden folders are
//!   excluded), then the parent's state, then normal
//! - **Files** are enumerated lazily, pre-order, skipping excluded subtrees
//!   that contain no overrides
//! - **Folders** are enumerated lazily, children before parents
//! - **Persistence** as a small XML document of roots and overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dupedirs_scan::{CancellationToken, Directories, ScanState};
//!
//! let mut dirs = Directories::local();
//! dirs.add_root("/data").unwrap();
//! dirs.set_state(Path::new("/data/backup"), ScanState::Reference);
//!
//! let cancel = CancellationToken::new();
//! for file in dirs.files(&cancel) {
//!     let file = file.unwrap();
//!     println!("{} (reference: {})", file.path.display(), file.is_reference);
//! }
//! ```
//!
//! # Cancellation
//!
//! Cancel the token from any thread; the iterator yields
//! `Err(Cancelled)` at its next step and then ends:
//!
//! ```rust,no_run
//! use dupedirs_scan::{CancellationToken, Directories};
//!
//! let dirs = Directories::local();
//! let cancel = CancellationToken::new();
//! let handle = cancel.clone();
//! std::thread::spawn(move || handle.cancel());
//!
//! let result: Result<Vec<_>, _> = dirs.files(&cancel).collect();
//! ```

mod directories;
mod fs;
mod persist;
mod progress;
mod walk;

pub use directories::Directories;
pub use fs::{FileSystem, LocalFs};
pub use persist::{LoadSummary, PersistError};
pub use progress::ScanProgress;
pub use walk::{Files, Folders};

pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use dupedirs_core::{
    Cancelled, ConfigError, DirEntry, DirectoriesConfig, FileRecord, FolderRecord, FsConfig,
    FsError, RootError, RootSet, ScanState, StateStore,
};
