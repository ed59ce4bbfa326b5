//! Root directories, their scan states, and traversal entry points.

use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use dupedirs_core::{DirectoriesConfig, RootError, RootSet, ScanState, StateStore, resolve_state};

use crate::fs::{FileSystem, LocalFs};
use crate::progress::{ProgressTracker, ScanProgress};
use crate::walk::{Files, Folders};

/// The set of directories to scan and the state of every path under them.
///
/// Roots and overrides can only change through `&mut self`, and traversal
/// iterators borrow `self`, so state is frozen while a traversal runs.
pub struct Directories<F: FileSystem = LocalFs> {
    roots: RootSet,
    states: StateStore,
    config: DirectoriesConfig,
    fs: F,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl Directories<LocalFs> {
    /// Create an empty set backed by the local disk with default rules.
    pub fn local() -> Self {
        Self::new(LocalFs::default())
    }
}

impl<F: FileSystem> Directories<F> {
    /// Create an empty set using `fs` for all filesystem access.
    pub fn new(fs: F) -> Self {
        Self::with_config(fs, DirectoriesConfig::default())
    }

    /// Create an empty set with a custom default-state policy.
    pub fn with_config(fs: F, config: DirectoriesConfig) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            roots: RootSet::new(),
            states: StateStore::new(),
            config,
            fs,
            progress_tx,
        }
    }

    /// Subscribe to traversal progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// The filesystem facade.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// The default-state policy.
    pub fn config(&self) -> &DirectoriesConfig {
        &self.config
    }

    /// The root directories.
    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// The explicit state overrides.
    pub fn overrides(&self) -> &StateStore {
        &self.states
    }

    /// Add a root directory.
    ///
    /// Fails with [`RootError::AlreadyPresent`] if `path` is already covered
    /// and [`RootError::InvalidPath`] if it does not exist. Roots under
    /// `path` are replaced by it.
    pub fn add_root(&mut self, path: impl Into<PathBuf>) -> Result<(), RootError> {
        let path = path.into();
        if !self.roots.contains(&path) && !self.fs.exists(&path) {
            return Err(RootError::InvalidPath { path });
        }
        let evicted = self.roots.add(path)?;
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "Roots replaced by an enclosing root");
        }
        Ok(())
    }

    /// Remove the root at `index`.
    pub fn remove_root(&mut self, index: usize) -> Option<PathBuf> {
        self.roots.remove(index)
    }

    /// Check if `path` is a root or lies under one.
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.contains(path)
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if there are no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// The effective state of `path`.
    pub fn resolve_state(&self, path: &Path) -> ScanState {
        resolve_state(path, &self.roots, &self.states, &self.config)
    }

    /// Set the state of `path`, keeping the override table minimal.
    pub fn set_state(&mut self, path: &Path, state: ScanState) {
        self.states.set(path, state, &self.roots, &self.config);
    }

    /// Check if `path` has an explicit override.
    pub fn has_override(&self, path: &Path) -> bool {
        self.states.has_override(path)
    }

    /// Lazily enumerate qualifying files under all roots.
    ///
    /// Each item is a file with `is_reference` set from its directory's
    /// state. Once `cancel` fires, the next step yields `Err(Cancelled)` and
    /// the iterator ends.
    pub fn files(&self, cancel: &CancellationToken) -> Files<'_, F> {
        Files::new(self, cancel)
    }

    /// Lazily enumerate non-excluded folders under all roots, children first.
    pub fn folders(&self, cancel: &CancellationToken) -> Folders<'_, F> {
        Folders::new(self, cancel)
    }

    /// Subdirectories directly inside `path`, sorted case-insensitively.
    ///
    /// Returns an empty list if `path` cannot be read.
    pub fn list_subfolders(&self, path: &Path) -> Vec<PathBuf> {
        let mut subfolders: Vec<_> = match self.fs.list_entries(path) {
            Ok(entries) => entries.into_iter().filter(|e| e.is_dir).collect(),
            Err(err) => {
                debug!(%err, "Cannot list subfolders");
                return Vec::new();
            }
        };
        subfolders.sort_by_cached_key(|e| e.name.to_lowercase());
        subfolders.into_iter().map(|e| e.path).collect()
    }

    /// Check if any root contains at least one qualifying file.
    pub fn has_any_file(&self) -> bool {
        matches!(self.files(&CancellationToken::new()).next(), Some(Ok(_)))
    }

    pub(crate) fn tracker(&self) -> ProgressTracker {
        ProgressTracker::new(self.progress_tx.clone())
    }
}

impl<F: FileSystem + std::fmt::Debug> std::fmt::Debug for Directories<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directories")
            .field("roots", &self.roots)
            .field("states", &self.states)
            .field("config", &self.config)
            .field("fs", &self.fs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        // The default `.tmp` prefix would make the root itself hidden.
        let temp = tempfile::Builder::new().prefix("dirs").tempdir().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("docs/old")).unwrap();
        fs::create_dir(root.join("Music")).unwrap();
        fs::create_dir(root.join(".git")).unwrap();

        fs::write(root.join("top.txt"), "top").unwrap();
        fs::write(root.join("docs/a.txt"), "aaaa").unwrap();
        fs::write(root.join("docs/old/b.txt"), "bb").unwrap();
        fs::write(root.join("Music/song.mp3"), "la la").unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();

        temp
    }

    fn names(files: &[dupedirs_core::FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_add_root_errors() {
        let temp = create_test_tree();
        let mut dirs = Directories::local();

        dirs.add_root(temp.path().join("docs")).unwrap();
        assert!(matches!(
            dirs.add_root(temp.path().join("docs/old")),
            Err(RootError::AlreadyPresent { .. })
        ));
        assert!(matches!(
            dirs.add_root(temp.path().join("missing")),
            Err(RootError::InvalidPath { .. })
        ));

        dirs.add_root(temp.path()).unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs.roots().get(0), Some(temp.path()));
    }

    #[test]
    fn test_files_follow_states() {
        let temp = create_test_tree();
        let mut dirs = Directories::local();
        dirs.add_root(temp.path()).unwrap();
        dirs.set_state(&temp.path().join("docs"), ScanState::Reference);
        dirs.set_state(&temp.path().join("docs/old"), ScanState::Excluded);

        let files: Vec<_> = dirs
            .files(&CancellationToken::new())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(names(&files), vec!["top.txt", "song.mp3", "a.txt"]);
        assert!(!files[0].is_reference);
        assert!(!files[1].is_reference);
        assert!(files[2].is_reference);
    }

    #[test]
    fn test_folders_post_order() {
        let temp = create_test_tree();
        let mut dirs = Directories::local();
        dirs.add_root(temp.path()).unwrap();
        dirs.set_state(&temp.path().join("docs"), ScanState::Reference);

        let folders: Vec<_> = dirs
            .folders(&CancellationToken::new())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let paths: Vec<_> = folders.iter().map(|f| f.path.clone()).collect();

        assert_eq!(
            paths,
            vec![
                temp.path().join("Music"),
                temp.path().join("docs/old"),
                temp.path().join("docs"),
                temp.path().to_path_buf(),
            ]
        );
        assert!(!folders[0].is_reference);
        assert!(folders[1].is_reference);
        assert!(folders[2].is_reference);
    }

    #[test]
    fn test_filtered_bundle_is_not_entered() {
        let temp = create_test_tree();
        fs::create_dir(temp.path().join("Photos.bundle")).unwrap();
        fs::write(temp.path().join("Photos.bundle/inner.jpg"), "img").unwrap();

        let config = dupedirs_core::FsConfig::builder()
            .bundle_extensions(vec!["bundle".to_string()])
            .exclude_patterns(vec!["*.bundle".to_string()])
            .build()
            .unwrap();
        let mut dirs = Directories::new(LocalFs::new(config).unwrap());
        dirs.add_root(temp.path()).unwrap();

        let files: Vec<_> = dirs
            .files(&CancellationToken::new())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(names(&files), vec!["top.txt", "song.mp3", "a.txt", "b.txt"]);

        let folders: Vec<_> = dirs
            .folders(&CancellationToken::new())
            .map(|f| f.unwrap().path)
            .collect();
        assert!(!folders.contains(&temp.path().join("Photos.bundle")));
    }

    #[test]
    fn test_list_subfolders_case_insensitive() {
        let temp = create_test_tree();
        let dirs = Directories::local();

        let subfolders = dirs.list_subfolders(temp.path());
        assert_eq!(
            subfolders,
            vec![
                temp.path().join(".git"),
                temp.path().join("docs"),
                temp.path().join("Music"),
            ]
        );
        assert!(dirs.list_subfolders(&temp.path().join("missing")).is_empty());
    }

    #[test]
    fn test_has_any_file() {
        let temp = create_test_tree();
        let mut dirs = Directories::local();
        assert!(!dirs.has_any_file());

        dirs.add_root(temp.path().join(".git")).unwrap();
        assert!(!dirs.has_any_file());

        dirs.add_root(temp.path().join("docs")).unwrap();
        assert!(dirs.has_any_file());
    }

    #[test]
    fn test_progress_reports_final_snapshot() {
        let temp = create_test_tree();
        let mut dirs = Directories::local();
        dirs.add_root(temp.path()).unwrap();
        let mut rx = dirs.subscribe();

        let count = dirs.files(&CancellationToken::new()).count();

        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.files_found, count as u64);
        assert_eq!(last.files_found, 4);
        assert_eq!(last.dirs_visited, 4);
    }
}
