//! Lazy depth-first file and folder enumeration.
//!
//! Both iterators keep an explicit stack instead of recursing, and poll the
//! cancellation token each time they step into a directory. Facade errors
//! end the affected subtree only.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use dupedirs_core::{Cancelled, FileRecord, FolderRecord, FsError, ScanState};

use crate::directories::Directories;
use crate::fs::FileSystem;
use crate::progress::ProgressTracker;

/// Iterator over the files of all roots. Created by [`Directories::files`].
///
/// Directories are visited in pre-order: the files of a directory come
/// before anything from its subdirectories. An excluded directory with no
/// override at or below it is skipped without touching the filesystem.
pub struct Files<'a, F: FileSystem> {
    dirs: &'a Directories<F>,
    cancel: CancellationToken,
    stack: Vec<PathBuf>,
    ready: std::vec::IntoIter<FileRecord>,
    tracker: ProgressTracker,
    done: bool,
}

impl<'a, F: FileSystem> Files<'a, F> {
    pub(crate) fn new(dirs: &'a Directories<F>, cancel: &CancellationToken) -> Self {
        Self {
            stack: dirs.roots().iter().rev().map(Path::to_path_buf).collect(),
            cancel: cancel.clone(),
            ready: Vec::new().into_iter(),
            tracker: dirs.tracker(),
            done: false,
            dirs,
        }
    }

    fn visit(&mut self, path: &Path) {
        let state = self.dirs.resolve_state(path);
        if state == ScanState::Excluded && !self.dirs.overrides().has_override_under(path) {
            trace!(path = %path.display(), "Pruned excluded subtree");
            return;
        }
        self.tracker.record_dir(path);

        if state != ScanState::Excluded {
            let mut files = match self.dirs.fs().list_files(path) {
                Ok(files) => files,
                Err(err) => return self.skip(err),
            };
            debug!(count = files.len(), path = %path.display(), "Collected files");
            for file in &mut files {
                file.is_reference = state == ScanState::Reference;
            }
            self.ready = files.into_iter();
        }

        match self.dirs.fs().list_entries(path) {
            Ok(entries) => self.stack.extend(
                entries
                    .into_iter()
                    .rev()
                    .filter(|entry| entry.is_traversable())
                    .map(|entry| entry.path),
            ),
            Err(err) => self.skip(err),
        }
    }

    fn skip(&mut self, err: FsError) {
        debug!(path = %err.path().display(), %err, "Skipping inaccessible subtree");
        self.tracker.record_error();
    }

    fn abort(&mut self) -> Option<Result<FileRecord, Cancelled>> {
        debug!("File enumeration cancelled");
        self.stack.clear();
        self.done = true;
        self.tracker.finish();
        Some(Err(Cancelled))
    }
}

impl<F: FileSystem> Iterator for Files<'_, F> {
    type Item = Result<FileRecord, Cancelled>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.ready.next() {
                self.tracker.record_file(file.size);
                return Some(Ok(file));
            }
            if self.done {
                return None;
            }
            let Some(path) = self.stack.pop() else {
                self.done = true;
                self.tracker.finish();
                return None;
            };
            if self.cancel.is_cancelled() {
                return self.abort();
            }
            self.visit(&path);
        }
    }
}

enum Step {
    Enter(PathBuf),
    Leave(PathBuf),
}

/// Iterator over the folders of all roots. Created by [`Directories::folders`].
///
/// Folders are yielded in post-order. Descent never depends on state: an
/// excluded folder is not yielded itself, but its subfolders still are
/// unless they resolve to excluded as well.
pub struct Folders<'a, F: FileSystem> {
    dirs: &'a Directories<F>,
    cancel: CancellationToken,
    stack: Vec<Step>,
    tracker: ProgressTracker,
    done: bool,
}

impl<'a, F: FileSystem> Folders<'a, F> {
    pub(crate) fn new(dirs: &'a Directories<F>, cancel: &CancellationToken) -> Self {
        Self {
            stack: dirs
                .roots()
                .iter()
                .rev()
                .map(|root| Step::Enter(root.to_path_buf()))
                .collect(),
            cancel: cancel.clone(),
            tracker: dirs.tracker(),
            done: false,
            dirs,
        }
    }

    fn enter(&mut self, path: PathBuf) {
        self.tracker.record_dir(&path);
        match self.dirs.fs().list_entries(&path) {
            Ok(entries) => {
                self.stack.push(Step::Leave(path));
                self.stack.extend(
                    entries
                        .into_iter()
                        .rev()
                        .filter(|entry| entry.is_traversable())
                        .map(|entry| Step::Enter(entry.path)),
                );
            }
            Err(err) => {
                debug!(path = %err.path().display(), %err, "Skipping inaccessible folder");
                self.tracker.record_error();
            }
        }
    }

    fn leave(&mut self, path: PathBuf) -> Option<FolderRecord> {
        let state = self.dirs.resolve_state(&path);
        if state == ScanState::Excluded {
            return None;
        }
        trace!(path = %path.display(), %state, "Yielding folder");
        self.tracker.record_folder();
        Some(FolderRecord::new(path, state == ScanState::Reference))
    }
}

impl<F: FileSystem> Iterator for Folders<'_, F> {
    type Item = Result<FolderRecord, Cancelled>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Enter(path) => {
                    if self.cancel.is_cancelled() {
                        debug!("Folder enumeration cancelled");
                        self.stack.clear();
                        self.done = true;
                        self.tracker.finish();
                        return Some(Err(Cancelled));
                    }
                    self.enter(path);
                }
                Step::Leave(path) => {
                    if let Some(folder) = self.leave(path) {
                        return Some(Ok(folder));
                    }
                }
            }
        }
        self.done = true;
        self.tracker.finish();
        None
    }
}
