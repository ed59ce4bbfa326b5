//! Traversal progress reporting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

/// Directories visited between two progress snapshots.
pub(crate) const PROGRESS_INTERVAL: u64 = 256;

/// Progress information during a traversal.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of directories visited so far.
    pub dirs_visited: u64,
    /// Number of files yielded so far.
    pub files_found: u64,
    /// Number of folders yielded so far.
    pub folders_found: u64,
    /// Total bytes of files yielded so far.
    pub bytes_found: u64,
    /// Number of subtrees skipped because they could not be read.
    pub errors_count: u64,
    /// Directory being visited.
    pub current_path: PathBuf,
    /// Time elapsed since traversal started.
    pub elapsed: Duration,
    /// This is the last snapshot of the traversal.
    pub finished: bool,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            dirs_visited: 0,
            files_found: 0,
            folders_found: 0,
            bytes_found: 0,
            errors_count: 0,
            current_path: PathBuf::new(),
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate rate in directories per second.
    pub fn dirs_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.dirs_visited as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts what a traversal has done and broadcasts snapshots.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    tx: broadcast::Sender<ScanProgress>,
    start_time: Instant,
    progress: ScanProgress,
}

impl ProgressTracker {
    pub fn new(tx: broadcast::Sender<ScanProgress>) -> Self {
        Self {
            tx,
            start_time: Instant::now(),
            progress: ScanProgress::new(),
        }
    }

    pub fn record_dir(&mut self, path: &Path) {
        self.progress.dirs_visited += 1;
        if self.progress.dirs_visited % PROGRESS_INTERVAL == 0 {
            self.progress.current_path = path.to_path_buf();
            self.send();
        }
    }

    pub fn record_file(&mut self, size: u64) {
        self.progress.files_found += 1;
        self.progress.bytes_found += size;
    }

    pub fn record_folder(&mut self) {
        self.progress.folders_found += 1;
    }

    pub fn record_error(&mut self) {
        self.progress.errors_count += 1;
    }

    /// Send the final snapshot. Later calls do nothing.
    pub fn finish(&mut self) {
        if !self.progress.finished {
            self.progress.finished = true;
            self.send();
        }
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            elapsed: self.start_time.elapsed(),
            ..self.progress.clone()
        }
    }

    fn send(&self) {
        // No subscribers is fine.
        let _ = self.tx.send(self.snapshot());
    }
}
