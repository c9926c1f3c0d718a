//! The N largest files under a directory tree.

use crate::config::ConfigError;
use crate::pattern::ExcludePatterns;
use crate::top_n::TopNSelector;
use crate::walker::{DirectoryWalker, FileEntry, WalkEvent, WalkOptions};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::info;

/// Result of a search, largest file first.
#[derive(Debug, Clone, Default)]
pub struct FindSummary {
    pub files: Vec<FileEntry>,
    /// Every file offered to the selector.
    pub files_seen: u64,
    /// Entries left out because they could not be read.
    pub skipped: u64,
}

/// Walks a tree recursively and keeps the largest files.
///
/// Unreadable files and directories are left out silently; only an invalid
/// root fails the search.
pub struct LargestFilesFinder<'a> {
    excludes: &'a ExcludePatterns,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> LargestFilesFinder<'a> {
    pub fn new(excludes: &'a ExcludePatterns) -> Self {
        Self {
            excludes,
            cancel: None,
        }
    }

    /// Stops the walk early once `cancel` is set; the files seen so far are
    /// still ranked and returned.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns up to `n` files under `root`, largest first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCount` for `n == 0` and
    /// `ConfigError::InvalidRoot` if `root` is not an existing directory.
    pub fn find(&self, root: &Path, n: usize) -> Result<Vec<FileEntry>, ConfigError> {
        Ok(self.find_with_progress(root, n, |_| {})?.files)
    }

    /// Like [`LargestFilesFinder::find`], calling `on_file` for every file
    /// considered.
    pub fn find_with_progress(
        &self,
        root: &Path,
        n: usize,
        mut on_file: impl FnMut(&FileEntry),
    ) -> Result<FindSummary, ConfigError> {
        let capacity = NonZeroUsize::new(n).ok_or(ConfigError::InvalidCount)?;
        if !root.is_dir() {
            return Err(ConfigError::InvalidRoot(root.to_path_buf()));
        }

        let mut options = WalkOptions::recursive();
        if let Some(cancel) = &self.cancel {
            options = options.with_cancel(Arc::clone(cancel));
        }

        let mut selector = TopNSelector::new(capacity);
        let mut summary = FindSummary::default();

        for event in DirectoryWalker::new(root, self.excludes, options) {
            match event {
                WalkEvent::File(entry) => {
                    on_file(&entry);
                    summary.files_seen += 1;
                    selector.offer(entry);
                }
                WalkEvent::Skipped { .. } => summary.skipped += 1,
            }
        }

        let mut files = selector.results();
        files.sort_by(|a, b| b.size.cmp(&a.size));
        summary.files = files;

        info!(
            root = %root.display(),
            seen = summary.files_seen,
            skipped = summary.skipped,
            kept = summary.files.len(),
            "largest-file search finished"
        );
        Ok(summary)
    }
}

/// Convenience wrapper compiling `exclude_patterns` and running a search.
pub fn find_largest<S: AsRef<str>>(
    root: &Path,
    exclude_patterns: &[S],
    n: usize,
) -> Result<Vec<FileEntry>, ConfigError> {
    let excludes = ExcludePatterns::compile(exclude_patterns)?;
    LargestFilesFinder::new(&excludes).find(root, n)
}
