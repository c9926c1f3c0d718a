//! Lazy directory traversal that tolerates per-entry failures.
//!
//! The walker yields a [`WalkEvent`] for every regular file it finds and for
//! every entry it had to give up on. A failure on one entry (permission
//! denied, a file vanishing mid-walk, a dangling symlink) never ends the walk;
//! it is reported as [`WalkEvent::Skipped`] and traversal moves on to the
//! next sibling.
//!
//! Exclude patterns are applied to the bare filename before the entry is
//! stat-ed, so excluded directories are never descended into. Order follows
//! the host's directory listing order.

use crate::pattern::ExcludePatterns;
use std::collections::HashSet;
use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A regular file discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    /// Full path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }
}

/// Why an entry was left out of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    PermissionDenied,
    /// The entry disappeared, or is a symlink pointing nowhere.
    NotFound,
    /// The directory was already visited through another path.
    Cycle,
    Other(io::ErrorKind),
}

impl From<&io::Error> for SkipReason {
    fn from(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => SkipReason::PermissionDenied,
            io::ErrorKind::NotFound => SkipReason::NotFound,
            kind => SkipReason::Other(kind),
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::PermissionDenied => write!(f, "permission denied"),
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::Cycle => write!(f, "directory already visited"),
            SkipReason::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// One step of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    File(FileEntry),
    Skipped { path: PathBuf, reason: SkipReason },
}

/// How far and how long a walk runs.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Descend into subdirectories. When false only the root's direct
    /// children are listed.
    pub recursive: bool,
    /// Checked between entries; once set the walk ends early.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl WalkOptions {
    pub fn recursive() -> Self {
        Self {
            recursive: true,
            cancel: None,
        }
    }

    pub fn single_level() -> Self {
        Self {
            recursive: false,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Iterator over the files under a root directory.
///
/// Only one directory handle is held open at a time; directories waiting to
/// be listed are kept as paths.
pub struct DirectoryWalker<'p> {
    patterns: &'p ExcludePatterns,
    options: WalkOptions,
    current: Option<(PathBuf, ReadDir)>,
    pending: Vec<PathBuf>,
    visited: HashSet<PathBuf>,
}

impl<'p> DirectoryWalker<'p> {
    /// Prepares a walk rooted at `root`. Nothing is read until the first
    /// call to `next`.
    pub fn new(root: &Path, patterns: &'p ExcludePatterns, options: WalkOptions) -> Self {
        let mut visited = HashSet::new();
        if let Ok(canonical) = fs::canonicalize(root) {
            visited.insert(canonical);
        }

        Self {
            patterns,
            options,
            current: None,
            pending: vec![root.to_path_buf()],
            visited,
        }
    }

    /// Drops skip events, yielding only the files.
    pub fn files(self) -> impl Iterator<Item = FileEntry> + 'p {
        self.filter_map(|event| match event {
            WalkEvent::File(entry) => Some(entry),
            WalkEvent::Skipped { .. } => None,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn skipped(path: PathBuf, reason: SkipReason) -> WalkEvent {
        debug!(path = %path.display(), %reason, "skipping entry");
        WalkEvent::Skipped { path, reason }
    }

    /// Inspects one listed entry. Returns `None` when the entry is excluded,
    /// queued for descent, or neither a file nor a directory.
    fn inspect(&mut self, entry: fs::DirEntry) -> Option<WalkEvent> {
        let file_name = entry.file_name();
        if self.patterns.matches(&file_name.to_string_lossy()) {
            return None;
        }

        let path = entry.path();
        // Follows symlinks, so a linked file counts with its target's size.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => return Some(Self::skipped(path, SkipReason::from(&e))),
        };

        if metadata.is_file() {
            return Some(WalkEvent::File(FileEntry::new(path, metadata.len())));
        }

        if metadata.is_dir() && self.options.recursive {
            let canonical = match fs::canonicalize(&path) {
                Ok(canonical) => canonical,
                Err(e) => return Some(Self::skipped(path, SkipReason::from(&e))),
            };
            if !self.visited.insert(canonical) {
                return Some(Self::skipped(path, SkipReason::Cycle));
            }
            self.pending.push(path);
        }

        None
    }
}

impl Iterator for DirectoryWalker<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            if self.is_cancelled() {
                self.current = None;
                self.pending.clear();
                return None;
            }

            if let Some((dir, entries)) = self.current.as_mut() {
                match entries.next() {
                    Some(Ok(entry)) => {
                        if let Some(event) = self.inspect(entry) {
                            return Some(event);
                        }
                    }
                    Some(Err(e)) => {
                        let dir = dir.clone();
                        return Some(Self::skipped(dir, SkipReason::from(&e)));
                    }
                    None => self.current = None,
                }
                continue;
            }

            let dir = self.pending.pop()?;
            match fs::read_dir(&dir) {
                Ok(entries) => self.current = Some((dir, entries)),
                Err(e) => return Some(Self::skipped(dir, SkipReason::from(&e))),
            }
        }
    }
}
