/// Sweeping a cluttered directory into category subdirectories.
///
/// Files directly under a source directory are matched by extension against a
/// [`CategoryMap`] and moved into `<destination>/<category>/`. Files whose
/// extension belongs to no category stay where they are.
///
/// Moves copy bytes rather than rename so they also work across filesystems.
/// The source file is only removed once the copy is complete and both handles
/// are closed; a failed copy never costs the source.
use crate::config::ConfigError;
use crate::file_category::{CategoryMap, ExtensionIndex};
use crate::pattern::ExcludePatterns;
use crate::walker::{DirectoryWalker, WalkOptions};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Bytes copied per read/write round.
pub const BLOCK_SIZE: usize = 1024;

/// Errors that can occur while moving a single file.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("failed to create category directory {}: {source}", .path.display())]
    CreateCategoryDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open {} for reading: {source}", .path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination {} already exists", .0.display())]
    DestinationExists(PathBuf),

    #[error("failed to create {}: {source}", .path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("incomplete copy of {}: expected {expected} bytes, wrote {copied}", .path.display())]
    Incomplete {
        path: PathBuf,
        expected: u64,
        copied: u64,
    },

    #[error("copied {} but could not remove the original: {source}", .path.display())]
    RemoveSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Moves `source` to `destination` by block copy followed by unlink.
///
/// The destination must not exist yet. If anything goes wrong before the
/// copy is verified, the partially written destination is removed and the
/// source is left untouched. Returns the number of bytes moved.
///
/// # Examples
///
/// ```no_run
/// use dirsweep::file_organizer::move_file;
/// use std::path::Path;
///
/// match move_file(Path::new("/tmp/song.mp3"), Path::new("/mnt/usb/song.mp3")) {
///     Ok(bytes) => println!("moved {} bytes", bytes),
///     Err(e) => eprintln!("move failed: {}", e),
/// }
/// ```
pub fn move_file(source: &Path, destination: &Path) -> Result<u64, MoveError> {
    let copied = match copy_blocks(source, destination) {
        Ok(copied) => copied,
        Err(e) => {
            // Only a destination this call created may be removed.
            if matches!(e, MoveError::Copy { .. } | MoveError::Incomplete { .. })
                && let Err(cleanup) = fs::remove_file(destination)
            {
                warn!(
                    path = %destination.display(),
                    error = %cleanup,
                    "could not remove partial copy"
                );
            }
            return Err(e);
        }
    };

    fs::remove_file(source).map_err(|e| MoveError::RemoveSource {
        path: source.to_path_buf(),
        source: e,
    })?;

    Ok(copied)
}

/// Copies `source` into a freshly created `destination`.
///
/// Both handles are closed when this returns; the byte count is checked
/// against the source length recorded when it was opened.
fn copy_blocks(source: &Path, destination: &Path) -> Result<u64, MoveError> {
    let mut reader = File::open(source).map_err(|e| MoveError::OpenSource {
        path: source.to_path_buf(),
        source: e,
    })?;
    let expected = reader
        .metadata()
        .map_err(|e| MoveError::OpenSource {
            path: source.to_path_buf(),
            source: e,
        })?
        .len();

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                MoveError::DestinationExists(destination.to_path_buf())
            } else {
                MoveError::CreateDestination {
                    path: destination.to_path_buf(),
                    source: e,
                }
            }
        })?;

    let copy_error = |e: io::Error| MoveError::Copy {
        from: source.to_path_buf(),
        to: destination.to_path_buf(),
        source: e,
    };

    let mut buffer = [0u8; BLOCK_SIZE];
    let mut copied: u64 = 0;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(copy_error(e)),
        };
        writer.write_all(&buffer[..read]).map_err(copy_error)?;
        copied += read as u64;
    }

    writer.flush().map_err(copy_error)?;
    writer.sync_all().map_err(copy_error)?;
    drop(writer);
    drop(reader);

    let written = fs::metadata(destination).map_err(copy_error)?.len();
    if copied != expected || written != copied {
        return Err(MoveError::Incomplete {
            path: source.to_path_buf(),
            expected,
            copied: written,
        });
    }

    Ok(copied)
}

/// A move the organizer intends to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
}

/// What an organize run would do, computed without touching the disk.
#[derive(Debug, Clone, Default)]
pub struct OrganizePlan {
    pub moves: Vec<PlannedMove>,
    /// Files with no extension or an extension no category claims.
    pub unmatched: Vec<PathBuf>,
}

/// A completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
    pub bytes: u64,
}

/// Outcome of an organize run.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    pub moved: Vec<MovedFile>,
    pub unmatched: Vec<PathBuf>,
    /// Files that could not be moved; each source is still in place.
    pub failed: Vec<(PathBuf, MoveError)>,
}

impl OrganizeReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Moves files from a source directory into category subdirectories of a
/// destination directory.
pub struct ClutterOrganizer<'a> {
    excludes: &'a ExcludePatterns,
    index: ExtensionIndex,
}

impl<'a> ClutterOrganizer<'a> {
    /// Builds the extension index for `categories` once for this run.
    pub fn new(excludes: &'a ExcludePatterns, categories: &CategoryMap) -> Self {
        Self {
            excludes,
            index: categories.extension_index(),
        }
    }

    /// Works out where every file in `source` would go.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSource` or `ConfigError::InvalidDestination`
    /// when either path is not an existing directory.
    pub fn plan(&self, source: &Path, destination: &Path) -> Result<OrganizePlan, ConfigError> {
        if !source.is_dir() {
            return Err(ConfigError::InvalidSource(source.to_path_buf()));
        }
        if !destination.is_dir() {
            return Err(ConfigError::InvalidDestination(destination.to_path_buf()));
        }

        let mut plan = OrganizePlan::default();
        let walker = DirectoryWalker::new(source, self.excludes, WalkOptions::single_level());
        for entry in walker.files() {
            let file_name = match entry.path.file_name() {
                Some(name) => name.to_owned(),
                None => continue,
            };

            match self.index.category_for_file(&file_name.to_string_lossy()) {
                Some(category) => {
                    let destination = destination.join(category).join(&file_name);
                    debug!(
                        from = %entry.path.display(),
                        to = %destination.display(),
                        "planned move"
                    );
                    plan.moves.push(PlannedMove {
                        source: entry.path,
                        destination,
                        category: category.to_string(),
                    });
                }
                None => plan.unmatched.push(entry.path),
            }
        }

        Ok(plan)
    }

    /// Organizes `source` into `destination`.
    ///
    /// Category directories are created only for categories that receive a
    /// file. A file that fails to move is recorded in the report and the run
    /// continues with the next file.
    pub fn organize(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<OrganizeReport, ConfigError> {
        let plan = self.plan(source, destination)?;
        Ok(Self::execute(plan))
    }

    /// Carries out a previously computed plan.
    pub fn execute(plan: OrganizePlan) -> OrganizeReport {
        let mut report = OrganizeReport {
            unmatched: plan.unmatched,
            ..Default::default()
        };

        for planned in plan.moves {
            match Self::apply(&planned) {
                Ok(bytes) => {
                    info!(
                        from = %planned.source.display(),
                        to = %planned.destination.display(),
                        bytes,
                        "moved file"
                    );
                    report.moved.push(MovedFile {
                        source: planned.source,
                        destination: planned.destination,
                        category: planned.category,
                        bytes,
                    });
                }
                Err(e) => {
                    warn!(path = %planned.source.display(), error = %e, "could not move file");
                    report.failed.push((planned.source, e));
                }
            }
        }

        report
    }

    fn apply(planned: &PlannedMove) -> Result<u64, MoveError> {
        if let Some(category_dir) = planned.destination.parent() {
            // create_dir_all tolerates a directory that already exists.
            fs::create_dir_all(category_dir).map_err(|e| MoveError::CreateCategoryDir {
                path: category_dir.to_path_buf(),
                source: e,
            })?;
        }
        move_file(&planned.source, &planned.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn categories() -> CategoryMap {
        let mut map = CategoryMap::new();
        map.insert("MP3", [".mp3"]);
        map.insert("DOC", [".doc", ".docx"]);
        map
    }

    #[test]
    fn test_move_file_copies_and_removes_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("big.bin");
        let destination = temp_dir.path().join("moved.bin");
        // Spans several blocks with a ragged tail.
        let content: Vec<u8> = (0..(BLOCK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        fs::write(&source, &content).unwrap();

        let bytes = move_file(&source, &destination).expect("move should succeed");

        assert_eq!(bytes, content.len() as u64);
        assert!(!source.exists());
        assert_eq!(fs::read(&destination).unwrap(), content);
    }

    #[test]
    fn test_move_empty_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("empty");
        let destination = temp_dir.path().join("empty.moved");
        fs::write(&source, b"").unwrap();

        assert_eq!(move_file(&source, &destination).unwrap(), 0);
        assert!(!source.exists());
        assert!(destination.exists());
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        let destination = temp_dir.path().join("b.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&destination, "existing").unwrap();

        let result = move_file(&source, &destination);

        assert!(matches!(result, Err(MoveError::DestinationExists(_))));
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(fs::read_to_string(&destination).unwrap(), "existing");
    }

    #[test]
    fn test_failed_create_keeps_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        let destination = temp_dir.path().join("missing-dir").join("a.txt");
        fs::write(&source, "keep me").unwrap();

        let result = move_file(&source, &destination);

        assert!(matches!(result, Err(MoveError::CreateDestination { .. })));
        assert_eq!(fs::read_to_string(&source).unwrap(), "keep me");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_copy_removes_partial_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        // A directory opens for reading but fails on the first read, after
        // the destination has been created.
        let source = temp_dir.path().join("adir");
        fs::create_dir(&source).unwrap();
        let destination = temp_dir.path().join("out");

        let result = move_file(&source, &destination);

        assert!(matches!(result, Err(MoveError::Copy { .. })));
        assert!(!destination.exists());
        assert!(source.is_dir());
    }

    #[test]
    fn test_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = move_file(
            &temp_dir.path().join("ghost"),
            &temp_dir.path().join("ghost.moved"),
        );
        assert!(matches!(result, Err(MoveError::OpenSource { .. })));
        assert!(!temp_dir.path().join("ghost.moved").exists());
    }

    #[test]
    fn test_plan_touches_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(source.join("song.mp3"), "x").unwrap();
        fs::write(source.join("readme"), "x").unwrap();

        let excludes = ExcludePatterns::default();
        let plan = ClutterOrganizer::new(&excludes, &categories())
            .plan(&source, &destination)
            .unwrap();

        assert_eq!(
            plan.moves,
            vec![PlannedMove {
                source: source.join("song.mp3"),
                destination: destination.join("MP3").join("song.mp3"),
                category: "MP3".to_string(),
            }]
        );
        assert_eq!(plan.unmatched, vec![source.join("readme")]);
        assert!(source.join("song.mp3").exists());
        assert!(!destination.join("MP3").exists());
    }

    #[test]
    fn test_invalid_source_and_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");
        let excludes = ExcludePatterns::default();
        let organizer = ClutterOrganizer::new(&excludes, &categories());

        assert!(matches!(
            organizer.organize(&missing, temp_dir.path()),
            Err(ConfigError::InvalidSource(_))
        ));
        assert!(matches!(
            organizer.organize(temp_dir.path(), &missing),
            Err(ConfigError::InvalidDestination(_))
        ));
    }

    #[test]
    fn test_category_path_blocked_by_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        let destination = temp_dir.path().join("dst");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&destination).unwrap();
        fs::write(source.join("song.mp3"), "audio").unwrap();
        fs::write(source.join("notes.doc"), "text").unwrap();
        // A plain file squatting on the category directory name.
        fs::write(destination.join("MP3"), "not a dir").unwrap();

        let excludes = ExcludePatterns::default();
        let report = ClutterOrganizer::new(&excludes, &categories())
            .organize(&source, &destination)
            .unwrap();

        assert!(!report.is_complete_success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, source.join("song.mp3"));
        assert_eq!(fs::read_to_string(source.join("song.mp3")).unwrap(), "audio");

        // The run carried on with the next file.
        assert_eq!(report.moved.len(), 1);
        assert!(destination.join("DOC/notes.doc").exists());
    }
}
