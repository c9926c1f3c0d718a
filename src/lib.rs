//! dirsweep - local filesystem housekeeping
//!
//! This library finds the largest files under a directory tree and sweeps
//! cluttered directories into extension-based category subdirectories. Both
//! operations read their settings and categories from small JSON stores in
//! the per-user data directory.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod finder;
pub mod output;
pub mod pattern;
pub mod top_n;
pub mod walker;

pub use config::{ConfigError, SettingKey, SettingValue, Settings, SettingsStore};
pub use file_category::{CategoryError, CategoryMap, CategoryStore, ExtensionIndex};
pub use file_organizer::{ClutterOrganizer, MoveError, OrganizePlan, OrganizeReport, move_file};
pub use finder::{FindSummary, LargestFilesFinder, find_largest};
pub use pattern::ExcludePatterns;
pub use top_n::TopNSelector;
pub use walker::{DirectoryWalker, FileEntry, SkipReason, WalkEvent, WalkOptions};

pub use cli::{Cli, run};
