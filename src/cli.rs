//! Command-line interface module for dirsweep.
//!
//! Parses arguments with `clap`, opens the settings and category stores once
//! per invocation and hands a read-only snapshot of both to the operation
//! being run.

use crate::config::{ConfigError, SettingKey, SettingValue, SettingsStore, data_dir};
use crate::file_category::{CategoryError, CategoryStore};
use crate::file_organizer::ClutterOrganizer;
use crate::finder::LargestFilesFinder;
use crate::output::OutputFormatter;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Find the largest files under a directory and sweep clutter into
/// category folders.
#[derive(Debug, Parser)]
#[command(name = "dirsweep", version, about)]
pub struct Cli {
    /// Directory holding config.json and categories.json
    /// [default: $DIRSWEEP_HOME or the platform data directory]
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the largest files under the configured root
    Largest {
        /// Number of files to report
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        /// Scan this directory instead of the configured Root
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Move files from the source directory into category folders
    Organize {
        /// Sweep this directory instead of the configured SourcePath
        #[arg(long)]
        source: Option<PathBuf>,
        /// Create category folders here instead of the configured DestinationPath
        #[arg(long)]
        destination: Option<PathBuf>,
        /// Show what would be moved without touching any file
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage extension categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print every setting
    Show,
    /// Print one setting (Root, SourcePath, DestinationPath, ExcludePattern)
    Get { key: String },
    /// Change one setting; ExcludePattern takes several values
    Set {
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CategoryAction {
    /// Print every category and its extensions
    List,
    /// Add a category, replacing one with the same name
    Add {
        name: String,
        #[arg(required = true)]
        extensions: Vec<String>,
    },
    /// Add extensions to an existing category
    Update {
        name: String,
        #[arg(required = true)]
        extensions: Vec<String>,
    },
    /// Remove a category
    Delete { name: String },
}

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Category(#[from] CategoryError),
}

/// Runs one parsed command.
///
/// Returns `ExitCode::FAILURE` when the command itself completed but some
/// files could not be moved.
pub fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let dir = match cli.data_dir {
        Some(dir) => dir,
        None => data_dir()?,
    };

    match cli.command {
        Command::Largest { count, root } => run_largest(&dir, count, root),
        Command::Organize {
            source,
            destination,
            dry_run,
        } => run_organize(&dir, source, destination, dry_run),
        Command::Config { action } => run_config(&dir, action),
        Command::Category { action } => run_category(&dir, action),
    }
}

fn run_largest(
    dir: &std::path::Path,
    count: usize,
    root: Option<PathBuf>,
) -> Result<ExitCode, CliError> {
    let settings = SettingsStore::open(dir)?.load()?;
    let root = match root {
        Some(root) => root,
        None => settings.root()?.to_path_buf(),
    };
    let excludes = settings.compiled_excludes()?;

    OutputFormatter::info(&format!("Scanning {}", root.display()));
    let spinner = OutputFormatter::create_scan_spinner();
    let result =
        LargestFilesFinder::new(&excludes).find_with_progress(&root, count, |_| spinner.inc(1));
    spinner.finish_and_clear();
    let summary = result?;

    OutputFormatter::largest_files_table(&summary.files);
    if summary.skipped > 0 {
        OutputFormatter::warning(&format!(
            "{} entries could not be read and were left out.",
            summary.skipped
        ));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_organize(
    dir: &std::path::Path,
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    dry_run: bool,
) -> Result<ExitCode, CliError> {
    let settings = SettingsStore::open(dir)?.load()?;
    let categories = CategoryStore::open(dir)?.get()?;

    let source = match source {
        Some(source) => source,
        None => settings.source_path()?.to_path_buf(),
    };
    let destination = match destination {
        Some(destination) => destination,
        None => settings.destination_path()?.to_path_buf(),
    };
    let excludes = settings.compiled_excludes()?;
    let organizer = ClutterOrganizer::new(&excludes, &categories);

    if dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing {} → {}",
            source.display(),
            destination.display()
        ));
        let plan = organizer.plan(&source, &destination)?;
        OutputFormatter::plan(&plan);
        OutputFormatter::dry_run_notice("No files were modified.");
        return Ok(ExitCode::SUCCESS);
    }

    OutputFormatter::info(&format!(
        "Organizing {} → {}",
        source.display(),
        destination.display()
    ));
    let report = organizer.organize(&source, &destination)?;
    OutputFormatter::report(&report);

    if report.is_complete_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn run_config(dir: &std::path::Path, action: ConfigAction) -> Result<ExitCode, CliError> {
    let store = SettingsStore::open(dir)?;

    match action {
        ConfigAction::Show => {
            let settings = store.load()?;
            OutputFormatter::header(&store.path().display().to_string());
            for key in SettingKey::ALL {
                match settings.get(key) {
                    Ok(value) => OutputFormatter::plain(&format!("{} = {}", key, value)),
                    Err(_) => OutputFormatter::warning(&format!("{} is not set", key)),
                }
            }
        }
        ConfigAction::Get { key } => {
            let key: SettingKey = key.parse()?;
            OutputFormatter::plain(&store.get(key)?.to_string());
        }
        ConfigAction::Set { key, mut values } => {
            let key: SettingKey = key.parse()?;
            let value = if key == SettingKey::ExcludePattern {
                SettingValue::Patterns(values)
            } else if values.len() == 1 {
                SettingValue::Path(PathBuf::from(values.remove(0)))
            } else {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "expected a single path".to_string(),
                }
                .into());
            };
            store.set(key, value)?;
            OutputFormatter::success(&format!("{} updated", key));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_category(dir: &std::path::Path, action: CategoryAction) -> Result<ExitCode, CliError> {
    let store = CategoryStore::open(dir)?;

    match action {
        CategoryAction::List => {
            let categories = store.get()?;
            if categories.is_empty() {
                OutputFormatter::info("No categories defined.");
            }
            for (name, extensions) in categories.iter() {
                let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
                OutputFormatter::plain(&format!("{}: {}", name, extensions.join(" ")));
            }
            for (extension, names) in categories.overlaps() {
                OutputFormatter::warning(&format!(
                    "{} belongs to {}; files go to {}",
                    extension,
                    names.join(", "),
                    names[0]
                ));
            }
        }
        CategoryAction::Add { name, extensions } => {
            store.add(&name, &extensions)?;
            OutputFormatter::success(&format!("Category {} saved", name));
        }
        CategoryAction::Update { name, extensions } => {
            store.update(&name, &extensions)?;
            OutputFormatter::success(&format!("Category {} updated", name));
        }
        CategoryAction::Delete { name } => {
            store.delete(&name)?;
            OutputFormatter::success(&format!("Category {} deleted", name));
        }
    }
    Ok(ExitCode::SUCCESS)
}
