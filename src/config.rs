//! Persisted per-user settings.
//!
//! Settings live in `config.json` inside the per-user data directory, next to
//! the category store. The file is created with platform defaults the first
//! time a store is opened; afterwards every `load` re-reads it from disk.
//!
//! # File Format
//!
//! ```json
//! {
//!   "DestinationPath": "/home/user/Documents",
//!   "ExcludePattern": [".*", "*.o"],
//!   "Root": "/home/user",
//!   "SourcePath": "/home/user/Desktop"
//! }
//! ```

use crate::pattern::ExcludePatterns;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "DIRSWEEP_HOME";

const APP_DIR_NAME: &str = "dirsweep";
const CONFIG_FILE: &str = "config.json";

/// Errors raised while loading, querying or applying settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("configuration file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("configuration key '{0}' is not set")]
    MissingKey(SettingKey),

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: SettingKey, reason: String },

    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },

    #[error("root {} does not exist or is not a directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("source {} does not exist or is not a directory", .0.display())]
    InvalidSource(PathBuf),

    #[error("destination {} does not exist or is not a directory", .0.display())]
    InvalidDestination(PathBuf),

    #[error("the number of files to report must be at least 1")]
    InvalidCount,

    #[error("could not determine a per-user data directory")]
    NoDataDirectory,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves the per-user data directory.
///
/// `DIRSWEEP_HOME` wins when set; otherwise the platform's local data
/// directory is used (`~/.local/share/dirsweep` on Linux,
/// `%LOCALAPPDATA%\dirsweep` on Windows).
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(ConfigError::NoDataDirectory)
}

/// Creates `dir` if missing.
pub(crate) fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// The settings keys understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Root,
    SourcePath,
    DestinationPath,
    ExcludePattern,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::Root,
        SettingKey::SourcePath,
        SettingKey::DestinationPath,
        SettingKey::ExcludePattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::Root => "Root",
            SettingKey::SourcePath => "SourcePath",
            SettingKey::DestinationPath => "DestinationPath",
            SettingKey::ExcludePattern => "ExcludePattern",
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// A value held under a [`SettingKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Path(PathBuf),
    Patterns(Vec<String>),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Path(path) => write!(f, "{}", path.display()),
            SettingValue::Patterns(patterns) => write!(f, "{}", patterns.join(" ")),
        }
    }
}

/// A snapshot of the persisted settings.
///
/// Fields are optional so that a hand-edited file missing a key still loads;
/// the gap surfaces as `ConfigError::MissingKey` when the key is queried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_pattern: Option<Vec<String>>,
}

impl Settings {
    /// First-run settings for the current user.
    ///
    /// Scanning starts at the home directory; clutter is swept from the
    /// desktop into the documents directory.
    pub fn platform_defaults() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let desktop = dirs::desktop_dir().unwrap_or_else(|| home.join("Desktop"));
        let documents = dirs::document_dir().unwrap_or_else(|| home.join("Documents"));

        Self {
            root: Some(home),
            source_path: Some(desktop),
            destination_path: Some(documents),
            exclude_pattern: Some(vec![".*".to_string(), "*.o".to_string()]),
        }
    }

    pub fn get(&self, key: SettingKey) -> Result<SettingValue, ConfigError> {
        let value = match key {
            SettingKey::Root => self.root.clone().map(SettingValue::Path),
            SettingKey::SourcePath => self.source_path.clone().map(SettingValue::Path),
            SettingKey::DestinationPath => self.destination_path.clone().map(SettingValue::Path),
            SettingKey::ExcludePattern => {
                self.exclude_pattern.clone().map(SettingValue::Patterns)
            }
        };
        value.ok_or(ConfigError::MissingKey(key))
    }

    /// Stores `value` under `key` after checking it has the right shape.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a path key gets patterns or
    /// vice versa, and `ConfigError::InvalidGlobPattern` when a pattern does
    /// not compile.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) -> Result<(), ConfigError> {
        match (key, value) {
            (SettingKey::Root, SettingValue::Path(path)) => self.root = Some(path),
            (SettingKey::SourcePath, SettingValue::Path(path)) => self.source_path = Some(path),
            (SettingKey::DestinationPath, SettingValue::Path(path)) => {
                self.destination_path = Some(path)
            }
            (SettingKey::ExcludePattern, SettingValue::Patterns(patterns)) => {
                ExcludePatterns::compile(&patterns)?;
                self.exclude_pattern = Some(patterns);
            }
            (SettingKey::ExcludePattern, SettingValue::Path(_)) => {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "expected a list of glob patterns".to_string(),
                });
            }
            (key, SettingValue::Patterns(_)) => {
                return Err(ConfigError::InvalidValue {
                    key,
                    reason: "expected a single path".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn root(&self) -> Result<&Path, ConfigError> {
        self.root
            .as_deref()
            .ok_or(ConfigError::MissingKey(SettingKey::Root))
    }

    pub fn source_path(&self) -> Result<&Path, ConfigError> {
        self.source_path
            .as_deref()
            .ok_or(ConfigError::MissingKey(SettingKey::SourcePath))
    }

    pub fn destination_path(&self) -> Result<&Path, ConfigError> {
        self.destination_path
            .as_deref()
            .ok_or(ConfigError::MissingKey(SettingKey::DestinationPath))
    }

    pub fn exclude_patterns(&self) -> Result<&[String], ConfigError> {
        self.exclude_pattern
            .as_deref()
            .ok_or(ConfigError::MissingKey(SettingKey::ExcludePattern))
    }

    /// Compiles the configured exclude patterns.
    pub fn compiled_excludes(&self) -> Result<ExcludePatterns, ConfigError> {
        ExcludePatterns::compile(self.exclude_patterns()?)
    }
}

/// Handle on the settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Opens the store in `dir`, creating the directory and writing
    /// platform defaults if no settings file exists yet.
    pub fn open(dir: &Path) -> Result<Self, ConfigError> {
        Self::open_with_defaults(dir, Settings::platform_defaults)
    }

    /// Like [`SettingsStore::open`], with caller-supplied first-run values.
    pub fn open_with_defaults(
        dir: &Path,
        defaults: impl FnOnce() -> Settings,
    ) -> Result<Self, ConfigError> {
        ensure_dir(dir)?;
        let store = Self {
            path: dir.join(CONFIG_FILE),
        };
        if !store.path.exists() {
            debug!(path = %store.path.display(), "writing default settings");
            store.save(&defaults())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file has been removed and
    /// `ConfigError::Corrupt` if it is not a valid settings object.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(self.path.clone())
            } else {
                ConfigError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(settings).map_err(|e| ConfigError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Reads a single setting from disk.
    pub fn get(&self, key: SettingKey) -> Result<SettingValue, ConfigError> {
        self.load()?.get(key)
    }

    /// Updates a single setting and writes the file back.
    pub fn set(&self, key: SettingKey, value: SettingValue) -> Result<(), ConfigError> {
        let mut settings = self.load()?;
        settings.set(key, value)?;
        self.save(&settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixed_defaults() -> Settings {
        Settings {
            root: Some(PathBuf::from("/data")),
            source_path: Some(PathBuf::from("/data/Desktop")),
            destination_path: Some(PathBuf::from("/data/Documents")),
            exclude_pattern: Some(vec![".*".to_string(), "*.o".to_string()]),
        }
    }

    #[test]
    fn test_open_writes_defaults_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("app");

        let store = SettingsStore::open_with_defaults(&dir, fixed_defaults).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), fixed_defaults());

        store
            .set(SettingKey::Root, SettingValue::Path(PathBuf::from("/other")))
            .unwrap();

        // Reopening must not clobber the edited file.
        let reopened = SettingsStore::open_with_defaults(&dir, fixed_defaults).unwrap();
        assert_eq!(
            reopened.get(SettingKey::Root).unwrap(),
            SettingValue::Path(PathBuf::from("/other"))
        );
    }

    #[test]
    fn test_platform_defaults_are_complete() {
        let defaults = Settings::platform_defaults();
        for key in SettingKey::ALL {
            assert!(defaults.get(key).is_ok(), "missing default for {}", key);
        }
        assert_eq!(
            defaults.exclude_patterns().unwrap(),
            &[".*".to_string(), "*.o".to_string()]
        );
    }

    #[test]
    fn test_file_uses_pascal_case_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SettingsStore::open_with_defaults(temp_dir.path(), fixed_defaults).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"Root\""));
        assert!(raw.contains("\"SourcePath\""));
        assert!(raw.contains("\"DestinationPath\""));
        assert!(raw.contains("\"ExcludePattern\""));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SettingsStore::open_with_defaults(temp_dir.path(), fixed_defaults).unwrap();
        fs::remove_file(store.path()).unwrap();

        assert!(matches!(
            store.get(SettingKey::Root),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SettingsStore::open_with_defaults(temp_dir.path(), fixed_defaults).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Corrupt { .. })));
    }

    #[test]
    fn test_absent_key_is_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = SettingsStore::open_with_defaults(temp_dir.path(), fixed_defaults).unwrap();
        fs::write(store.path(), r#"{ "Root": "/data" }"#).unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.root().unwrap(), Path::new("/data"));
        assert!(matches!(
            settings.source_path(),
            Err(ConfigError::MissingKey(SettingKey::SourcePath))
        ));
        assert!(matches!(
            store.get(SettingKey::ExcludePattern),
            Err(ConfigError::MissingKey(SettingKey::ExcludePattern))
        ));
    }

    #[test]
    fn test_set_rejects_wrong_shape() {
        let mut settings = fixed_defaults();
        assert!(matches!(
            settings.set(SettingKey::Root, SettingValue::Patterns(vec![])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            settings.set(
                SettingKey::ExcludePattern,
                SettingValue::Path(PathBuf::from("/x"))
            ),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_set_rejects_bad_pattern() {
        let mut settings = fixed_defaults();
        let result = settings.set(
            SettingKey::ExcludePattern,
            SettingValue::Patterns(vec!["[oops".to_string()]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern { .. })));
        assert_eq!(settings, fixed_defaults());
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("Root".parse::<SettingKey>().unwrap(), SettingKey::Root);
        assert_eq!(
            "excludepattern".parse::<SettingKey>().unwrap(),
            SettingKey::ExcludePattern
        );
        assert!(matches!(
            "Nope".parse::<SettingKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }
}
