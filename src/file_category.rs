//! Extension-based file categories.
//!
//! A category is a named set of file extensions; its name doubles as the
//! subdirectory files of that kind are moved into. Categories are persisted
//! in `categories.json` beside the settings file.
//!
//! # Examples
//!
//! ```
//! use dirsweep::file_category::{CategoryMap, extension_of};
//!
//! let mut categories = CategoryMap::new();
//! categories.insert("MP3", [".mp3"]);
//! categories.insert("DOC", [".doc", ".docx"]);
//!
//! let index = categories.extension_index();
//! assert_eq!(index.category_for_file("notes.docx"), Some("DOC"));
//! assert_eq!(index.category_for_file("readme"), None);
//! assert_eq!(extension_of("archive.tar.gz"), Some(".gz"));
//! ```

use crate::config::{ConfigError, ensure_dir};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const CATEGORY_FILE: &str = "categories.json";

/// Errors raised by the category store.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("category file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("category file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("invalid category name '{0}': must be a single directory name")]
    InvalidCategoryName(String),

    #[error("invalid extension '{extension}' for category '{category}': expected a leading dot, e.g. .mp3")]
    InvalidExtension { category: String, extension: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the extension of `file_name`, including the dot.
///
/// Leading dots do not start an extension, so `.bashrc` has none, while
/// `archive.tar.gz` yields `.gz`.
pub fn extension_of(file_name: &str) -> Option<&str> {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    file_name[stem_start..]
        .rfind('.')
        .map(|dot| &file_name[stem_start + dot..])
}

/// Category name to extension set, iterated in ascending name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap {
    categories: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Categories written on first run.
    pub fn defaults() -> Self {
        let mut map = Self::new();
        map.insert("MP3", [".mp3"]);
        map.insert("DOC", [".doc", ".docx"]);
        map.insert("PDF", [".pdf"]);
        map
    }

    /// Inserts or replaces a category.
    pub fn insert<I, S>(&mut self, name: impl Into<String>, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .insert(name.into(), extensions.into_iter().map(Into::into).collect());
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.categories
            .iter()
            .map(|(name, extensions)| (name.as_str(), extensions))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Extensions claimed by more than one category, with every claimant in
    /// name order.
    pub fn overlaps(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, extensions) in self.iter() {
            for extension in extensions {
                owners.entry(extension.as_str()).or_default().push(name);
            }
        }
        owners.retain(|_, names| names.len() > 1);
        owners
    }

    /// Builds the extension lookup used while organizing.
    ///
    /// When an extension belongs to several categories the first category in
    /// name order keeps it.
    pub fn extension_index(&self) -> ExtensionIndex {
        for (extension, names) in self.overlaps() {
            warn!(
                extension,
                categories = ?names,
                chosen = names[0],
                "extension claimed by several categories"
            );
        }

        let mut by_extension = HashMap::new();
        for (name, extensions) in self.iter() {
            for extension in extensions {
                by_extension
                    .entry(extension.clone())
                    .or_insert_with(|| name.to_string());
            }
        }
        ExtensionIndex { by_extension }
    }

    fn validate(&self) -> Result<(), CategoryError> {
        for (name, extensions) in self.iter() {
            validate_category(name, extensions)?;
        }
        Ok(())
    }
}

fn validate_category<'a>(
    name: &str,
    extensions: impl IntoIterator<Item = &'a String>,
) -> Result<(), CategoryError> {
    let mut components = Path::new(name).components();
    let single_dir = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_dir || name.contains(['/', '\\']) {
        return Err(CategoryError::InvalidCategoryName(name.to_string()));
    }

    for extension in extensions {
        if !extension.starts_with('.') || extension.len() < 2 {
            return Err(CategoryError::InvalidExtension {
                category: name.to_string(),
                extension: extension.clone(),
            });
        }
    }
    Ok(())
}

/// Extension to category lookup built once per organize run.
#[derive(Debug, Clone, Default)]
pub struct ExtensionIndex {
    by_extension: HashMap<String, String>,
}

impl ExtensionIndex {
    /// Case-sensitive lookup of an extension such as `.mp3`.
    pub fn category_for(&self, extension: &str) -> Option<&str> {
        self.by_extension.get(extension).map(String::as_str)
    }

    pub fn category_for_file(&self, file_name: &str) -> Option<&str> {
        extension_of(file_name).and_then(|extension| self.category_for(extension))
    }
}

/// Handle on the persisted category file.
#[derive(Debug, Clone)]
pub struct CategoryStore {
    path: PathBuf,
}

impl CategoryStore {
    /// Opens the store in `dir`, writing the default categories if no file
    /// exists yet.
    pub fn open(dir: &Path) -> Result<Self, CategoryError> {
        ensure_dir(dir)?;
        let store = Self {
            path: dir.join(CATEGORY_FILE),
        };
        if !store.path.exists() {
            debug!(path = %store.path.display(), "writing default categories");
            store.save(&CategoryMap::defaults())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every category.
    pub fn get(&self) -> Result<CategoryMap, CategoryError> {
        let content = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CategoryError::NotFound(self.path.clone())
            } else {
                CategoryError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let map: CategoryMap =
            serde_json::from_str(&content).map_err(|e| CategoryError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        map.validate().map_err(|e| CategoryError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(map)
    }

    /// Adds a category, replacing any existing one with the same name.
    pub fn add(&self, name: &str, extensions: &[String]) -> Result<(), CategoryError> {
        validate_category(name, extensions)?;
        let mut map = self.get()?;
        map.insert(name, extensions.iter().cloned());
        self.save(&map)
    }

    /// Merges `extensions` into an existing category.
    pub fn update(&self, name: &str, extensions: &[String]) -> Result<(), CategoryError> {
        validate_category(name, extensions)?;
        let mut map = self.get()?;
        let existing = map
            .categories
            .get_mut(name)
            .ok_or_else(|| CategoryError::UnknownCategory(name.to_string()))?;
        existing.extend(extensions.iter().cloned());
        self.save(&map)
    }

    pub fn delete(&self, name: &str) -> Result<(), CategoryError> {
        let mut map = self.get()?;
        if map.categories.remove(name).is_none() {
            return Err(CategoryError::UnknownCategory(name.to_string()));
        }
        self.save(&map)
    }

    fn save(&self, map: &CategoryMap) -> Result<(), CategoryError> {
        let json = serde_json::to_string_pretty(map).map_err(|e| CategoryError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|source| CategoryError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
