//! Exclude-pattern matching on bare filenames.
//!
//! Patterns use shell-glob semantics (`*`, `?`, `[...]`) and are matched
//! against the filename only, never the full path. Patterns are compiled once
//! per operation; a malformed pattern is rejected at compile time so that
//! matching itself can never fail.

use crate::config::ConfigError;
use glob::{MatchOptions, Pattern};

/// fnmatch-style options: case-sensitive, and `*` is allowed to match a
/// leading dot so that `*.o` also catches `.o`.
const FNMATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// An ordered set of compiled exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludePatterns {
    patterns: Vec<Pattern>,
}

impl ExcludePatterns {
    /// Compiles every pattern, preserving order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidGlobPattern` for the first pattern that
    /// does not parse (for example an unclosed `[`).
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                    pattern: pattern.to_string(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if `file_name` matches at least one pattern.
    ///
    /// Stops at the first matching pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(file_name, FNMATCH))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// One-shot form of [`ExcludePatterns::matches`] for callers holding raw
/// pattern strings.
///
/// # Errors
///
/// Returns `ConfigError::InvalidGlobPattern` if any pattern is malformed.
pub fn matches<S: AsRef<str>>(file_name: &str, patterns: &[S]) -> Result<bool, ConfigError> {
    Ok(ExcludePatterns::compile(patterns)?.matches(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(patterns: &[&str]) -> ExcludePatterns {
        ExcludePatterns::compile(patterns).expect("patterns should compile")
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let patterns = compiled(&[]);
        assert!(patterns.is_empty());
        assert!(!patterns.matches("anything"));
        assert!(!patterns.matches(".hidden"));
    }

    #[test]
    fn test_hidden_pattern() {
        let patterns = compiled(&[".*"]);
        assert!(patterns.matches(".hidden"));
        assert!(patterns.matches(".git"));
        assert!(!patterns.matches("visible.txt"));
    }

    #[test]
    fn test_star_matches_leading_dot() {
        let patterns = compiled(&["*.o"]);
        assert!(patterns.matches("main.o"));
        assert!(patterns.matches(".o"));
        assert!(!patterns.matches("main.obj"));
    }

    #[test]
    fn test_single_char_wildcard() {
        let patterns = compiled(&["file?.txt"]);
        assert!(patterns.matches("file1.txt"));
        assert!(!patterns.matches("file.txt"));
        assert!(!patterns.matches("file12.txt"));
    }

    #[test]
    fn test_character_class() {
        let patterns = compiled(&["[0-9]*.tmp"]);
        assert!(patterns.matches("1cache.tmp"));
        assert!(!patterns.matches("cache.tmp"));
    }

    #[test]
    fn test_case_sensitive() {
        let patterns = compiled(&["*.mp3"]);
        assert!(patterns.matches("song.mp3"));
        assert!(!patterns.matches("song.MP3"));
    }

    #[test]
    fn test_any_of_several_patterns() {
        let patterns = compiled(&[".*", "*.o", "Thumbs.db"]);
        assert_eq!(patterns.len(), 3);
        assert!(patterns.matches("Thumbs.db"));
        assert!(patterns.matches("lib.o"));
        assert!(!patterns.matches("lib.rs"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = ExcludePatterns::compile(&["[invalid"]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidGlobPattern { ref pattern, .. }) if pattern == "[invalid"
        ));
    }

    #[test]
    fn test_one_shot_matches() {
        assert!(matches("notes.o", &["*.o"]).unwrap());
        assert!(!matches("notes.txt", &["*.o"]).unwrap());
        assert!(matches("x", &["[x"]).is_err());
    }
}
