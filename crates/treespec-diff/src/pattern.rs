// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Path pattern matching for comparison rules.
//!
//! A [`Pattern`] is either a path-aware glob or a regular expression and is
//! matched against a file path relative to the tree being compared. Matching
//! is a pure string comparison; it never touches the filesystem, so rule
//! evaluation is deterministic regardless of directory iteration order.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Errors from compiling a pattern
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// A compiled rule pattern, matched against relative file paths.
///
/// Glob patterns use path-aware semantics: `*` never crosses a directory
/// separator, `**` recurses. Regex patterns are tested against the path's
/// string form.
#[derive(Clone, Debug)]
pub enum Pattern {
    Glob(glob::Pattern),
    Regex(regex::Regex),
}

impl Pattern {
    /// Compile a glob pattern (e.g. `*.log`, `build/**/*.o`).
    pub fn glob(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::Glob(glob::Pattern::new(pattern)?))
    }

    /// Compile a regular expression pattern.
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::Regex(regex::Regex::new(pattern)?))
    }

    /// Whether this pattern matches the given relative path.
    ///
    /// When `include_hidden` is true, glob wildcards also match dot-prefixed
    /// path segments; otherwise a leading dot must appear literally in the
    /// pattern.
    pub fn matches(&self, path: &Path, include_hidden: bool) -> bool {
        match self {
            Self::Glob(pattern) => {
                let options = glob::MatchOptions {
                    case_sensitive: true,
                    require_literal_separator: true,
                    require_literal_leading_dot: !include_hidden,
                };
                pattern.matches_path_with(path, options)
            }
            Self::Regex(regex) => regex.is_match(&path.to_string_lossy()),
        }
    }

    /// The source text this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Glob(pattern) => pattern.as_str(),
            Self::Regex(regex) => regex.as_str(),
        }
    }
}

// Rule tables key patterns by kind and source text so that re-registering a
// pattern overwrites its previous entry.
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Glob(a), Self::Glob(b)) => a.as_str() == b.as_str(),
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glob(pattern) => write!(f, "glob:{}", pattern.as_str()),
            Self::Regex(regex) => write!(f, "regex:{}", regex.as_str()),
        }
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
