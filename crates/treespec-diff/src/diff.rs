// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File comparison engine.
//!
//! A [`FileDiff`] pairs one expected (golden) file with the produced file at
//! the same relative path. Comparison runs at most once per instance and is
//! memoized; the unified-diff line sequence is derived on demand.
//!
//! When a preparator is attached, equality is decided on the *prepared*
//! values, never on the raw bytes. A preparator that returns
//! [`Prepared::Text`] switches the diff into string mode; returning
//! [`Prepared::File`] keeps byte-level file comparison (useful when the
//! preparation step rewrites a file on disk and hands back its path).

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use similar::{ChangeTag, TextDiff};

/// Default number of context lines around each diff hunk
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// A comparable representation of a file produced by a preparator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prepared {
    /// Compare the file at this path byte for byte.
    File(PathBuf),
    /// Compare this text content directly.
    Text(String),
}

/// Callback deriving a comparable representation from a file path.
pub type Preparator = Arc<dyn Fn(&Path) -> io::Result<Prepared> + Send + Sync>;

/// The memoized result of comparing one file pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOutcome {
    Equal,
    /// The golden file itself is absent. Checked first; the produced side is
    /// not inspected.
    MissingExpected,
    /// No file was produced at the expected relative path.
    MissingProduced,
    /// Contents match but POSIX permission bits differ.
    PermissionsDiffer {
        expected_mode: u32,
        produced_mode: u32,
    },
    ContentMismatch,
    /// A side could not be read or prepared.
    Unreadable(String),
}

/// Tag for one line of diff output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffTag {
    Added,
    Removed,
    Context,
}

/// One tagged line of unified diff output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: DiffTag,
    pub content: String,
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.tag {
            DiffTag::Added => '+',
            DiffTag::Removed => '-',
            DiffTag::Context => ' ',
        };
        write!(f, "{}{}", prefix, self.content)
    }
}

/// Comparison of one expected/produced file pair.
#[derive(Clone)]
pub struct FileDiff {
    expected: PathBuf,
    produced: PathBuf,
    relative: PathBuf,
    preparator: Option<Preparator>,
    prepared_expected: OnceLock<Result<Prepared, String>>,
    prepared_produced: OnceLock<Result<Prepared, String>>,
    outcome: OnceLock<DiffOutcome>,
}

impl fmt::Debug for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDiff")
            .field("expected", &self.expected)
            .field("produced", &self.produced)
            .field("relative", &self.relative)
            .field("has_preparator", &self.preparator.is_some())
            .field("outcome", &self.outcome.get())
            .finish()
    }
}

impl FileDiff {
    /// Create a diff for one file pair.
    ///
    /// `relative` is the path both files share under their respective trees;
    /// it only labels the diff and plays no part in comparison.
    pub fn new(
        expected: impl Into<PathBuf>,
        produced: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        preparator: Option<Preparator>,
    ) -> Self {
        Self {
            expected: expected.into(),
            produced: produced.into(),
            relative: relative.into(),
            preparator,
            prepared_expected: OnceLock::new(),
            prepared_produced: OnceLock::new(),
            outcome: OnceLock::new(),
        }
    }

    pub fn expected(&self) -> &Path {
        &self.expected
    }

    pub fn produced(&self) -> &Path {
        &self.produced
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Whether raw files on disk are being compared (as opposed to prepared
    /// string content).
    pub fn is_file_comparison(&self) -> bool {
        match self.preparator {
            None => true,
            Some(_) => matches!(
                (self.prepared_expected(), self.prepared_produced()),
                (Ok(Prepared::File(_)), Ok(Prepared::File(_)))
            ),
        }
    }

    /// The comparison result, computed on first access and reused afterwards.
    pub fn outcome(&self) -> &DiffOutcome {
        self.outcome.get_or_init(|| self.compute_outcome())
    }

    /// Whether the produced file equals the expected one, judged on the
    /// prepared representations when a preparator is present.
    pub fn is_equal(&self) -> bool {
        matches!(self.outcome(), DiffOutcome::Equal)
    }

    /// Tagged unified-diff lines over the prepared representations.
    ///
    /// Read-only; safe to call repeatedly.
    pub fn lines(&self, context: usize) -> Vec<DiffLine> {
        let old = self.side_text(Side::Expected);
        let new = self.side_text(Side::Produced);
        let diff = TextDiff::from_lines(old.as_str(), new.as_str());
        let mut lines = Vec::new();
        for group in diff.grouped_ops(context) {
            for op in &group {
                for change in diff.iter_changes(op) {
                    let tag = match change.tag() {
                        ChangeTag::Insert => DiffTag::Added,
                        ChangeTag::Delete => DiffTag::Removed,
                        ChangeTag::Equal => DiffTag::Context,
                    };
                    let content = change
                        .value()
                        .trim_end_matches('\n')
                        .trim_end_matches('\r')
                        .to_string();
                    lines.push(DiffLine { tag, content });
                }
            }
        }
        lines
    }

    fn prepared_expected(&self) -> &Result<Prepared, String> {
        self.prepared(&self.expected, &self.prepared_expected)
    }

    fn prepared_produced(&self) -> &Result<Prepared, String> {
        self.prepared(&self.produced, &self.prepared_produced)
    }

    fn prepared<'a>(
        &self,
        path: &Path,
        cell: &'a OnceLock<Result<Prepared, String>>,
    ) -> &'a Result<Prepared, String> {
        cell.get_or_init(|| match &self.preparator {
            Some(preparator) => preparator(path).map_err(|e| e.to_string()),
            None => Ok(Prepared::File(path.to_path_buf())),
        })
    }

    fn compute_outcome(&self) -> DiffOutcome {
        if !self.expected.exists() {
            return DiffOutcome::MissingExpected;
        }
        if !self.produced.exists() {
            return DiffOutcome::MissingProduced;
        }

        let expected = match self.prepared_expected() {
            Ok(prepared) => prepared.clone(),
            Err(e) => return DiffOutcome::Unreadable(e.clone()),
        };
        let produced = match self.prepared_produced() {
            Ok(prepared) => prepared.clone(),
            Err(e) => return DiffOutcome::Unreadable(e.clone()),
        };

        match (&expected, &produced) {
            (Prepared::File(a), Prepared::File(b)) => self.compare_files(a, b),
            (Prepared::Text(a), Prepared::Text(b)) => {
                if a == b {
                    DiffOutcome::Equal
                } else {
                    DiffOutcome::ContentMismatch
                }
            }
            // Mixed preparator output; fall back to textual comparison.
            _ => {
                let a = text_of(&expected);
                let b = text_of(&produced);
                if a == b {
                    DiffOutcome::Equal
                } else {
                    DiffOutcome::ContentMismatch
                }
            }
        }
    }

    fn compare_files(&self, expected: &Path, produced: &Path) -> DiffOutcome {
        let expected_bytes = match fs::read(expected) {
            Ok(bytes) => bytes,
            Err(e) => return DiffOutcome::Unreadable(format!("{}: {}", expected.display(), e)),
        };
        let produced_bytes = match fs::read(produced) {
            Ok(bytes) => bytes,
            Err(e) => return DiffOutcome::Unreadable(format!("{}: {}", produced.display(), e)),
        };
        if expected_bytes != produced_bytes {
            return DiffOutcome::ContentMismatch;
        }
        if let (Some(expected_mode), Some(produced_mode)) =
            (mode_bits(expected), mode_bits(produced))
        {
            if expected_mode != produced_mode {
                return DiffOutcome::PermissionsDiffer {
                    expected_mode,
                    produced_mode,
                };
            }
        }
        DiffOutcome::Equal
    }

    fn side_text(&self, side: Side) -> String {
        let prepared = match side {
            Side::Expected => self.prepared_expected(),
            Side::Produced => self.prepared_produced(),
        };
        match prepared {
            Ok(Prepared::Text(text)) => text.clone(),
            Ok(Prepared::File(path)) => read_lossy(path),
            Err(_) => String::new(),
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Expected,
    Produced,
}

fn text_of(prepared: &Prepared) -> String {
    match prepared {
        Prepared::Text(text) => text.clone(),
        Prepared::File(path) => read_lossy(path),
    }
}

fn read_lossy(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(unix)]
fn mode_bits(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .ok()
        .map(|meta| meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn mode_bits(_path: &Path) -> Option<u32> {
    None
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
