// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text descriptions of comparison findings.
//!
//! Test frameworks usually evaluate failure messages eagerly, even for
//! passing assertions; [`LazyMessage`] defers the formatting cost until the
//! message is actually rendered and memoizes the result. [`Formatter`]
//! produces the description texts themselves; coloring is left to the
//! calling test suite.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use treespec_diff::{FileDiff, DEFAULT_CONTEXT_LINES};

use crate::spec::FileTreeSpec;

/// Ruler width used when none is given
pub const DEFAULT_RULER_WIDTH: usize = 80;

/// A string built by a closure on first use, then memoized.
pub struct LazyMessage {
    thunk: Box<dyn Fn() -> String + Send + Sync>,
    rendered: OnceLock<String>,
}

impl LazyMessage {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            thunk: Box::new(thunk),
            rendered: OnceLock::new(),
        }
    }

    /// Render the message, building it on first call.
    pub fn get(&self) -> &str {
        self.rendered.get_or_init(|| (self.thunk)())
    }
}

impl fmt::Display for LazyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

impl fmt::Debug for LazyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rendered.get() {
            Some(rendered) => write!(f, "LazyMessage({:?})", rendered),
            None => f.write_str("LazyMessage(<deferred>)"),
        }
    }
}

/// Builds description texts for one spec's findings.
#[derive(Clone, Debug)]
pub struct Formatter {
    spec_folder: String,
}

impl Formatter {
    pub fn new(spec: &FileTreeSpec<'_>) -> Self {
        Self::for_folder(spec.spec_folder())
    }

    pub fn for_folder(spec_folder: &str) -> Self {
        Self {
            spec_folder: spec_folder.to_string(),
        }
    }

    /// Describe a golden file with no produced counterpart.
    pub fn describe_missing_file(&self, file_path: &Path) -> String {
        format!(
            "Missing file for {}:\n  * {}",
            self.spec_folder,
            file_path.display()
        )
    }

    /// Describe produced files that were not expected at all.
    pub fn describe_unexpected_files(&self, file_paths: &[PathBuf]) -> String {
        let mut description = vec![format!("Unexpected files for {}:", self.spec_folder)];
        description.extend(
            file_paths
                .iter()
                .map(|path| format!("  * {}", path.display())),
        );
        description.join("\n")
    }

    /// Describe a content mismatch with a framed unified diff.
    pub fn describe_file_diff(&self, diff: &FileDiff, max_width: usize) -> String {
        let mut description = vec![format!(
            "File comparison error `{}` for {}:",
            diff.relative().display(),
            self.spec_folder
        )];
        description.push(ruler("--- DIFF ", max_width));
        for line in diff.lines(DEFAULT_CONTEXT_LINES) {
            description.push(line.to_string());
        }
        description.push(ruler("--- END ", max_width));
        description.push(String::new());
        description.join("\n")
    }

    /// Describe a permission-bit mismatch (contents were equal).
    pub fn describe_permissions_diff(
        &self,
        diff: &FileDiff,
        expected_mode: u32,
        produced_mode: u32,
    ) -> String {
        format!(
            "Permission mismatch `{}` for {}:\n  * expected {:o}, produced {:o}",
            diff.relative().display(),
            self.spec_folder,
            expected_mode,
            produced_mode
        )
    }
}

fn ruler(prefix: &str, width: usize) -> String {
    let mut line = prefix.to_string();
    while line.len() < width {
        line.push('-');
    }
    line
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
