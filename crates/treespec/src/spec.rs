// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One test case: stage, execute, compare.
//!
//! A [`FileTreeSpec`] stages its fixture's before-tree into a disposable
//! sandbox under the context's temp root, hands the sandbox to a
//! caller-supplied mutation closure (which typically launches the subject),
//! and afterwards compares the produced tree against the golden after-tree.
//! The sandbox survives until the next `run` so failures can be inspected.
//!
//! Specs never change the process working directory; the sandbox path is
//! passed explicitly, so specs with disjoint sandboxes are safe to run from
//! concurrent test threads.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use treespec_diff::FileDiff;

use crate::config::ConfigError;
use crate::context::FileTreeSpecContext;
use crate::report::Formatter;

/// Error type accepted from mutation closures.
pub type MutationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a single spec
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Missing before directory for spec '{spec}': {}", .path.display())]
    MissingFixture { spec: String, path: PathBuf },

    #[error("Missing after directory for base spec '{spec}': {}", .path.display())]
    MissingBaseFixture { spec: String, path: PathBuf },

    #[error("Spec '{0}' must be run before comparing")]
    NotExecuted(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Execution failed for spec '{spec}': {source}")]
    Execution {
        spec: String,
        #[source]
        source: MutationError,
    },

    #[error("Transform failed for {}: {source}", .path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(action: &'static str, path: &Path, source: io::Error) -> SpecError {
    SpecError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpecState {
    Unstaged,
    Staged,
    Executed,
    Compared,
}

/// A single file-tree test case bound to a [`FileTreeSpecContext`].
#[derive(Debug)]
pub struct FileTreeSpec<'ctx> {
    context: &'ctx FileTreeSpecContext,
    spec_folder: String,
    base_spec: Option<String>,
    state: Cell<SpecState>,
}

impl<'ctx> FileTreeSpec<'ctx> {
    pub(crate) fn new(
        context: &'ctx FileTreeSpecContext,
        spec_folder: &str,
        base_spec: Option<String>,
    ) -> Self {
        Self {
            context,
            spec_folder: spec_folder.to_string(),
            base_spec,
            state: Cell::new(SpecState::Unstaged),
        }
    }

    pub fn context(&self) -> &FileTreeSpecContext {
        self.context
    }

    pub fn spec_folder(&self) -> &str {
        &self.spec_folder
    }

    /// The fixture directory of this spec
    pub fn spec_path(&self) -> PathBuf {
        self.context.spec_dir().join(&self.spec_folder)
    }

    /// The fixture's initial files
    pub fn before_path(&self) -> PathBuf {
        self.spec_path().join(self.context.before_dir())
    }

    /// The fixture's golden files
    pub fn after_path(&self) -> PathBuf {
        self.spec_path().join(self.context.after_dir())
    }

    /// The execution sandbox for this spec
    pub fn temp_path(&self) -> PathBuf {
        self.context.temp_root().join(&self.spec_folder)
    }

    /// A plain-text formatter for this spec's findings
    pub fn formatter(&self) -> Formatter {
        Formatter::new(self)
    }

    /// Stage the sandbox and execute the mutation closure inside it.
    ///
    /// The sandbox is destroyed and recreated first: the before-tree is
    /// copied in, preceded by the base spec's after-tree when this spec is
    /// layered (local files win on conflict). The mutation receives the spec
    /// and should address the sandbox via [`temp_path`](Self::temp_path);
    /// whatever it returns is passed through.
    pub fn run<T, F>(&self, mutation: F) -> Result<T, SpecError>
    where
        F: FnOnce(&Self) -> Result<T, MutationError>,
    {
        self.context.prepare()?;
        self.stage()?;
        tracing::debug!(
            spec = %self.spec_folder,
            sandbox = %self.temp_path().display(),
            "executing spec mutation"
        );
        let value = mutation(self).map_err(|source| SpecError::Execution {
            spec: self.spec_folder.clone(),
            source,
        })?;
        self.state.set(SpecState::Executed);
        Ok(value)
    }

    /// Compare the produced tree against the golden after-tree.
    ///
    /// Registered transforms run first, against every file reachable in the
    /// sandbox. Golden files are then enumerated recursively in sorted order
    /// (hidden files per the context's policy); each non-ignored file yields
    /// exactly one [`FileDiff`], including files with no produced
    /// counterpart, which surface as missing rather than being skipped. The
    /// enumeration never stops early; a single pass reports every finding.
    pub fn compare<F>(&self, mut on_diff: F) -> Result<(), SpecError>
    where
        F: FnMut(&FileDiff),
    {
        self.ensure_executed()?;
        self.apply_transforms()?;

        let after = self.after_path();
        let temp = self.temp_path();
        let include_hidden = self.context.include_hidden_files();
        let expected = collect_files(&after, include_hidden)
            .map_err(|source| io_error("enumerate", &after, source))?;
        tracing::debug!(spec = %self.spec_folder, files = expected.len(), "comparing against golden tree");

        for relative in expected {
            if self.context.is_ignored(&relative) {
                continue;
            }
            let preparator = self
                .context
                .preprocessors_for(&relative)
                .into_iter()
                .next();
            let diff = FileDiff::new(
                after.join(&relative),
                temp.join(&relative),
                relative,
                preparator,
            );
            on_diff(&diff);
        }
        self.state.set(SpecState::Compared);
        Ok(())
    }

    /// Report produced files that have no counterpart in the after-tree.
    ///
    /// The callback is invoked exactly once with the sorted list of relative
    /// paths (possibly empty). Ignored paths are excluded.
    pub fn check_unexpected_files<F>(&self, on_files: F) -> Result<(), SpecError>
    where
        F: FnOnce(&[PathBuf]),
    {
        self.ensure_executed()?;
        let after = self.after_path();
        let temp = self.temp_path();
        let include_hidden = self.context.include_hidden_files();

        let expected: BTreeSet<PathBuf> = collect_files(&after, include_hidden)
            .map_err(|source| io_error("enumerate", &after, source))?
            .into_iter()
            .collect();
        let produced = collect_files(&temp, include_hidden)
            .map_err(|source| io_error("enumerate", &temp, source))?;

        let unexpected: Vec<PathBuf> = produced
            .into_iter()
            .filter(|path| !expected.contains(path))
            .filter(|path| !self.context.is_ignored(path))
            .collect();
        on_files(&unexpected);
        Ok(())
    }

    fn ensure_executed(&self) -> Result<(), SpecError> {
        match self.state.get() {
            SpecState::Executed | SpecState::Compared => Ok(()),
            SpecState::Unstaged | SpecState::Staged => {
                Err(SpecError::NotExecuted(self.spec_folder.clone()))
            }
        }
    }

    fn stage(&self) -> Result<(), SpecError> {
        let temp = self.temp_path();
        if temp.exists() {
            fs::remove_dir_all(&temp).map_err(|source| io_error("remove", &temp, source))?;
        }
        fs::create_dir_all(&temp).map_err(|source| io_error("create", &temp, source))?;

        let include_hidden = self.context.include_hidden_files();
        let before = self.before_path();

        if let Some(ref base) = self.base_spec {
            let base_after = self
                .context
                .spec_dir()
                .join(base)
                .join(self.context.after_dir());
            if !base_after.is_dir() {
                return Err(SpecError::MissingBaseFixture {
                    spec: base.clone(),
                    path: base_after,
                });
            }
            copy_tree(&base_after, &temp, include_hidden)
                .map_err(|source| io_error("copy", &base_after, source))?;
            // A layered spec may rely on the base alone.
            if before.is_dir() {
                copy_tree(&before, &temp, include_hidden)
                    .map_err(|source| io_error("copy", &before, source))?;
            }
        } else {
            if !before.is_dir() {
                return Err(SpecError::MissingFixture {
                    spec: self.spec_folder.clone(),
                    path: before,
                });
            }
            copy_tree(&before, &temp, include_hidden)
                .map_err(|source| io_error("copy", &before, source))?;
        }

        tracing::debug!(spec = %self.spec_folder, sandbox = %temp.display(), "staged sandbox");
        self.state.set(SpecState::Staged);
        Ok(())
    }

    fn apply_transforms(&self) -> Result<(), SpecError> {
        let temp = self.temp_path();
        let include_hidden = self.context.include_hidden_files();
        // Snapshot the walk first; transforms may add or remove files.
        let produced = collect_files(&temp, include_hidden)
            .map_err(|source| io_error("enumerate", &temp, source))?;
        for relative in produced {
            for transform in self.context.transformers_for(&relative) {
                let absolute = temp.join(&relative);
                tracing::trace!(path = %relative.display(), "applying transform");
                transform(&absolute).map_err(|source| SpecError::Transform {
                    path: relative.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// Recursively list regular files under `base` as sorted relative paths.
///
/// A missing `base` yields an empty list. Entries are sorted per directory,
/// so the overall order is a deterministic depth-first traversal.
fn collect_files(base: &Path, include_hidden: bool) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if base.is_dir() {
        collect_into(base, Path::new(""), include_hidden, &mut files)?;
    }
    Ok(files)
}

fn collect_into(
    dir: &Path,
    prefix: &Path,
    include_hidden: bool,
    out: &mut Vec<PathBuf>,
) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let name = entry.file_name();
        if !include_hidden && name.to_string_lossy().starts_with('.') {
            continue;
        }
        let relative = prefix.join(&name);
        let path = entry.path();
        if path.is_dir() {
            collect_into(&path, &relative, include_hidden, out)?;
        } else if path.is_file() {
            out.push(relative);
        }
    }
    Ok(())
}

/// Merge-copy `src` into `dst`, creating directories as needed. Existing
/// files are overwritten, which is what lets a local before-tree win over a
/// layered base.
fn copy_tree(src: &Path, dst: &Path, include_hidden: bool) -> io::Result<()> {
    let mut entries = fs::read_dir(src)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let name = entry.file_name();
        if !include_hidden && name.to_string_lossy().starts_with('.') {
            continue;
        }
        let source = entry.path();
        let target = dst.join(&name);
        if source.is_dir() {
            fs::create_dir_all(&target)?;
            copy_tree(&source, &target, include_hidden)?;
        } else if source.is_file() {
            fs::copy(&source, &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
