// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared configuration for file-tree specs.
//!
//! A [`FileTreeSpecContext`] owns the fixture layout (spec root, before/after
//! directory names, temp root), the hidden-file policy, and the three pattern
//! rule tables: transforms (side-effecting, *all* matches apply),
//! preprocessors (*first* match applies), and ignores (set union). Specs are
//! created from a context and borrow it; once configured, a context is only
//! read, so specs with disjoint sandboxes may run from concurrent tests.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use treespec_diff::{Pattern, Preparator};

use crate::config::ConfigError;
use crate::spec::FileTreeSpec;

/// Side-effecting callback applied to produced files before comparison.
///
/// Receives the absolute path of a matched file inside the sandbox and may
/// rewrite it in place (e.g. normalize a binary artifact).
pub type TransformFn = Arc<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// Global configuration shared by every [`FileTreeSpec`] it creates.
pub struct FileTreeSpecContext {
    spec_dir: PathBuf,
    before_dir: PathBuf,
    after_dir: PathBuf,
    temp_root: PathBuf,
    include_hidden_files: bool,
    transforms: Vec<(Pattern, TransformFn)>,
    preprocessors: Vec<(Pattern, Preparator)>,
    ignores: Vec<Pattern>,
    canonical_temp: OnceLock<PathBuf>,
}

impl std::fmt::Debug for FileTreeSpecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTreeSpecContext")
            .field("spec_dir", &self.spec_dir)
            .field("before_dir", &self.before_dir)
            .field("after_dir", &self.after_dir)
            .field("temp_root", &self.temp_root)
            .field("include_hidden_files", &self.include_hidden_files)
            .field("transforms", &self.transforms.len())
            .field("preprocessors", &self.preprocessors.len())
            .field("ignores", &self.ignores.len())
            .finish_non_exhaustive()
    }
}

impl FileTreeSpecContext {
    /// Create a context rooted at an existing spec directory.
    ///
    /// The directory is canonicalized immediately so later working-directory
    /// changes cannot shift relative paths.
    pub fn new(spec_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let requested = spec_dir.as_ref();
        let spec_dir = requested
            .canonicalize()
            .map_err(|_| ConfigError::MissingSpecDir(requested.to_path_buf()))?;
        Ok(Self {
            spec_dir,
            before_dir: PathBuf::from(crate::config::DEFAULT_BEFORE_DIR),
            after_dir: PathBuf::from(crate::config::DEFAULT_AFTER_DIR),
            temp_root: PathBuf::from(crate::config::DEFAULT_TEMP_DIR),
            include_hidden_files: true,
            transforms: Vec::new(),
            preprocessors: Vec::new(),
            ignores: Vec::new(),
            canonical_temp: OnceLock::new(),
        })
    }

    pub fn spec_dir(&self) -> &Path {
        &self.spec_dir
    }

    pub fn before_dir(&self) -> &Path {
        &self.before_dir
    }

    pub fn after_dir(&self) -> &Path {
        &self.after_dir
    }

    pub fn include_hidden_files(&self) -> bool {
        self.include_hidden_files
    }

    pub fn set_before_dir(&mut self, name: impl Into<PathBuf>) {
        self.before_dir = name.into();
    }

    pub fn set_after_dir(&mut self, name: impl Into<PathBuf>) {
        self.after_dir = name.into();
    }

    pub fn set_include_hidden_files(&mut self, include: bool) {
        self.include_hidden_files = include;
    }

    /// Point the context at a different temp root.
    ///
    /// The parent of the temp root must already exist; the root itself is
    /// created by [`prepare`](Self::prepare). Resetting the temp root
    /// discards any previously prepared location.
    pub fn set_temp_root(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let path = path.into();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(ConfigError::MissingTempRootParent(path));
        }
        self.temp_root = path;
        self.canonical_temp = OnceLock::new();
        Ok(())
    }

    /// The temp root, canonicalized if [`prepare`](Self::prepare) has run.
    pub fn temp_root(&self) -> PathBuf {
        self.canonical_temp
            .get()
            .cloned()
            .unwrap_or_else(|| self.temp_root.clone())
    }

    /// Idempotently create the temp root and pin it to a canonical absolute
    /// path. Must run before any spec staging.
    pub fn prepare(&self) -> Result<&Path, ConfigError> {
        if let Some(prepared) = self.canonical_temp.get() {
            return Ok(prepared);
        }
        std::fs::create_dir_all(&self.temp_root).map_err(|source| ConfigError::CreateTempRoot {
            path: self.temp_root.clone(),
            source,
        })?;
        let canonical =
            self.temp_root
                .canonicalize()
                .map_err(|source| ConfigError::CreateTempRoot {
                    path: self.temp_root.clone(),
                    source,
                })?;
        if canonical == self.spec_dir {
            return Err(ConfigError::TempRootIsSpecDir(canonical));
        }
        tracing::debug!(temp_root = %canonical.display(), "prepared temp root");
        Ok(self.canonical_temp.get_or_init(|| canonical))
    }

    /// Register a side-effecting transform for every path matching one of
    /// `patterns`. Re-registering a pattern replaces its callback in place.
    pub fn register_transform(
        &mut self,
        patterns: impl IntoIterator<Item = Pattern>,
        callback: TransformFn,
    ) {
        for pattern in patterns {
            if let Some(entry) = self.transforms.iter_mut().find(|(p, _)| *p == pattern) {
                entry.1 = Arc::clone(&callback);
            } else {
                self.transforms.push((pattern, Arc::clone(&callback)));
            }
        }
    }

    /// Register a preprocessor deriving a comparable representation for every
    /// path matching one of `patterns`. Re-registering a pattern replaces its
    /// callback in place.
    pub fn register_preprocess(
        &mut self,
        patterns: impl IntoIterator<Item = Pattern>,
        callback: Preparator,
    ) {
        for pattern in patterns {
            if let Some(entry) = self.preprocessors.iter_mut().find(|(p, _)| *p == pattern) {
                entry.1 = Arc::clone(&callback);
            } else {
                self.preprocessors.push((pattern, Arc::clone(&callback)));
            }
        }
    }

    /// Exclude matching paths from comparison and unexpected-file reporting.
    /// Duplicate patterns are kept once.
    pub fn ignore(&mut self, patterns: impl IntoIterator<Item = Pattern>) {
        for pattern in patterns {
            if !self.ignores.contains(&pattern) {
                self.ignores.push(pattern);
            }
        }
    }

    /// All transform callbacks whose pattern matches `relative_path`, in
    /// registration order.
    pub fn transformers_for(&self, relative_path: &Path) -> Vec<TransformFn> {
        self.transforms
            .iter()
            .filter(|(pattern, _)| pattern.matches(relative_path, self.include_hidden_files))
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    /// All preprocessor callbacks whose pattern matches `relative_path`, in
    /// registration order. Consumers apply only the first.
    pub fn preprocessors_for(&self, relative_path: &Path) -> Vec<Preparator> {
        self.preprocessors
            .iter()
            .filter(|(pattern, _)| pattern.matches(relative_path, self.include_hidden_files))
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    /// Whether `relative_path` is excluded by an ignore rule.
    pub fn is_ignored(&self, relative_path: &Path) -> bool {
        self.ignores
            .iter()
            .any(|pattern| pattern.matches(relative_path, self.include_hidden_files))
    }

    /// Create a spec for the given fixture folder.
    pub fn spec(&self, spec_folder: &str) -> FileTreeSpec<'_> {
        FileTreeSpec::new(self, spec_folder, None)
    }

    /// Create a spec whose sandbox is seeded from `base`'s after-tree before
    /// the spec's own before-tree is overlaid.
    pub fn spec_based_on(&self, spec_folder: &str, base: &str) -> FileTreeSpec<'_> {
        FileTreeSpec::new(self, spec_folder, Some(base.to_string()))
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
