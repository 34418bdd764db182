// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test-suite facing runner.
//!
//! [`CliSpecRunner`] bundles a context and a subject and runs whole spec
//! cases, collecting every finding into report values instead of asserting
//! anything itself. The calling test suite injects the runner and turns
//! reports into assertions with whatever framework it uses.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use treespec_diff::{DiffOutcome, FileDiff};

use crate::config::{ConfigError, HarnessConfig};
use crate::context::FileTreeSpecContext;
use crate::report::{Formatter, LazyMessage, DEFAULT_RULER_WIDTH};
use crate::spec::{FileTreeSpec, MutationError, SpecError};
use crate::subject::{Execution, Subject};

/// The comparison result for one expected file.
#[derive(Debug)]
pub struct FileCheck {
    diff: FileDiff,
    message: LazyMessage,
}

impl FileCheck {
    pub fn relative(&self) -> &Path {
        self.diff.relative()
    }

    pub fn outcome(&self) -> &DiffOutcome {
        self.diff.outcome()
    }

    pub fn is_equal(&self) -> bool {
        self.diff.is_equal()
    }

    pub fn diff(&self) -> &FileDiff {
        &self.diff
    }

    /// Failure description; empty for passing checks. Formatting is deferred
    /// until first use.
    pub fn message(&self) -> &str {
        self.message.get()
    }
}

/// Every finding from one spec run.
#[derive(Debug)]
pub struct FileSpecReport {
    spec_folder: String,
    checks: Vec<FileCheck>,
    unexpected: Vec<PathBuf>,
}

impl FileSpecReport {
    pub fn spec_folder(&self) -> &str {
        &self.spec_folder
    }

    /// One entry per non-ignored golden file, in enumeration order.
    pub fn checks(&self) -> &[FileCheck] {
        &self.checks
    }

    /// The checks that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &FileCheck> {
        self.checks.iter().filter(|check| !check.is_equal())
    }

    /// Produced files with no golden counterpart, sorted.
    pub fn unexpected_files(&self) -> &[PathBuf] {
        &self.unexpected
    }

    pub fn is_success(&self) -> bool {
        self.unexpected.is_empty() && self.checks.iter().all(FileCheck::is_equal)
    }

    /// All failure descriptions joined into one message.
    pub fn describe(&self) -> String {
        let mut sections: Vec<String> = self
            .failures()
            .map(|check| check.message().to_string())
            .collect();
        if !self.unexpected.is_empty() {
            let formatter = Formatter::for_folder(&self.spec_folder);
            sections.push(formatter.describe_unexpected_files(&self.unexpected));
        }
        sections.join("\n")
    }
}

/// A [`FileSpecReport`] plus the subject execution that produced it.
#[derive(Debug)]
pub struct CliSpecReport {
    execution: Execution,
    files: FileSpecReport,
}

impl CliSpecReport {
    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    pub fn files(&self) -> &FileSpecReport {
        &self.files
    }

    pub fn is_success(&self) -> bool {
        self.execution.success() && self.files.is_success()
    }

    pub fn describe(&self) -> String {
        let mut sections = Vec::new();
        if !self.execution.success() {
            sections.push(format!(
                "Subject failed (exit code {:?}):\n{}",
                self.execution.code(),
                self.execution.output()
            ));
        }
        let files = self.files.describe();
        if !files.is_empty() {
            sections.push(files);
        }
        sections.join("\n")
    }
}

/// Runs spec cases against a configured subject.
#[derive(Debug)]
pub struct CliSpecRunner {
    context: FileTreeSpecContext,
    subject: Subject,
}

impl CliSpecRunner {
    pub fn new(context: FileTreeSpecContext, subject: Subject) -> Self {
        Self { context, subject }
    }

    /// Build a runner from a loaded config. The config must define a subject.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, ConfigError> {
        let context = config.context()?;
        let subject = config.subject()?.ok_or_else(|| {
            ConfigError::Validation("config defines no subject".to_string())
        })?;
        Ok(Self::new(context, subject))
    }

    /// Build a runner from a TOML or JSON config file.
    pub fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_config(&HarnessConfig::load(path)?)
    }

    pub fn context(&self) -> &FileTreeSpecContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut FileTreeSpecContext {
        &mut self.context
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn subject_mut(&mut self) -> &mut Subject {
        &mut self.subject
    }

    /// Run one spec with a caller-supplied mutation and collect every
    /// finding.
    pub fn file_spec<F>(&self, spec_folder: &str, mutation: F) -> Result<FileSpecReport, SpecError>
    where
        F: FnOnce(&FileTreeSpec<'_>) -> Result<(), MutationError>,
    {
        let spec = self.context.spec(spec_folder);
        spec.run(mutation)?;
        self.collect(&spec)
    }

    /// Like [`file_spec`](Self::file_spec), with the sandbox seeded from
    /// `base`'s after-tree.
    pub fn file_spec_based_on<F>(
        &self,
        spec_folder: &str,
        base: &str,
        mutation: F,
    ) -> Result<FileSpecReport, SpecError>
    where
        F: FnOnce(&FileTreeSpec<'_>) -> Result<(), MutationError>,
    {
        let spec = self.context.spec_based_on(spec_folder, base);
        spec.run(mutation)?;
        self.collect(&spec)
    }

    /// Run one spec whose mutation launches the subject with the given
    /// arguments inside the sandbox.
    pub fn cli_spec(&self, spec_folder: &str, args: &[&str]) -> Result<CliSpecReport, SpecError> {
        let spec = self.context.spec(spec_folder);
        let execution = spec.run(|spec| {
            self.subject
                .launch(&spec.temp_path(), args, &[])
                .map_err(Into::into)
        })?;
        let files = self.collect(&spec)?;
        Ok(CliSpecReport { execution, files })
    }

    fn collect(&self, spec: &FileTreeSpec<'_>) -> Result<FileSpecReport, SpecError> {
        let formatter = Arc::new(spec.formatter());
        let mut checks = Vec::new();
        spec.compare(|diff| checks.push(file_check(&formatter, diff)))?;

        let mut unexpected = Vec::new();
        spec.check_unexpected_files(|files| unexpected = files.to_vec())?;

        Ok(FileSpecReport {
            spec_folder: spec.spec_folder().to_string(),
            checks,
            unexpected,
        })
    }
}

fn file_check(formatter: &Arc<Formatter>, diff: &FileDiff) -> FileCheck {
    let formatter = Arc::clone(formatter);
    let message_diff = diff.clone();
    let message = LazyMessage::new(move || match message_diff.outcome() {
        DiffOutcome::Equal => String::new(),
        DiffOutcome::MissingProduced => formatter.describe_missing_file(message_diff.expected()),
        DiffOutcome::PermissionsDiffer {
            expected_mode,
            produced_mode,
        } => formatter.describe_permissions_diff(&message_diff, *expected_mode, *produced_mode),
        _ => formatter.describe_file_diff(&message_diff, DEFAULT_RULER_WIDTH),
    });
    FileCheck {
        diff: diff.clone(),
        message,
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
