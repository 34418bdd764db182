// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! File-tree snapshot testing harness for command-line executables.
//!
//! treespec verifies the behavior of CLI programs by staging a `before`
//! file-tree snapshot into a disposable sandbox, running the program under
//! test inside it, and comparing the resulting tree (and captured output)
//! against a golden `after` snapshot. Noisy files can be transformed,
//! preprocessed into a comparable form, or ignored entirely via pattern
//! rules.
//!
//! The crate exposes comparison *data* (per-file diffs, missing files,
//! unexpected files) through callbacks and report values; turning those into
//! test assertions is left to the calling test suite.
//!
//! ```no_run
//! use treespec::{CliSpecRunner, FileTreeSpecContext, Pattern, Subject};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut context = FileTreeSpecContext::new("tests/integration")?;
//! context.ignore([Pattern::glob("*.lock")?]);
//!
//! let mut subject = Subject::new("CoffeeMaker");
//! subject.set_executable("target/debug/coffeemaker");
//!
//! let runner = CliSpecRunner::new(context, subject);
//! let report = runner.cli_spec("brew_no_milk", &["--no-milk"])?;
//! assert!(report.is_success(), "{}", report.describe());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod report;
pub mod runner;
pub mod spec;
pub mod subject;

pub use config::{ConfigError, HarnessConfig, PatternConfig, RedactionConfig, SubjectConfig};
pub use context::{FileTreeSpecContext, TransformFn};
pub use report::{Formatter, LazyMessage};
pub use runner::{CliSpecReport, CliSpecRunner, FileCheck, FileSpecReport};
pub use spec::{FileTreeSpec, MutationError, SpecError};
pub use subject::{Execution, Subject, SubjectError};

/// Re-exported comparison primitives from the treespec-diff crate.
pub use treespec_diff::{
    DiffLine, DiffOutcome, DiffTag, FileDiff, Pattern, PatternError, Preparator, Prepared,
    DEFAULT_CONTEXT_LINES,
};
