// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Harness configuration types for TOML/JSON config files.
//!
//! A [`HarnessConfig`] describes everything a test suite needs to construct
//! the harness: where the spec fixtures live, the before/after/temp directory
//! names, hidden-file policy, ignore patterns, and the subject under test
//! with its environment, default arguments, and output redactions. The
//! configuration is an explicit value owned by the calling test suite; there
//! is no process-global shared state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treespec_diff::{Pattern, PatternError};

use crate::context::FileTreeSpecContext;
use crate::subject::Subject;

/// Default name of the directory holding initial fixture files
pub const DEFAULT_BEFORE_DIR: &str = "before";
/// Default name of the directory holding golden files
pub const DEFAULT_AFTER_DIR: &str = "after";
/// Default temp root for execution sandboxes
pub const DEFAULT_TEMP_DIR: &str = "tmp";
/// Default transcript file name written next to produced output
pub const DEFAULT_TRANSCRIPT: &str = "execution_output.txt";

/// Errors that can occur when loading or applying harness configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("Invalid redaction regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("Spec directory does not exist: {}", .0.display())]
    MissingSpecDir(PathBuf),

    #[error("Parent of temp root does not exist: {}", .0.display())]
    MissingTempRootParent(PathBuf),

    #[error("Temp root must be distinct from the spec directory: {}", .0.display())]
    TempRootIsSpecDir(PathBuf),

    #[error("Failed to create temp root {}: {source}", .path.display())]
    CreateTempRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),
}

fn default_before_dir() -> String {
    DEFAULT_BEFORE_DIR.to_string()
}

fn default_after_dir() -> String {
    DEFAULT_AFTER_DIR.to_string()
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMP_DIR)
}

fn default_true() -> bool {
    true
}

/// Top-level harness configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Name for logging/debugging
    #[serde(default)]
    pub name: String,

    /// Directory containing one subdirectory per spec
    pub spec_dir: PathBuf,

    /// Name of the before directory inside each spec (default: "before")
    #[serde(default = "default_before_dir")]
    pub before_dir: String,

    /// Name of the after directory inside each spec (default: "after")
    #[serde(default = "default_after_dir")]
    pub after_dir: String,

    /// Root under which execution sandboxes are created (default: "tmp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Whether hidden files take part in staging and comparison (default: true)
    #[serde(default = "default_true")]
    pub include_hidden_files: bool,

    /// Paths excluded from comparison and unexpected-file reporting
    #[serde(default)]
    pub ignore: Vec<PatternConfig>,

    /// The command under test
    #[serde(default)]
    pub subject: Option<SubjectConfig>,
}

/// Pattern specification for ignore rules
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternConfig {
    /// Path-aware glob (shell-style wildcards, `**` recurses)
    Glob { pattern: String },
    /// Regex tested against the relative path's string form
    Regex { pattern: String },
}

impl PatternConfig {
    /// Compile into a matcher
    pub fn compile(&self) -> Result<Pattern, PatternError> {
        match self {
            Self::Glob { pattern } => Pattern::glob(pattern),
            Self::Regex { pattern } => Pattern::regex(pattern),
        }
    }
}

/// Configuration of the command under test
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SubjectConfig {
    /// Display name used in transcripts in place of the executable path
    pub name: String,

    /// Executable invocation (defaults to the display name)
    #[serde(default)]
    pub executable: Option<String>,

    /// Environment variables set for every launch
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Arguments inserted between head and tail arguments on every launch
    #[serde(default)]
    pub default_args: Vec<String>,

    /// Output redactions, applied in order
    #[serde(default)]
    pub redactions: Vec<RedactionConfig>,

    /// Transcript file name (default: "execution_output.txt")
    #[serde(default)]
    pub transcript: Option<String>,
}

/// A single output redaction rule
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RedactionConfig {
    /// Replace every occurrence of a literal path with a placeholder
    /// (defaults to the path's basename)
    Path {
        path: String,
        #[serde(default)]
        placeholder: Option<String>,
    },
    /// Replace a path under any user's home directory with a placeholder
    /// (defaults to `$HOME/<path>`)
    UserPath {
        path: String,
        #[serde(default)]
        placeholder: Option<String>,
    },
    /// Replace every regex match with a literal string
    Pattern { pattern: String, replacement: String },
}

impl HarnessConfig {
    /// Load a harness config from a TOML or JSON file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: HarnessConfig = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config)
    }

    /// Build the spec context this config describes.
    pub fn context(&self) -> Result<FileTreeSpecContext, ConfigError> {
        let mut context = FileTreeSpecContext::new(&self.spec_dir)?;
        context.set_before_dir(&self.before_dir);
        context.set_after_dir(&self.after_dir);
        context.set_temp_root(&self.temp_dir)?;
        context.set_include_hidden_files(self.include_hidden_files);

        let patterns = self
            .ignore
            .iter()
            .map(PatternConfig::compile)
            .collect::<Result<Vec<_>, _>>()?;
        context.ignore(patterns);

        Ok(context)
    }

    /// Build the configured subject, if one is defined.
    pub fn subject(&self) -> Result<Option<Subject>, ConfigError> {
        let Some(ref config) = self.subject else {
            return Ok(None);
        };
        if config.name.is_empty() {
            return Err(ConfigError::Validation(
                "subject name must not be empty".to_string(),
            ));
        }

        let mut subject = Subject::new(&config.name);
        if let Some(ref executable) = config.executable {
            subject.set_executable(executable);
        }
        for (key, value) in &config.environment {
            subject.env(key, value);
        }
        subject.set_default_args(config.default_args.clone());
        for redaction in &config.redactions {
            match redaction {
                RedactionConfig::Path { path, placeholder } => {
                    subject.replace_path(path, placeholder.as_deref());
                }
                RedactionConfig::UserPath { path, placeholder } => {
                    subject.replace_user_path(path, placeholder.as_deref())?;
                }
                RedactionConfig::Pattern {
                    pattern,
                    replacement,
                } => {
                    subject.replace_pattern(regex::Regex::new(pattern)?, replacement);
                }
            }
        }
        if let Some(ref transcript) = config.transcript {
            subject.set_transcript_name(transcript);
        }
        Ok(Some(subject))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
