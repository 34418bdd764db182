// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The command under test.
//!
//! A [`Subject`] holds one launch configuration: executable invocation,
//! environment, default arguments, output redactions, and the transcript file
//! name. [`Subject::launch`] runs the executable inside an explicit working
//! directory, captures stdout and stderr merged into one stream, redacts the
//! result, and persists a transcript suitable for golden-file comparison.
//!
//! A non-zero exit status is not an error; it is returned in [`Execution`]
//! for the caller's assertion policy. Only a failure to spawn is an error.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use regex::Regex;
use thiserror::Error;

use crate::config::DEFAULT_TRANSCRIPT;

/// Errors from launching the subject
#[derive(Debug, Error)]
pub enum SubjectError {
    #[error("Subject '{0}' has an empty executable")]
    EmptyExecutable(String),

    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write transcript {}: {source}", .path.display())]
    Transcript {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The result of one launch: redacted merged output and the exit status.
#[derive(Debug)]
pub struct Execution {
    output: String,
    status: ExitStatus,
}

impl Execution {
    /// Captured stdout+stderr after redaction. Pre-redaction output is never
    /// exposed.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

#[derive(Clone, Debug)]
enum Redaction {
    Literal { find: String, replacement: String },
    Pattern { regex: Regex, replacement: String },
}

/// Launch configuration for the command under test.
#[derive(Clone, Debug)]
pub struct Subject {
    name: String,
    executable: String,
    environment: BTreeMap<String, String>,
    default_args: Vec<String>,
    redactions: Vec<Redaction>,
    transcript_name: PathBuf,
}

impl Subject {
    /// Create a subject whose executable defaults to its display name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            executable: name.to_string(),
            environment: BTreeMap::new(),
            default_args: Vec::new(),
            redactions: Vec::new(),
            transcript_name: PathBuf::from(DEFAULT_TRANSCRIPT),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Set the executable invocation. Whitespace-separated tokens after the
    /// first are fixed invocation arguments placed before everything else.
    pub fn set_executable(&mut self, executable: &str) {
        self.executable = executable.to_string();
    }

    /// Define an environment variable for every launch.
    pub fn env(&mut self, key: &str, value: &str) {
        self.environment.insert(key.to_string(), value.to_string());
    }

    /// Append an argument inserted between head and tail arguments.
    pub fn add_default_arg(&mut self, arg: &str) {
        self.default_args.push(arg.to_string());
    }

    pub fn set_default_args(&mut self, args: Vec<String>) {
        self.default_args = args;
    }

    /// Redact a literal path from the output. The placeholder defaults to the
    /// path's basename.
    pub fn replace_path(&mut self, path: &str, placeholder: Option<&str>) {
        let placeholder = placeholder
            .map(str::to_string)
            .unwrap_or_else(|| basename_of(path));
        self.redactions.push(Redaction::Literal {
            find: path.to_string(),
            replacement: placeholder,
        });
    }

    /// Redact a path under any user's home directory. The placeholder
    /// defaults to `$HOME/<path>`.
    pub fn replace_user_path(
        &mut self,
        path: &str,
        placeholder: Option<&str>,
    ) -> Result<(), regex::Error> {
        let placeholder = placeholder
            .map(str::to_string)
            .unwrap_or_else(|| format!("$HOME/{}", path));
        let regex = Regex::new(&format!(
            r"(?:/Users|/home|/root)(?:/[^/\s]+)*?/{}",
            regex::escape(path)
        ))?;
        self.redactions.push(Redaction::Pattern {
            regex,
            replacement: placeholder,
        });
        Ok(())
    }

    /// Redact every match of a regex with a literal replacement.
    pub fn replace_pattern(&mut self, regex: Regex, replacement: &str) {
        self.redactions.push(Redaction::Pattern {
            regex,
            replacement: replacement.to_string(),
        });
    }

    /// Set the transcript file name, written inside the launch directory.
    pub fn set_transcript_name(&mut self, name: impl Into<PathBuf>) {
        self.transcript_name = name.into();
    }

    pub fn transcript_name(&self) -> &Path {
        &self.transcript_name
    }

    /// Run the executable in `workdir` with arguments in the literal order
    /// `head ++ default ++ tail` (empty tokens dropped).
    ///
    /// Stdout and stderr are captured merged, in arrival order (best
    /// effort). The transcript (the redacted invocation line with the
    /// executable replaced by the display name, a blank line, then the
    /// redacted output) is written to `workdir/<transcript_name>`.
    pub fn launch(
        &self,
        workdir: &Path,
        head_args: &[&str],
        tail_args: &[&str],
    ) -> Result<Execution, SubjectError> {
        let mut tokens = self.executable.split_whitespace();
        let program = tokens
            .next()
            .ok_or_else(|| SubjectError::EmptyExecutable(self.name.clone()))?;

        let mut args: Vec<String> = tokens.map(str::to_string).collect();
        args.extend(head_args.iter().map(|a| a.to_string()));
        args.extend(self.default_args.iter().cloned());
        args.extend(tail_args.iter().map(|a| a.to_string()));
        args.retain(|arg| !arg.is_empty());

        tracing::debug!(subject = %self.name, program, ?args, workdir = %workdir.display(), "launching subject");

        let mut child = Command::new(program)
            .args(&args)
            .current_dir(workdir)
            .envs(&self.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SubjectError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let sink: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let mut pumps = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            pumps.push(spawn_pump(stdout, Arc::clone(&sink)));
        }
        if let Some(stderr) = child.stderr.take() {
            pumps.push(spawn_pump(stderr, Arc::clone(&sink)));
        }

        let status = child.wait().map_err(|source| SubjectError::Wait {
            program: program.to_string(),
            source,
        })?;
        for pump in pumps {
            let _ = pump.join();
        }

        let raw = String::from_utf8_lossy(&sink.lock()).into_owned();
        let output = self.redact(&raw);

        let invocation = std::iter::once(self.name.clone())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let invocation = self.redact(&invocation);

        let transcript_path = workdir.join(&self.transcript_name);
        fs::write(
            &transcript_path,
            format!("{}\n\n{}", invocation, output),
        )
        .map_err(|source| SubjectError::Transcript {
            path: transcript_path.clone(),
            source,
        })?;

        tracing::debug!(subject = %self.name, code = ?status.code(), "subject finished");
        Ok(Execution { output, status })
    }

    /// Apply every redaction rule in registration order. Replacements are
    /// literal, so re-applying the same rules is a no-op.
    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        for redaction in &self.redactions {
            match redaction {
                Redaction::Literal { find, replacement } => {
                    output = output.replace(find.as_str(), replacement);
                }
                Redaction::Pattern { regex, replacement } => {
                    output = regex
                        .replace_all(&output, regex::NoExpand(replacement.as_str()))
                        .into_owned();
                }
            }
        }
        output
    }
}

fn basename_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn spawn_pump<R>(mut reader: R, sink: Arc<Mutex<Vec<u8>>>) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => sink.lock().extend_from_slice(&buf[..n]),
            }
        }
    })
}

#[cfg(test)]
#[path = "subject_tests.rs"]
mod tests;
