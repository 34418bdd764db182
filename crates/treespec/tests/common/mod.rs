// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(dead_code)]

//! Shared helpers for harness integration tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use treespec::FileTreeSpecContext;

/// A scratch spec-root with its own temp root, torn down on drop.
pub struct SpecTree {
    dir: TempDir,
}

impl SpecTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("specs")).unwrap();
        Self { dir }
    }

    pub fn spec_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("specs")
    }

    /// Write a file below the spec root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.spec_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Create an empty directory below the spec root.
    pub fn mkdir(&self, relative: &str) {
        fs::create_dir_all(self.spec_dir().join(relative)).unwrap();
    }

    /// A context over this tree with an isolated temp root.
    pub fn context(&self) -> FileTreeSpecContext {
        let mut context = FileTreeSpecContext::new(self.spec_dir()).unwrap();
        context.set_temp_root(self.dir.path().join("tmp")).unwrap();
        context
    }
}

/// Read a file inside a sandbox, panicking with the path on failure.
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e))
}
