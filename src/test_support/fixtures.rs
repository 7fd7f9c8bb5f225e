//! Test fixtures for common test scenarios.
//!
//! This module provides on-disk project layouts for pipeline and
//! orchestrator tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Minimal entrypoint script.
pub const HELLO_JS: &str = "console.log('hello from a single executable');\n";

/// A throwaway project directory with an entrypoint and a private root for
/// the assembler's temporary directories.
///
/// ```text
/// <tmp>/
/// ├── app/
/// │   └── index.js
/// ├── bin/          # fake runtimes
/// └── scratch/      # temp_root for assemblies
/// ```
pub struct SeaProject {
    dir: TempDir,
}

impl SeaProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let project = SeaProject { dir };
        std::fs::create_dir_all(project.temp_root()).expect("failed to create scratch dir");
        project.write("index.js", HELLO_JS);
        project
    }

    /// Project root (`<tmp>/app`).
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("app")
    }

    pub fn entrypoint(&self) -> PathBuf {
        self.root().join("index.js")
    }

    /// Directory the assembler should create its temp dirs in.
    pub fn temp_root(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    /// Write a file relative to the project root.
    pub fn write(&self, relative: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    /// Create a stand-in runtime executable outside the project.
    pub fn fake_node(&self, name: &str) -> PathBuf {
        let bin = self.dir.path().join("bin");
        std::fs::create_dir_all(&bin).expect("failed to create bin dir");
        let path = bin.join(name);
        std::fs::write(&path, format!("#!fake runtime {}\n", name))
            .expect("failed to write fake runtime");
        path
    }
}

impl Default for SeaProject {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_project_layout() {
        let project = SeaProject::new();
        assert!(project.entrypoint().is_file());
        assert!(project.temp_root().is_dir());
        assert!(!project.temp_root().starts_with(project.root()));
        assert!(project.fake_node("node").is_file());
    }
}
