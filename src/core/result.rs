//! Per-target build results.

use std::path::PathBuf;

use serde::Serialize;

/// Outcome of packaging one target, whichever strategy produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BuildResult {
    pub success: bool,
    /// Final binary location; empty on failure.
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub build_time_ms: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl BuildResult {
    /// A successful result.
    pub fn succeeded(
        output_path: impl Into<PathBuf>,
        size_bytes: u64,
        build_time_ms: u64,
        warnings: Vec<String>,
    ) -> Self {
        BuildResult {
            success: true,
            output_path: output_path.into(),
            size_bytes,
            build_time_ms,
            warnings,
            errors: Vec::new(),
        }
    }

    /// A failed result carrying the triggering message.
    pub fn failed(error: impl Into<String>, build_time_ms: u64, warnings: Vec<String>) -> Self {
        BuildResult {
            success: false,
            output_path: PathBuf::new(),
            size_bytes: 0,
            build_time_ms,
            warnings,
            errors: vec![error.into()],
        }
    }
}
