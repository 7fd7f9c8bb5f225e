//! Build event types for JSON output.
//!
//! This module defines the stable JSON schema for machine-readable build output.
//! These events are emitted when using `--message-format=json`.
//!
//! # Event Types
//!
//! - `target-decided`: A strategy was chosen for a target
//! - `target-finished`: A target was packaged (success or failure)
//! - `build-finished`: All targets were processed
//!
//! # Stability
//!
//! The JSON schema is versioned and should remain backwards compatible.
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::decision::{BuildDecision, BuildMode};
use crate::core::result::BuildResult;

/// A build event emitted during the build process.
///
/// Each event is serialized as a single JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// A strategy was chosen for a target.
    #[serde(rename = "target-decided")]
    TargetDecided {
        /// Target triple (e.g., "node22-linux-x64")
        target: String,
        /// Strategy that will run
        mode: BuildMode,
        /// Why the strategy was chosen
        explanation: String,
        can_use_native: bool,
        /// 1-based position in the target list
        index: usize,
        total: usize,
    },

    /// A target was packaged.
    #[serde(rename = "target-finished")]
    TargetFinished {
        target: String,
        mode: BuildMode,
        success: bool,
        /// Final binary (absent on failure)
        #[serde(skip_serializing_if = "Option::is_none")]
        output_path: Option<PathBuf>,
        size_bytes: u64,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        errors: Vec<String>,
    },

    /// Build completed (success or failure).
    #[serde(rename = "build-finished")]
    BuildFinished {
        /// Whether every target succeeded
        success: bool,
        /// Total build duration in milliseconds
        duration_ms: u64,
        native_count: usize,
        legacy_count: usize,
    },
}

impl BuildEvent {
    /// Create a target decided event.
    pub fn decided(decision: &BuildDecision, index: usize, total: usize) -> Self {
        BuildEvent::TargetDecided {
            target: decision.target.to_string(),
            mode: decision.effective_mode(),
            explanation: decision.reason.clone(),
            can_use_native: decision.can_use_native,
            index,
            total,
        }
    }

    /// Create a target finished event.
    pub fn finished_target(target: impl Into<String>, mode: BuildMode, result: &BuildResult) -> Self {
        BuildEvent::TargetFinished {
            target: target.into(),
            mode,
            success: result.success,
            output_path: result.success.then(|| result.output_path.clone()),
            size_bytes: result.size_bytes,
            duration_ms: result.build_time_ms,
            warnings: result.warnings.clone(),
            errors: result.errors.clone(),
        }
    }

    /// Create a build finished event.
    pub fn finished(success: bool, duration_ms: u64, native_count: usize, legacy_count: usize) -> Self {
        BuildEvent::BuildFinished {
            success,
            duration_ms,
            native_count,
            legacy_count,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
