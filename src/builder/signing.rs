//! Code signature removal and re-signing for injected binaries.
//!
//! Injection invalidates any existing signature, so macOS and Windows
//! binaries are stripped before injection and optionally re-signed after.
//! Only signature removal on macOS is fatal; everything else is best effort.

use std::path::Path;

use anyhow::Result;

use crate::core::error::PackError;
use crate::core::target::Platform;
use crate::util::process::{ToolError, ToolRunner};

/// Outcome of a step whose failure is tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort {
    Done,
    /// The step does not apply to this platform.
    Skipped,
    /// The tool is not installed.
    ToolMissing { tool: String },
    /// The tool ran and failed.
    Failed { tool: String, message: String },
}

impl BestEffort {
    /// Warning text for outcomes that did not complete the step.
    pub fn warning(&self, action: &str) -> Option<String> {
        match self {
            BestEffort::Done | BestEffort::Skipped => None,
            BestEffort::ToolMissing { tool } => {
                Some(format!("{} skipped: `{}` is not installed", action, tool))
            }
            BestEffort::Failed { tool, message } => {
                Some(format!("{} with `{}` failed: {}", action, tool, message))
            }
        }
    }
}

/// Signing utility names, overridable through configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTools {
    pub codesign: String,
    pub signtool: String,
}

impl Default for SigningTools {
    fn default() -> Self {
        SigningTools {
            codesign: "codesign".to_string(),
            signtool: "signtool".to_string(),
        }
    }
}

fn run_best_effort(runner: &dyn ToolRunner, tool: &str, args: &[String]) -> BestEffort {
    match runner.run(tool, args) {
        Ok(output) if output.success() => BestEffort::Done,
        Ok(output) => BestEffort::Failed {
            tool: tool.to_string(),
            message: output.diagnostic().to_string(),
        },
        Err(ToolError::NotFound { .. }) => BestEffort::ToolMissing {
            tool: tool.to_string(),
        },
        Err(e) => BestEffort::Failed {
            tool: tool.to_string(),
            message: e.to_string(),
        },
    }
}

/// Strip an existing code signature from `binary`.
pub fn remove_signature(
    runner: &dyn ToolRunner,
    tools: &SigningTools,
    platform: Platform,
    binary: &Path,
) -> Result<BestEffort> {
    let binary = binary.to_string_lossy().into_owned();
    match platform {
        Platform::Macos => {
            let args = vec!["--remove-signature".to_string(), binary];
            let output = runner.run(&tools.codesign, &args)?;
            if !output.success() {
                return Err(PackError::external_tool(&tools.codesign, &output).into());
            }
            Ok(BestEffort::Done)
        }
        Platform::Windows => {
            let args = vec!["remove".to_string(), "/s".to_string(), binary];
            Ok(run_best_effort(runner, &tools.signtool, &args))
        }
        Platform::Linux | Platform::Alpine | Platform::LinuxStatic => Ok(BestEffort::Skipped),
    }
}

/// Re-sign `binary` after injection. Never fails the build.
pub fn sign(
    runner: &dyn ToolRunner,
    tools: &SigningTools,
    platform: Platform,
    binary: &Path,
) -> BestEffort {
    let binary = binary.to_string_lossy().into_owned();
    match platform {
        Platform::Macos => {
            let args = vec!["--sign".to_string(), "-".to_string(), binary];
            run_best_effort(runner, &tools.codesign, &args)
        }
        Platform::Windows => {
            let args = vec![
                "sign".to_string(),
                "/fd".to_string(),
                "SHA256".to_string(),
                "/a".to_string(),
                binary,
            ];
            run_best_effort(runner, &tools.signtool, &args)
        }
        Platform::Linux | Platform::Alpine | Platform::LinuxStatic => BestEffort::Skipped,
    }
}
