//! Packaging error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error raised while deciding on or producing a target.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum PackError {
    #[error("invalid target: {reason}")]
    #[diagnostic(code(seapack::validation))]
    Validation { reason: String },

    #[error("{version} has no native single-executable support")]
    #[diagnostic(
        code(seapack::capability),
        help("use node20 or newer, or build this target in legacy mode")
    )]
    Capability { version: String },

    #[error("`{tool}` failed with exit code {}: {stderr}", fmt_exit_code(.exit_code))]
    #[diagnostic(code(seapack::external_tool))]
    ExternalTool {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("no fallback runtime is configured for {version}")]
    #[diagnostic(
        code(seapack::fallback_exhausted),
        help("this is an internal consistency bug; please report it")
    )]
    FallbackExhausted { version: String },

    #[error("failed to download {url}: {message}")]
    #[diagnostic(code(seapack::download))]
    Download { url: String, message: String },
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl PackError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            PackError::Validation { reason } => Diagnostic::error(reason.clone())
                .with_suggestion("Run `seapack targets` to list supported targets"),

            PackError::Capability { version } => Diagnostic::error(format!(
                "{} cannot produce a native single-executable binary",
                version
            ))
            .with_suggestion("Target node20 or newer")
            .with_suggestion("Drop `--sea` to let seapack choose the legacy packager"),

            PackError::ExternalTool {
                tool,
                exit_code,
                stderr,
            } => {
                let mut diag = Diagnostic::error(format!("`{}` exited unsuccessfully", tool));
                if let Some(code) = exit_code {
                    diag = diag.with_context(format!("exit code: {}", code));
                }
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }
                diag.with_suggestion("Run `seapack doctor` to check external tools")
            }

            PackError::FallbackExhausted { version } => Diagnostic::error(format!(
                "no compatibility fallback exists for {}",
                version
            ))
            .with_context("every supported runtime version should map to a fallback")
            .with_suggestion("Report this as a bug"),

            PackError::Download { url, message } => {
                Diagnostic::error(format!("error downloading `{}`: {}", url, message))
                    .with_suggestion("Check your network connection")
                    .with_suggestion("Set `net.mirror` to a reachable Node.js distribution mirror")
            }
        }
    }

    /// Build an [`PackError::ExternalTool`] from a finished tool run.
    pub fn external_tool(tool: impl Into<String>, output: &crate::util::process::ToolOutput) -> Self {
        PackError::ExternalTool {
            tool: tool.into(),
            exit_code: output.exit_code,
            stderr: output.diagnostic().to_string(),
        }
    }
}
