//! Subprocess execution utilities.
//!
//! Every external tool the packager drives (the Node runtime, `postject`,
//! `codesign`, `signtool`, the legacy packager) is reached through the
//! [`ToolRunner`] port so tests can substitute an in-process fake.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use thiserror::Error;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Whether the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The most useful diagnostic text: stderr, or stdout if stderr is empty.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Failure to run a tool at all (as opposed to the tool exiting nonzero).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("`{program}` was not found")]
    NotFound { program: String },

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolError::NotFound { .. })
    }
}

/// Port for running external tools.
pub trait ToolRunner {
    /// Run `program` with `args` to completion and capture its output.
    fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError>;
}

/// [`ToolRunner`] backed by real subprocesses.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    pub fn new() -> Self {
        SystemToolRunner
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        let builder = ProcessBuilder::new(program).args(args);
        tracing::debug!("running `{}`", builder.display_command());

        match builder.exec() {
            Ok(output) => Ok(output.into()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ToolError::NotFound {
                program: program.to_string(),
            }),
            Err(source) => Err(ToolError::Spawn {
                program: program.to_string(),
                source,
            }),
        }
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Execute the command and wait for completion, capturing output.
    pub fn exec(&self) -> io::Result<Output> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?
            .wait_with_output()
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        display_invocation(&self.program.display().to_string(), &self.args)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Render a program and its arguments as one line, for logs and mocks.
pub fn display_invocation(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn test_system_runner_captures_output() {
        let output = SystemToolRunner::new()
            .run("echo", &["hello".to_string()])
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_system_runner_reports_missing_tool() {
        let err = SystemToolRunner::new()
            .run("seapack-definitely-not-a-real-tool", &[])
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("postject").args(["app", "NODE_SEA_BLOB", "prep.blob"]);

        assert_eq!(pb.display_command(), "postject app NODE_SEA_BLOB prep.blob");
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let output = ToolOutput {
            exit_code: Some(1),
            stdout: "some stdout".to_string(),
            stderr: "  boom\n".to_string(),
        };
        assert_eq!(output.diagnostic(), "boom");

        let output = ToolOutput {
            exit_code: Some(1),
            stdout: "only stdout\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.diagnostic(), "only stdout");
    }
}
