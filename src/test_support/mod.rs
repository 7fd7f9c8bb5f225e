//! Test utilities and mocks for seapack unit tests.
//!
//! This module provides mock implementations for the ports the packager
//! drives: external tools, HTTP downloads, the legacy fetcher and the
//! legacy packager.
//!
//! # Example
//!
//! ```rust,ignore
//! use seapack::test_support::{MockExecutor, MockProcessOutput};
//!
//! #[test]
//! fn test_example() {
//!     let exec = MockExecutor::new();
//!     exec.expect("node --version", MockProcessOutput::success("v22.3.0"));
//!
//!     // Pass `&exec` wherever a `&dyn ToolRunner` is expected...
//! }
//! ```

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::core::error::PackError;
use crate::core::result::BuildResult;
use crate::core::target::{Arch, Platform};
use crate::ops::legacy::{LegacyPackager, LegacyRequest};
use crate::sources::download::HttpClient;
use crate::sources::legacy_fetch::LegacyFetcher;
use crate::util::process::{display_invocation, ToolError, ToolOutput, ToolRunner};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_tool_output(&self) -> ToolOutput {
        ToolOutput {
            exit_code: Some(self.status),
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

#[derive(Debug, Default)]
struct ExecutorState {
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    missing: HashSet<String>,
    calls: Vec<String>,
    default_output: Option<MockProcessOutput>,
}

/// Mock process executor for testing command execution.
///
/// Records every invocation as `program arg1 arg2 ...` and answers with the
/// first matching expectation. Programs registered with
/// [`MockExecutor::expect_missing`] behave as if they were not installed.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<ExecutorState>,
}

impl MockExecutor {
    /// Create a new mock executor.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, pattern: CommandPattern, output: MockProcessOutput) -> &Self {
        self.state
            .lock()
            .unwrap()
            .expectations
            .push((pattern, output));
        self
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), output)
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::StartsWith(prefix.to_string()), output)
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.push(CommandPattern::Contains(substring.to_string()), output)
    }

    /// Make `program` report [`ToolError::NotFound`].
    pub fn expect_missing(&self, program: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .missing
            .insert(program.to_string());
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        self.state.lock().unwrap().default_output = Some(output);
        self
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl ToolRunner for MockExecutor {
    fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        let full_cmd = display_invocation(program, args);
        let mut state = self.state.lock().unwrap();
        state.calls.push(full_cmd.clone());

        if state.missing.contains(program) {
            return Err(ToolError::NotFound {
                program: program.to_string(),
            });
        }

        if let Some((_, output)) = state
            .expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&full_cmd))
        {
            return Ok(output.to_tool_output());
        }

        if let Some(default) = &state.default_output {
            return Ok(default.to_tool_output());
        }

        Err(ToolError::Spawn {
            program: program.to_string(),
            source: std::io::Error::other(format!("unexpected command: {}", full_cmd)),
        })
    }
}

/// Mock HTTP response for testing downloads.
#[derive(Debug, Clone)]
pub struct MockHttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockHttpResponse {
    /// Create a successful response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        MockHttpResponse {
            status: 200,
            body: body.into(),
        }
    }

    /// Create a not found response.
    pub fn not_found() -> Self {
        MockHttpResponse {
            status: 404,
            body: b"Not Found".to_vec(),
        }
    }

    /// Check if this is a successful response.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Mock HTTP client for testing runtime downloads.
///
/// URLs without a registered response answer 404.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<HashMap<String, MockHttpResponse>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for a URL.
    pub fn mock_url(&self, url: &str, response: MockHttpResponse) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// Get all requested URLs.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockHttpClient {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(MockHttpResponse::not_found);

        if !response.is_success() {
            return Err(PackError::Download {
                url: url.to_string(),
                message: format!("HTTP {}", response.status),
            }
            .into());
        }
        Ok(response.body)
    }
}

/// [`LegacyFetcher`] that fabricates base binaries under a directory.
#[derive(Debug)]
pub struct FakeLegacyFetcher {
    root: PathBuf,
    fetched: Mutex<Vec<(u64, Platform, Arch)>>,
    unavailable: bool,
}

impl FakeLegacyFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FakeLegacyFetcher {
            root: root.as_ref().join("legacy-bases"),
            fetched: Mutex::new(Vec::new()),
            unavailable: false,
        }
    }

    /// A fetcher whose every request fails.
    pub fn unavailable(root: impl AsRef<Path>) -> Self {
        FakeLegacyFetcher {
            unavailable: true,
            ..Self::new(root)
        }
    }

    /// Every `(major, platform, arch)` requested so far.
    pub fn fetched(&self) -> Vec<(u64, Platform, Arch)> {
        self.fetched.lock().unwrap().clone()
    }
}

impl LegacyFetcher for FakeLegacyFetcher {
    fn fetch(&self, major: u64, platform: Platform, arch: Arch) -> Result<PathBuf> {
        self.fetched.lock().unwrap().push((major, platform, arch));
        if self.unavailable {
            bail!("no legacy base binary for node{}-{}-{}", major, platform, arch);
        }

        std::fs::create_dir_all(&self.root)?;
        let path = self
            .root
            .join(format!("fetched-v{}-{}-{}", major, platform, arch));
        std::fs::write(&path, format!("legacy node{}", major))?;
        Ok(path)
    }
}

/// [`LegacyPackager`] that writes a placeholder binary to the requested
/// output, unless told to fail for a target.
#[derive(Debug, Default)]
pub struct FakeLegacyPackager {
    requests: Mutex<Vec<LegacyRequest>>,
    failing: HashSet<String>,
    broken: HashSet<String>,
}

impl FakeLegacyPackager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an unsuccessful build for `target`.
    pub fn fail_on(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }

    /// Return `Err` (packager could not run) for `target`.
    pub fn error_on(mut self, target: &str) -> Self {
        self.broken.insert(target.to_string());
        self
    }

    pub fn requests(&self) -> Vec<LegacyRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LegacyPackager for FakeLegacyPackager {
    fn package(&self, request: &LegacyRequest) -> Result<BuildResult> {
        self.requests.lock().unwrap().push(request.clone());
        let key = request.target.to_string();

        if self.broken.contains(&key) {
            bail!("legacy packager crashed on {}", key);
        }
        if self.failing.contains(&key) {
            return Ok(BuildResult::failed(
                format!("legacy packaging of {} failed", key),
                1,
                Vec::new(),
            ));
        }

        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&request.output, b"legacy bundle")?;
        Ok(BuildResult::succeeded(&request.output, 13, 1, Vec::new()))
    }
}

/// Build an in-memory `.tar.gz` from `(path, contents)` pairs.
pub fn gzipped_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, path, *contents).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_matching() {
        let exec = MockExecutor::new();
        exec.expect("node --version", MockProcessOutput::success("v22.3.0"));
        exec.expect_prefix("postject", MockProcessOutput::failure(1, "boom"));

        let out = exec.run("node", &["--version".to_string()]).unwrap();
        assert_eq!(out.stdout, "v22.3.0");

        let out = exec.run("postject", &["node".to_string()]).unwrap();
        assert!(!out.success());

        assert!(exec.run("codesign", &[]).is_err());
        assert_eq!(exec.calls().len(), 3);
    }

    #[test]
    fn test_mock_executor_missing_beats_default() {
        let exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));
        exec.expect_missing("signtool");

        let err = exec.run("signtool", &["sign".to_string()]).unwrap_err();
        assert!(err.is_not_found());
        assert!(exec.run("codesign", &[]).unwrap().success());
    }

    #[test]
    fn test_mock_http_defaults_to_404() {
        let http = MockHttpClient::new();
        http.mock_url("https://a.test/x", MockHttpResponse::ok("body"));

        assert_eq!(http.get("https://a.test/x").unwrap(), b"body");
        let err = http.get("https://a.test/y").unwrap_err();
        assert!(err.to_string().contains("HTTP 404"));
        assert_eq!(http.requests().len(), 2);
    }
}
