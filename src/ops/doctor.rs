//! Environment and toolchain health checks.
//!
//! The `doctor` command performs fast environment checks to verify
//! that all required tools are available and properly configured.
//!
//! ## Usage
//!
//! ```bash
//! seapack doctor           # Quick check
//! seapack doctor --verbose # Detailed output
//! ```
//!
//! ## Checks Performed
//!
//! - Host platform recognition
//! - Node.js runtime and its native single-executable support
//! - Blob injector (`postject`)
//! - Legacy packager and fetcher (`pkg`, `pkg-fetch`)
//! - Signing tools on macOS and Windows
//! - Runtime cache directory

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::core::capability::capability_of;
use crate::core::host::{HostInfo, HostRuntime};
use crate::core::target::Platform;
use crate::util::config::ToolsConfig;
use crate::util::fs::ensure_dir;
use crate::util::process::{find_executable, ToolRunner};

/// Result of a single health check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the tool path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    pub total_duration: Duration,

    /// Environment information
    pub environment: BTreeMap<String, String>,
}

impl DoctorReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    /// Get the count of passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Get the count of failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get the count of required failed checks.
    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Options for the doctor command.
#[derive(Debug, Clone, Default)]
pub struct DoctorOptions {
    /// Tool names or paths to check
    pub tools: ToolsConfig,

    /// Runtime cache directory to probe
    pub cache_dir: Option<PathBuf>,
}

/// Run the doctor command.
pub fn doctor(runner: &dyn ToolRunner, host: Option<&HostInfo>, options: &DoctorOptions) -> DoctorReport {
    let start = Instant::now();
    let mut report = DoctorReport::new();
    let tools = &options.tools;

    // Collect environment info
    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());

    report.add(check_host(host));
    report.add(check_runtime(runner, tools.node()));
    report.add(check_tool("Blob injector", tools.postject(), "needed for native builds"));
    report.add(check_tool(
        "Legacy packager",
        tools.legacy_packager(),
        "needed for legacy builds",
    ));
    report.add(
        check_tool(
            "Legacy fetcher",
            tools.legacy_fetcher(),
            "needed for compatibility-mode runtimes",
        )
        .optional(),
    );

    let signing = tools.signing();
    match host.map(|h| h.platform) {
        // Signature removal is mandatory on macOS.
        Some(Platform::Macos) => report.add(check_tool(
            "Code signing",
            &signing.codesign,
            "needed to inject into signed runtimes",
        )),
        Some(Platform::Windows) => report.add(
            check_tool("Code signing", &signing.signtool, "used to re-sign binaries").optional(),
        ),
        _ => {}
    }

    if let Some(cache_dir) = &options.cache_dir {
        report.add(check_cache_dir(cache_dir));
    }

    report.total_duration = start.elapsed();
    report
}

fn check_host(host: Option<&HostInfo>) -> CheckResult {
    match host {
        Some(host) => CheckResult::pass("Host platform", format!("{}-{}", host.platform, host.arch)),
        None => CheckResult::fail(
            "Host platform",
            format!(
                "{}-{} has no Node.js builds; only legacy cross-builds are possible",
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
        ),
    }
}

fn check_runtime(runner: &dyn ToolRunner, program: &str) -> CheckResult {
    let start = Instant::now();

    match HostRuntime::detect(runner, program) {
        Ok(runtime) => {
            let info = capability_of(&format!("node{}", runtime.major()));
            let message = if info.stable_native {
                format!("Found node {} (native builds available)", runtime.version)
            } else if info.supports_native {
                format!("Found node {} (native support is pre-stable)", runtime.version)
            } else {
                format!("Found node {} (no native support; legacy only)", runtime.version)
            };
            CheckResult::pass("Node.js runtime", message)
                .with_path(runtime.path.clone())
                .with_version(runtime.version.to_string())
                .with_duration(start.elapsed())
        }
        Err(e) => CheckResult::fail("Node.js runtime", format!("{:#}", e))
            .with_duration(start.elapsed()),
    }
}

fn check_tool(name: &str, program: &str, purpose: &str) -> CheckResult {
    let start = Instant::now();
    match find_executable(program) {
        Some(path) => CheckResult::pass(name, format!("Found {}", program))
            .with_path(path)
            .with_duration(start.elapsed()),
        None => CheckResult::fail(name, format!("`{}` not found ({})", program, purpose))
            .with_duration(start.elapsed()),
    }
}

fn check_cache_dir(dir: &std::path::Path) -> CheckResult {
    let writable = ensure_dir(dir)
        .and_then(|_| tempfile::tempfile_in(dir).map_err(Into::into))
        .is_ok();
    if writable {
        CheckResult::pass("Runtime cache", format!("{} is writable", dir.display()))
            .with_path(dir.to_path_buf())
            .optional()
    } else {
        CheckResult::fail("Runtime cache", format!("{} is not writable", dir.display()))
            .with_path(dir.to_path_buf())
            .optional()
    }
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut lines = vec!["seapack doctor".to_string(), "==============".to_string(), String::new()];

    // Environment
    if verbose {
        let unknown = "unknown".to_string();
        lines.push("Environment:".to_string());
        lines.push(format!(
            "  OS: {} ({})",
            report.environment.get("os").unwrap_or(&unknown),
            report.environment.get("arch").unwrap_or(&unknown)
        ));
        lines.push(String::new());
    }

    // Checks
    lines.push("Checks:".to_string());
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        lines.push(format!("  {} {}{}", status, check.name, required));

        if verbose || !check.passed {
            lines.push(format!("      {}", check.message));
        }
        if verbose {
            if let Some(path) = &check.path {
                lines.push(format!("      Path: {}", path.display()));
            }
            if let Some(version) = &check.version {
                lines.push(format!("      Version: {}", version));
            }
        }
    }
    lines.push(String::new());

    // Summary
    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();
    lines.push(format!("Summary: {} passed, {} failed", passed, failed));

    if required_failed > 0 {
        lines.push(format!(
            "\nWarning: {} required check(s) failed. Some builds may not work.",
            required_failed
        ));
    } else if failed > 0 {
        lines.push(format!(
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        ));
    } else {
        lines.push("\nAll checks passed. seapack is ready to use.".to_string());
    }

    lines.join("\n")
}
