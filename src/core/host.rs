//! Facts about the machine seapack is running on.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::target::{Arch, Platform};
use crate::util::process::{find_executable, ToolRunner};

/// Host platform, architecture and (optionally) the installed Node major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub platform: Platform,
    pub arch: Arch,
    pub runtime_major: Option<u64>,
}

impl HostInfo {
    pub fn new(platform: Platform, arch: Arch) -> Self {
        HostInfo {
            platform,
            arch,
            runtime_major: None,
        }
    }

    pub fn with_runtime_major(mut self, major: u64) -> Self {
        self.runtime_major = Some(major);
        self
    }

    /// Detect the host from the compile-time target and the filesystem.
    ///
    /// Returns `None` on operating systems Node does not ship binaries for.
    pub fn detect() -> Option<Self> {
        let platform = match std::env::consts::OS {
            "linux" if Path::new("/etc/alpine-release").exists() => Platform::Alpine,
            "linux" => Platform::Linux,
            "macos" => Platform::Macos,
            "windows" => Platform::Windows,
            _ => return None,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Arm64,
            "x86" => Arch::X86,
            _ => return None,
        };
        Some(HostInfo::new(platform, arch))
    }

    /// The host runtime as a version tag (`node22`), if known.
    pub fn runtime_tag(&self) -> Option<String> {
        self.runtime_major.map(|major| format!("node{}", major))
    }
}

/// The Node executable that drives native builds on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRuntime {
    /// Absolute path to the executable.
    pub path: PathBuf,
    /// Version reported by `node --version`.
    pub version: semver::Version,
}

impl HostRuntime {
    pub fn new(path: impl Into<PathBuf>, version: semver::Version) -> Self {
        HostRuntime {
            path: path.into(),
            version,
        }
    }

    pub fn major(&self) -> u64 {
        self.version.major
    }

    /// Locate `program` and ask it for its version.
    pub fn detect(runner: &dyn ToolRunner, program: &str) -> Result<Self> {
        let path = if Path::new(program).is_absolute() {
            PathBuf::from(program)
        } else {
            find_executable(program)
                .with_context(|| format!("`{}` was not found in PATH", program))?
        };

        let path_str = path.to_string_lossy().into_owned();
        let output = runner
            .run(&path_str, &["--version".to_string()])
            .with_context(|| format!("failed to query version of `{}`", path.display()))?;
        if !output.success() {
            bail!(
                "`{} --version` failed: {}",
                path.display(),
                output.diagnostic()
            );
        }

        let version = parse_runtime_version(&output.stdout)?;
        tracing::debug!("host runtime {} at {}", version, path.display());
        Ok(HostRuntime { path, version })
    }
}

/// Parse `node --version` output such as `v22.3.0`.
pub fn parse_runtime_version(raw: &str) -> Result<semver::Version> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(bare)
        .with_context(|| format!("unrecognised runtime version `{}`", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_runtime_version() {
        let version = parse_runtime_version("v22.3.0\n").unwrap();
        assert_eq!(version.major, 22);
        assert_eq!(version.minor, 3);

        assert!(parse_runtime_version("not a version").is_err());
    }

    #[test]
    fn test_runtime_tag() {
        let host = HostInfo::new(Platform::Linux, Arch::X64);
        assert_eq!(host.runtime_tag(), None);
        assert_eq!(host.with_runtime_major(20).runtime_tag().as_deref(), Some("node20"));
    }
}
