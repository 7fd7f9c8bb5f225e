//! Retrieval of prebuilt base binaries maintained by the legacy toolchain.

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::core::error::PackError;
use crate::core::target::{Arch, Platform};
use crate::util::process::ToolRunner;

/// Port for the legacy toolchain's binary fetcher.
pub trait LegacyFetcher {
    /// Fetch (or reuse) the base binary for `node<major>` and return its path.
    fn fetch(&self, major: u64, platform: Platform, arch: Arch) -> Result<PathBuf>;
}

/// Platform names as the legacy toolchain spells them.
pub fn legacy_platform_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Linux => "linux",
        Platform::Macos => "macos",
        Platform::Windows => "win",
        Platform::Alpine => "alpine",
        Platform::LinuxStatic => "linuxstatic",
    }
}

/// [`LegacyFetcher`] that shells out to the `pkg-fetch` CLI.
///
/// The fetcher prints the path of the cached binary as the last line of
/// its standard output.
pub struct PkgFetchCli<'a> {
    runner: &'a dyn ToolRunner,
    command: String,
}

impl<'a> PkgFetchCli<'a> {
    pub fn new(runner: &'a dyn ToolRunner, command: impl Into<String>) -> Self {
        PkgFetchCli {
            runner,
            command: command.into(),
        }
    }
}

impl LegacyFetcher for PkgFetchCli<'_> {
    fn fetch(&self, major: u64, platform: Platform, arch: Arch) -> Result<PathBuf> {
        let args = vec![
            "-n".to_string(),
            format!("node{}", major),
            "-p".to_string(),
            legacy_platform_name(platform).to_string(),
            "-a".to_string(),
            arch.to_string(),
        ];

        tracing::debug!("fetching legacy base binary node{}-{}-{}", major, platform, arch);
        let output = self.runner.run(&self.command, &args)?;
        if !output.success() {
            return Err(PackError::external_tool(&self.command, &output).into());
        }

        let Some(line) = output.stdout.lines().rev().find(|l| !l.trim().is_empty()) else {
            bail!("`{}` did not report a binary path", self.command);
        };

        let path = PathBuf::from(line.trim());
        if !path.is_file() {
            bail!(
                "`{}` reported `{}`, which does not exist",
                self.command,
                path.display()
            );
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutor, MockProcessOutput};

    #[test]
    fn test_fetch_reads_last_stdout_line() {
        let tmp = tempfile::TempDir::new().unwrap();
        let binary = tmp.path().join("fetched-v18-linux-x64");
        std::fs::write(&binary, "base").unwrap();

        let exec = MockExecutor::new();
        exec.expect(
            "pkg-fetch -n node18 -p linux -a x64",
            MockProcessOutput::success(format!("> Fetching base\n{}\n", binary.display())),
        );

        let fetcher = PkgFetchCli::new(&exec, "pkg-fetch");
        let path = fetcher.fetch(18, Platform::Linux, Arch::X64).unwrap();
        assert_eq!(path, binary);
    }

    #[test]
    fn test_fetch_failure_carries_stderr() {
        let exec = MockExecutor::new();
        exec.expect_prefix("pkg-fetch", MockProcessOutput::failure(2, "no such base"));

        let fetcher = PkgFetchCli::new(&exec, "pkg-fetch");
        let err = fetcher.fetch(20, Platform::Alpine, Arch::Arm64).unwrap_err();
        assert!(err.to_string().contains("no such base"));
        assert_eq!(
            exec.calls(),
            vec!["pkg-fetch -n node20 -p alpine -a arm64".to_string()]
        );
    }

    #[test]
    fn test_fetch_rejects_missing_path() {
        let exec = MockExecutor::new();
        exec.expect_prefix("pkg-fetch", MockProcessOutput::success("/nope/node\n"));

        let fetcher = PkgFetchCli::new(&exec, "pkg-fetch");
        assert!(fetcher.fetch(22, Platform::Linux, Arch::X64).is_err());
    }
}
