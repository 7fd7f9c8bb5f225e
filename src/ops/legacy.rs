//! The legacy bundler, driven as an external process.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::error::PackError;
use crate::core::result::BuildResult;
use crate::core::target::Target;
use crate::sources::legacy_fetch::legacy_platform_name;
use crate::util::fs::write_string;
use crate::util::process::ToolRunner;

/// What the legacy packager is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRequest {
    pub entrypoint: PathBuf,
    pub output: PathBuf,
    pub target: Target,
    pub assets: Vec<String>,
}

/// Port for the legacy bundler.
///
/// `Err` means the packager could not be run at all; a packager that ran
/// and failed reports through an unsuccessful [`BuildResult`].
pub trait LegacyPackager {
    fn package(&self, request: &LegacyRequest) -> Result<BuildResult>;
}

/// `node22-linux-x64` as the legacy toolchain spells it.
pub fn legacy_triple(target: &Target) -> String {
    format!(
        "{}-{}-{}",
        target.runtime_version(),
        legacy_platform_name(target.platform()),
        target.arch()
    )
}

#[derive(Serialize)]
struct PkgConfig<'a> {
    pkg: PkgSection<'a>,
}

#[derive(Serialize)]
struct PkgSection<'a> {
    assets: &'a [String],
}

/// [`LegacyPackager`] that runs the `pkg` CLI.
pub struct PkgCli<'a> {
    runner: &'a dyn ToolRunner,
    command: String,
}

impl<'a> PkgCli<'a> {
    pub fn new(runner: &'a dyn ToolRunner, command: impl Into<String>) -> Self {
        PkgCli {
            runner,
            command: command.into(),
        }
    }

    fn args(&self, request: &LegacyRequest, config: Option<&PathBuf>) -> Vec<String> {
        let mut args = vec![
            request.entrypoint.to_string_lossy().into_owned(),
            "--targets".to_string(),
            legacy_triple(&request.target),
            "--output".to_string(),
            request.output.to_string_lossy().into_owned(),
        ];
        if let Some(config) = config {
            args.push("--config".to_string());
            args.push(config.to_string_lossy().into_owned());
        }
        args
    }
}

impl LegacyPackager for PkgCli<'_> {
    fn package(&self, request: &LegacyRequest) -> Result<BuildResult> {
        let start = Instant::now();

        // The asset list travels in a throwaway config file.
        let config_dir = if request.assets.is_empty() {
            None
        } else {
            Some(
                tempfile::Builder::new()
                    .prefix("seapack-pkg-")
                    .tempdir()
                    .context("failed to create temporary config directory")?,
            )
        };
        let config_path = match &config_dir {
            Some(dir) => {
                let path = dir.path().join("pkg.json");
                let config = PkgConfig {
                    pkg: PkgSection {
                        assets: &request.assets,
                    },
                };
                write_string(&path, &serde_json::to_string_pretty(&config)?)?;
                Some(path)
            }
            None => None,
        };

        let args = self.args(request, config_path.as_ref());
        tracing::info!("packaging {} with `{}`", request.target, self.command);
        let output = self.runner.run(&self.command, &args)?;
        let elapsed = start.elapsed().as_millis() as u64;

        if let Some(dir) = config_dir {
            if let Err(e) = dir.close() {
                tracing::debug!("failed to remove legacy config dir: {}", e);
            }
        }

        if !output.success() {
            let err = PackError::external_tool(&self.command, &output);
            return Ok(BuildResult::failed(err.to_string(), elapsed, Vec::new()));
        }

        let size = std::fs::metadata(&request.output)
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(BuildResult::succeeded(&request.output, size, elapsed, Vec::new()))
    }
}
