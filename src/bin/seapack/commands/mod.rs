//! Command implementations

pub mod build;
pub mod completions;
pub mod doctor;
pub mod explain;
pub mod fetch;
pub mod targets;

use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;

use seapack::core::decision::{BuildMode, ProjectTraits};
use seapack::core::host::{HostInfo, HostRuntime};
use seapack::core::target::Target;
use seapack::util::config::Config;
use seapack::util::diagnostic::suggestions;
use seapack::util::ToolRunner;

use crate::cli::{RuntimeArgs, StrategyArgs};

/// Errors raised by the command layer itself.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("entrypoint `{}` does not exist", .0.display())]
    MissingEntrypoint(PathBuf),

    #[error("{failed} of {total} target(s) failed")]
    BuildFailed { failed: usize, total: usize },

    #[error("this machine ({os}-{arch}) is not a supported Node.js host")]
    UnsupportedHost { os: &'static str, arch: &'static str },
}

impl CliError {
    pub fn hint(&self) -> &'static str {
        match self {
            CliError::MissingEntrypoint(_) => suggestions::MISSING_ENTRYPOINT,
            CliError::BuildFailed { .. } => suggestions::BUILD_FAILED,
            CliError::UnsupportedHost { .. } => suggestions::BAD_TARGET,
        }
    }
}

/// The host description, with the installed runtime when one is found.
pub fn detect_host(runner: &dyn ToolRunner, node: &str) -> Result<(HostInfo, Option<HostRuntime>)> {
    let host = HostInfo::detect().ok_or(CliError::UnsupportedHost {
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
    })?;

    match HostRuntime::detect(runner, node) {
        Ok(runtime) => {
            let host = host.with_runtime_major(runtime.major());
            Ok((host, Some(runtime)))
        }
        Err(e) => {
            tracing::debug!("no host runtime: {:#}", e);
            Ok((host, None))
        }
    }
}

/// Accept `22` as well as `node22` for `--node-version`.
fn normalize_version(raw: &str) -> String {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("node{}", raw)
    } else {
        raw.to_string()
    }
}

/// Targets from the command line, else from config, else the host itself.
pub fn resolve_targets(args: &StrategyArgs, config: &Config, host: &HostInfo) -> Result<Vec<Target>> {
    let declared = if args.targets.is_empty() {
        config.build.targets.clone()
    } else {
        args.targets.clone()
    };

    let mut targets = if declared.is_empty() {
        let version = host
            .runtime_tag()
            .unwrap_or_else(|| seapack::core::target::LATEST_TAG.to_string());
        vec![Target::new(version, host.platform, host.arch)]
    } else {
        declared
            .iter()
            .map(|raw| {
                Target::parse_with_host(raw, host)
                    .with_context(|| format!("invalid target `{}`", raw))
            })
            .collect::<Result<Vec<_>>>()?
    };

    if let Some(version) = &args.node_version {
        let version = normalize_version(version);
        targets = targets
            .iter()
            .map(|t| t.with_runtime_version(version.clone()))
            .collect();
    }

    Ok(targets)
}

/// `--sea` / `--no-sea` override the configured mode.
pub fn forced_mode(args: &StrategyArgs, config: &Config) -> Result<Option<BuildMode>> {
    if args.sea {
        Ok(Some(BuildMode::Native))
    } else if args.no_sea {
        Ok(Some(BuildMode::Legacy))
    } else {
        config.mode()
    }
}

pub fn project_traits(args: &StrategyArgs) -> ProjectTraits {
    ProjectTraits {
        cross_compile: args.cross_compile,
        has_complex_dynamic_loading: args.complex_loading,
        has_assets: false,
    }
}

/// Assets from the command line, else from config.
pub fn assets(args: &StrategyArgs, config: &Config) -> Vec<String> {
    if args.assets.is_empty() {
        config.build.assets.clone()
    } else {
        args.assets.clone()
    }
}

/// Cache directory, mirror and offline flag with CLI > config > default.
pub fn resolver_config(
    args: &RuntimeArgs,
    config: &Config,
    default_cache: PathBuf,
) -> Result<seapack::sources::ResolverConfig> {
    let cache_dir = args
        .cache_dir
        .clone()
        .or_else(|| config.cache.dir.clone())
        .unwrap_or(default_cache);

    let mut resolver = seapack::sources::ResolverConfig::new(cache_dir)?
        .with_offline(args.offline || config.net.offline);
    if let Some(mirror) = args.mirror.as_ref().or(config.net.mirror.as_ref()) {
        resolver = resolver.with_mirror(mirror)?;
    }
    Ok(resolver)
}
