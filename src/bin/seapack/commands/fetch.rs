//! `seapack fetch` command
//!
//! Resolves a runtime binary into the cache, downloading it or falling back
//! to the legacy toolchain's base binaries.

use anyhow::{Context, Result};

use seapack::core::target::Target;
use seapack::sources::{ExtendedVersionResolver, PkgFetchCli, ReqwestClient};
use seapack::util::hash::sha256_file;
use seapack::util::shell::Status;
use seapack::util::{GlobalContext, Shell, SystemToolRunner};

use super::{detect_host, resolver_config};
use crate::cli::FetchArgs;

pub fn execute(args: FetchArgs, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();
    let runner = SystemToolRunner::new();

    let (host, _) = detect_host(&runner, config.tools.node())?;
    let target = Target::parse_with_host(&args.target, &host)
        .with_context(|| format!("invalid target `{}`", args.target))?;

    let http = ReqwestClient::new()?;
    let fetcher = PkgFetchCli::new(&runner, config.tools.legacy_fetcher());
    let resolver = ExtendedVersionResolver::new(
        resolver_config(&args.runtime, &config, ctx.default_cache_dir())?,
        &http,
        &fetcher,
    )?;

    shell.status(Status::Fetching, &target);
    let resolved = resolver.resolve(target.runtime_version(), target.platform(), target.arch())?;
    if let Some(warning) = &resolved.compatibility_warning {
        shell.warn(warning);
    }
    let digest = sha256_file(&resolved.path)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "runtime-fetched",
            "target": target.to_string(),
            "path": resolved.path,
            "sha256": digest,
            "compatibility_mode": resolved.compatibility_warning.is_some(),
        }));
    } else {
        shell.print(resolved.path.display());
        shell.status(Status::Finished, format!("sha256 {}", digest));
    }
    Ok(())
}
