//! `seapack build` command

use std::path::PathBuf;

use anyhow::Result;

use seapack::builder::native::NativeAssembler;
use seapack::builder::BuildEvent;
use seapack::ops::hybrid_build::{HybridBuilder, HybridOptions};
use seapack::ops::legacy::PkgCli;
use seapack::sources::{ExtendedVersionResolver, PkgFetchCli, ReqwestClient};
use seapack::util::shell::{format_millis, Status};
use seapack::util::{GlobalContext, Shell, SystemToolRunner};

use super::{assets, detect_host, forced_mode, project_traits, resolve_targets, resolver_config, CliError};
use crate::cli::BuildArgs;

pub fn execute(args: BuildArgs, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();
    let runner = SystemToolRunner::new();

    if !args.entry.is_file() {
        return Err(CliError::MissingEntrypoint(args.entry).into());
    }

    let (host, host_runtime) = detect_host(&runner, config.tools.node())?;
    let targets = resolve_targets(&args.strategy, &config, &host)?;

    let output = args.output.clone().unwrap_or_else(|| default_output(&args.entry));
    let mut opts = HybridOptions::new(&args.entry, output, targets);
    opts.traits = project_traits(&args.strategy);
    opts.forced_mode = forced_mode(&args.strategy, &config)?;
    opts.assets = assets(&args.strategy, &config);
    opts.use_snapshot = args.snapshot || config.build.snapshot.unwrap_or(false);
    opts.use_code_cache = !args.no_code_cache && config.build.code_cache.unwrap_or(true);
    opts.sign_binary = args.sign || config.build.sign.unwrap_or(false);
    opts.project_root = Some(ctx.cwd().to_path_buf());

    // Collaborators for runtime resolution and both pipelines
    let http = ReqwestClient::new()?;
    let fetcher = PkgFetchCli::new(&runner, config.tools.legacy_fetcher());
    let resolver = ExtendedVersionResolver::new(
        resolver_config(&args.runtime, &config, ctx.default_cache_dir())?,
        &http,
        &fetcher,
    )?;
    let legacy = PkgCli::new(&runner, config.tools.legacy_packager());

    let native = host_runtime.map(|runtime| {
        NativeAssembler::new(&runner, host.clone(), runtime)
            .with_resolver(&resolver)
            .with_tools(config.tools.native())
    });
    if native.is_none() {
        shell.warn("no Node.js runtime found; native targets will fail");
    }

    shell.start_progress(opts.targets.len() as u64, "packaging");
    let mut builder = HybridBuilder::new(host, &legacy).with_observer(|event| on_event(shell, event));
    if let Some(native) = &native {
        builder = builder.with_native(native);
    }

    let report = builder.build(&opts);
    shell.finish_progress();

    for warning in &report.warnings {
        shell.warn(warning);
    }
    for error in &report.errors {
        shell.status(Status::Failed, error);
    }

    if !report.success {
        let failed = report.results.iter().filter(|r| !r.result.success).count();
        return Err(CliError::BuildFailed {
            failed,
            total: report.results.len(),
        }
        .into());
    }

    shell.status(
        Status::Finished,
        format!(
            "{} target(s) ({} native, {} legacy) in {}",
            report.results.len(),
            report.summary.native,
            report.summary.legacy,
            format_millis(report.total_time_ms)
        ),
    );
    Ok(())
}

fn on_event(shell: &Shell, event: &BuildEvent) {
    shell.json_event(event);

    match event {
        BuildEvent::TargetDecided {
            target,
            mode,
            explanation,
            ..
        } => {
            shell.status(Status::Decided, format!("{} -> {} ({})", target, mode, explanation));
            shell.status(Status::Packaging, target);
        }
        BuildEvent::TargetFinished {
            target,
            success,
            output_path,
            size_bytes,
            duration_ms,
            ..
        } => {
            shell.advance(target);
            if *success {
                let path = output_path.as_deref().unwrap_or_else(|| std::path::Path::new(""));
                shell.status(
                    Status::Packaged,
                    format!(
                        "{} -> {} ({} bytes, {})",
                        target,
                        path.display(),
                        size_bytes,
                        format_millis(*duration_ms)
                    ),
                );
            }
        }
        BuildEvent::BuildFinished { .. } => {}
    }
}

/// `app.js` packages to `./app` by default.
fn default_output(entry: &std::path::Path) -> PathBuf {
    let stem = entry
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());
    PathBuf::from(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(default_output(std::path::Path::new("src/server.js")), PathBuf::from("server"));
        assert_eq!(default_output(std::path::Path::new("main.mjs")), PathBuf::from("main"));
    }
}
