//! `seapack explain` command
//!
//! Prints the strategy every target would use and why, without building.

use anyhow::Result;

use seapack::ops::explain::format_plan;
use seapack::ops::hybrid_build::{HybridBuilder, HybridOptions};
use seapack::ops::legacy::PkgCli;
use seapack::util::{GlobalContext, Shell, SystemToolRunner};

use super::{assets, detect_host, forced_mode, project_traits, resolve_targets};
use crate::cli::ExplainArgs;

pub fn execute(args: ExplainArgs, shell: &Shell) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();
    let runner = SystemToolRunner::new();

    let (host, _) = detect_host(&runner, config.tools.node())?;
    let targets = resolve_targets(&args.strategy, &config, &host)?;

    let mut opts = HybridOptions::new("", "", targets);
    opts.traits = project_traits(&args.strategy);
    opts.forced_mode = forced_mode(&args.strategy, &config)?;
    opts.assets = assets(&args.strategy, &config);

    // Planning never invokes the packager.
    let legacy = PkgCli::new(&runner, config.tools.legacy_packager());
    let decisions = HybridBuilder::new(host, &legacy).plan(&opts);

    if shell.is_json() {
        for decision in &decisions {
            shell.json_event(decision);
        }
    } else {
        shell.print(format_plan(&decisions));
    }
    Ok(())
}
