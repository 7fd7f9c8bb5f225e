//! `seapack doctor` command

use anyhow::Result;

use seapack::core::host::HostInfo;
use seapack::ops::{doctor, format_report, DoctorOptions};
use seapack::util::{GlobalContext, Shell, SystemToolRunner};

pub fn execute(shell: &Shell, verbose: bool) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let config = ctx.load_config();

    let options = DoctorOptions {
        tools: config.tools.clone(),
        cache_dir: Some(config.cache.dir.clone().unwrap_or_else(|| ctx.default_cache_dir())),
    };

    let host = HostInfo::detect();
    let report = doctor(&SystemToolRunner::new(), host.as_ref(), &options);

    // Print the formatted report
    shell.print(format_report(&report, verbose));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
