//! seapack CLI - Package Node.js applications into standalone executables

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use seapack::core::error::PackError;
use seapack::core::target::TargetParseError;
use seapack::util::diagnostic::{emit, suggestions};
use seapack::util::process::ToolError;
use seapack::util::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use commands::CliError;

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("seapack=debug")
    } else if cli.quiet {
        EnvFilter::new("seapack=error")
    } else {
        EnvFilter::new("seapack=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    );

    if let Err(e) = run(cli, &shell) {
        report_error(&e, &shell);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: &Shell) -> Result<()> {
    let verbose = cli.verbose;

    // Execute command
    match cli.command {
        Commands::Build(args) => commands::build::execute(args, shell),
        Commands::Explain(args) => commands::explain::execute(args, shell),
        Commands::Targets => commands::targets::execute(shell),
        Commands::Fetch(args) => commands::fetch::execute(args, shell),
        Commands::Doctor => commands::doctor::execute(shell, verbose),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report_error(e: &anyhow::Error, shell: &Shell) {
    if shell.is_json() {
        shell.error(format!("{:#}", e));
        return;
    }

    if let Some(pack) = e.downcast_ref::<PackError>() {
        emit(&pack.to_diagnostic(), shell.use_color());
        return;
    }

    eprintln!("error: {:#}", e);
    if let Some(hint) = hint_for(e) {
        eprintln!("{}", hint);
    }
}

fn hint_for(e: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli) = e.downcast_ref::<CliError>() {
        return Some(cli.hint());
    }
    if e.downcast_ref::<TargetParseError>().is_some() {
        return Some(suggestions::BAD_TARGET);
    }
    match e.downcast_ref::<ToolError>() {
        Some(tool) if tool.is_not_found() => Some(suggestions::TOOL_MISSING),
        _ => None,
    }
}
