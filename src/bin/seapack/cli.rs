//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use seapack::util::ColorChoice;

/// seapack - Package Node.js applications into standalone executables
#[derive(Parser)]
#[command(name = "seapack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring of human-readable output
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Output format for build events
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package an application for one or more targets
    Build(BuildArgs),

    /// Show the strategy each target would use, without building
    Explain(ExplainArgs),

    /// List supported runtime versions, platforms and architectures
    Targets,

    /// Resolve a runtime binary into the local cache
    Fetch(FetchArgs),

    /// Check that the external tools are available
    Doctor,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Flags that influence the strategy decision.
#[derive(Args, Debug, Clone, Default)]
pub struct StrategyArgs {
    /// Targets such as `node22-linux-x64`; missing parts come from the host
    #[arg(short, long = "target", value_name = "TRIPLE")]
    pub targets: Vec<String>,

    /// Force the native single-executable pipeline
    #[arg(long, visible_alias = "force-native", conflicts_with = "no_sea")]
    pub sea: bool,

    /// Force the legacy bundler
    #[arg(long, visible_alias = "force-legacy")]
    pub no_sea: bool,

    /// Override the runtime version of every target (`22` or `node22`)
    #[arg(long, value_name = "VERSION")]
    pub node_version: Option<String>,

    /// Files or glob patterns to embed as assets
    #[arg(long = "asset", value_name = "PATH")]
    pub assets: Vec<String>,

    /// The application loads modules by computed path
    #[arg(long)]
    pub complex_loading: bool,

    /// Treat every target as a cross-compilation
    #[arg(long)]
    pub cross_compile: bool,
}

/// Where runtime binaries come from.
#[derive(Args, Debug, Clone, Default)]
pub struct RuntimeArgs {
    /// Runtime binary cache directory
    #[arg(long, env = "SEAPACK_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Never download runtimes
    #[arg(long)]
    pub offline: bool,

    /// Distribution mirror for runtime downloads
    #[arg(long, value_name = "URL")]
    pub mirror: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Application entry script
    pub entry: PathBuf,

    /// Output binary path (defaults to the entry file name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub strategy: StrategyArgs,

    /// Embed a startup snapshot (native builds)
    #[arg(long)]
    pub snapshot: bool,

    /// Do not embed a code cache (native builds)
    #[arg(long)]
    pub no_code_cache: bool,

    /// Re-sign binaries after injection
    #[arg(long)]
    pub sign: bool,

    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

#[derive(Args)]
pub struct ExplainArgs {
    #[command(flatten)]
    pub strategy: StrategyArgs,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Runtime to fetch, e.g. `node24` or `node22-linux-arm64`
    pub target: String,

    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
