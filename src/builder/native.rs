//! Native single-executable assembly.
//!
//! Turns an entrypoint script into a standalone binary by preparing a SEA
//! blob with the host runtime and injecting it into a copy of the target
//! runtime. All intermediate files live in one temporary directory that is
//! removed whether or not the assembly succeeds.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};

use crate::builder::sea_config::{convert_assets, SeaConfig, BLOB_FILE, SEA_CONFIG_FILE};
use crate::builder::signing::{remove_signature, sign, SigningTools};
use crate::core::capability::{native_capabilities_of, parse_major};
use crate::core::error::PackError;
use crate::core::host::{HostInfo, HostRuntime};
use crate::core::result::BuildResult;
use crate::core::target::{Platform, Target};
use crate::sources::runtime::ExtendedVersionResolver;
use crate::util::fs::{make_executable, move_file, normalize_path, remove_dir_all_if_exists};
use crate::util::process::ToolRunner;

/// Resource name the runtime looks up at startup.
pub const SEA_RESOURCE_NAME: &str = "NODE_SEA_BLOB";

/// Fuse flipped by the injector so the runtime knows a blob is present.
pub const SEA_SENTINEL_FUSE: &str = "NODE_SEA_FUSE_fce680ab2cc467b6e072b8b5df1996b2";

/// Mach-O segment holding the blob on macOS.
pub const MACHO_SEGMENT_NAME: &str = "NODE_SEA";

/// External tools used by the pipeline besides the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTools {
    pub postject: String,
    pub signing: SigningTools,
}

impl Default for NativeTools {
    fn default() -> Self {
        NativeTools {
            postject: "postject".to_string(),
            signing: SigningTools::default(),
        }
    }
}

/// Inputs for one native assembly.
#[derive(Debug, Clone)]
pub struct NativeBuildOptions {
    pub entrypoint: PathBuf,
    pub output: PathBuf,
    pub target: Target,
    /// Asset declarations: files, directories or glob patterns.
    pub assets: Vec<String>,
    pub use_snapshot: bool,
    pub use_code_cache: bool,
    pub sign_binary: bool,
    /// Base for asset keys. Defaults to the entrypoint's directory.
    pub project_root: Option<PathBuf>,
}

impl NativeBuildOptions {
    pub fn new(entrypoint: impl Into<PathBuf>, output: impl Into<PathBuf>, target: Target) -> Self {
        NativeBuildOptions {
            entrypoint: entrypoint.into(),
            output: output.into(),
            target,
            assets: Vec::new(),
            use_snapshot: false,
            use_code_cache: true,
            sign_binary: false,
            project_root: None,
        }
    }

    fn project_root(&self) -> PathBuf {
        match &self.project_root {
            Some(root) => root.clone(),
            None => self
                .entrypoint
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Drives the native pipeline for one target at a time.
pub struct NativeAssembler<'a> {
    runner: &'a dyn ToolRunner,
    /// Platform and arch of this machine.
    host_info: HostInfo,
    host: HostRuntime,
    resolver: Option<&'a ExtendedVersionResolver<'a>>,
    tools: NativeTools,
    temp_root: Option<PathBuf>,
}

impl<'a> NativeAssembler<'a> {
    pub fn new(runner: &'a dyn ToolRunner, host_info: HostInfo, host: HostRuntime) -> Self {
        NativeAssembler {
            runner,
            host_info,
            host,
            resolver: None,
            tools: NativeTools::default(),
            temp_root: None,
        }
    }

    /// Use `resolver` for targets the host runtime binary cannot serve:
    /// another major, another platform or another arch.
    pub fn with_resolver(mut self, resolver: &'a ExtendedVersionResolver<'a>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_tools(mut self, tools: NativeTools) -> Self {
        self.tools = tools;
        self
    }

    /// Create temporary directories under `root` instead of the system default.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn host(&self) -> &HostRuntime {
        &self.host
    }

    /// Assemble a single executable. Never panics or returns early without
    /// removing its temporary directory; failures land in the result.
    pub fn assemble(&self, opts: &NativeBuildOptions) -> BuildResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let outcome = match self.create_temp_dir() {
            Ok(work) => {
                let work_path = work.path().to_path_buf();
                let outcome = self.run_steps(opts, &work_path, &mut warnings);
                if let Err(e) = work.close() {
                    tracing::debug!("temp dir close failed: {}", e);
                    if let Err(e) = remove_dir_all_if_exists(&work_path) {
                        tracing::warn!("failed to remove {}: {:#}", work_path.display(), e);
                    }
                }
                outcome
            }
            Err(e) => Err(e),
        };

        let elapsed = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(size) => {
                tracing::info!(
                    "built {} ({} bytes) in {}ms",
                    opts.output.display(),
                    size,
                    elapsed
                );
                BuildResult::succeeded(&opts.output, size, elapsed, warnings)
            }
            Err(e) => {
                tracing::debug!("native assembly of {} failed: {:#}", opts.target, e);
                BuildResult::failed(format!("{:#}", e), elapsed, warnings)
            }
        }
    }

    fn create_temp_dir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("seapack-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.context("failed to create temporary build directory")
    }

    fn run_steps(
        &self,
        opts: &NativeBuildOptions,
        work: &Path,
        warnings: &mut Vec<String>,
    ) -> Result<u64> {
        let target = &opts.target;
        let platform = target.platform();

        // 1. capability recheck
        let caps = native_capabilities_of(target.runtime_version());
        if !caps.has_native {
            return Err(PackError::Capability {
                version: target.runtime_version().to_string(),
            }
            .into());
        }
        if !opts.entrypoint.is_file() {
            bail!("entrypoint `{}` does not exist", opts.entrypoint.display());
        }

        // 2. config emission
        tracing::info!("preparing SEA config for {}", target);
        let blob = work.join(BLOB_FILE);
        let config_path = work.join(SEA_CONFIG_FILE);

        let assets = if opts.assets.is_empty() {
            None
        } else if caps.supports_assets {
            Some(convert_assets(&opts.project_root(), &opts.assets))
        } else {
            push_warning(
                warnings,
                format!(
                    "{} cannot embed assets; {} declared asset(s) ignored",
                    target.runtime_version(),
                    opts.assets.len()
                ),
            );
            None
        };

        let use_snapshot = opts.use_snapshot && caps.supports_snapshot;
        if opts.use_snapshot && !use_snapshot {
            push_warning(
                warnings,
                format!("{} does not support startup snapshots", target.runtime_version()),
            );
        }
        let use_code_cache = opts.use_code_cache && caps.supports_code_cache;

        SeaConfig {
            main: normalize_path(&opts.entrypoint),
            output: blob.clone(),
            disable_experimental_warning: true,
            use_snapshot,
            use_code_cache,
            assets,
        }
        .write(&config_path)?;

        // 3. blob generation
        tracing::info!("generating preparation blob");
        let node = self.host.path.to_string_lossy().into_owned();
        let args = vec![
            "--experimental-sea-config".to_string(),
            config_path.to_string_lossy().into_owned(),
        ];
        let output = self.runner.run(&node, &args)?;
        if !output.success() {
            return Err(PackError::external_tool(&node, &output).into());
        }

        // 4. runtime binary
        let binary = work.join(platform.exe_name("node"));
        let source = self.runtime_source(target, warnings)?;
        tracing::info!("copying runtime from {}", source.display());
        fs::copy(&source, &binary).with_context(|| {
            format!("failed to copy runtime {} to {}", source.display(), binary.display())
        })?;
        make_executable(&binary)
            .with_context(|| format!("failed to mark {} executable", binary.display()))?;

        // 5. signature removal
        let removal = remove_signature(self.runner, &self.tools.signing, platform, &binary)?;
        if let Some(w) = removal.warning("signature removal") {
            push_warning(warnings, w);
        }

        // 6. injection
        tracing::info!("injecting blob into {}", binary.display());
        let args = injection_args(&binary, &blob, platform);
        let output = self.runner.run(&self.tools.postject, &args)?;
        if !output.success() {
            return Err(PackError::external_tool(&self.tools.postject, &output).into());
        }

        // 7. re-signing
        if opts.sign_binary {
            let outcome = sign(self.runner, &self.tools.signing, platform, &binary);
            if let Some(w) = outcome.warning("re-signing") {
                push_warning(warnings, w);
            }
        }

        // 8. relocation
        move_file(&binary, &opts.output)?;

        // 9. measurement
        let size = fs::metadata(&opts.output)
            .with_context(|| format!("failed to stat {}", opts.output.display()))?
            .len();
        Ok(size)
    }

    fn runtime_source(&self, target: &Target, warnings: &mut Vec<String>) -> Result<PathBuf> {
        let major = parse_major(target.runtime_version())
            .ok_or_else(|| anyhow!("unrecognised runtime version `{}`", target.runtime_version()))?;

        if major == self.host.major() && target.is_host(&self.host_info) {
            return Ok(self.host.path.clone());
        }

        let Some(resolver) = self.resolver else {
            bail!(
                "{} needs a runtime other than the host's node{}-{}-{} and no runtime resolver is configured",
                target,
                self.host.major(),
                self.host_info.platform,
                self.host_info.arch
            );
        };

        let resolved = resolver.resolve(target.runtime_version(), target.platform(), target.arch())?;
        if let Some(w) = resolved.compatibility_warning {
            warnings.push(w);
        }
        Ok(resolved.path)
    }
}

fn push_warning(warnings: &mut Vec<String>, warning: String) {
    tracing::warn!("{}", warning);
    warnings.push(warning);
}

/// Arguments for `postject`.
pub fn injection_args(binary: &Path, blob: &Path, platform: Platform) -> Vec<String> {
    let mut args = vec![
        binary.to_string_lossy().into_owned(),
        SEA_RESOURCE_NAME.to_string(),
        blob.to_string_lossy().into_owned(),
        "--sentinel-fuse".to_string(),
        SEA_SENTINEL_FUSE.to_string(),
    ];
    if platform == Platform::Macos {
        args.push("--macho-segment-name".to_string());
        args.push(MACHO_SEGMENT_NAME.to_string());
    }
    args
}
