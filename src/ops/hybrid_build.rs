//! Multi-target build orchestration.
//!
//! Every target gets its own strategy decision and is then packaged either
//! by the native assembler or by the legacy packager. Targets are processed
//! in declaration order and a failing target never stops its siblings.
//! Invalid or repeated targets are reported as failures without packaging.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::builder::events::BuildEvent;
use crate::builder::native::{NativeAssembler, NativeBuildOptions};
use crate::core::capability::parse_major;
use crate::core::decision::{decide, BuildDecision, BuildMode, ProjectTraits};
use crate::core::error::PackError;
use crate::core::host::HostInfo;
use crate::core::result::BuildResult;
use crate::core::target::{Platform, Target};
use crate::core::validate::validate;
use crate::ops::legacy::{LegacyPackager, LegacyRequest};
use crate::sources::runtime::{FALLBACK_TABLE, LEGACY_TABLE};

/// Options for a hybrid build.
#[derive(Debug, Clone)]
pub struct HybridOptions {
    pub entrypoint: PathBuf,
    /// Output path; suffixed per target when there are several.
    pub output: PathBuf,
    pub targets: Vec<Target>,
    /// Declared traits. `cross_compile` is additionally derived per target.
    pub traits: ProjectTraits,
    pub forced_mode: Option<BuildMode>,
    pub assets: Vec<String>,
    pub use_snapshot: bool,
    pub use_code_cache: bool,
    pub sign_binary: bool,
    pub project_root: Option<PathBuf>,
}

impl HybridOptions {
    pub fn new(entrypoint: impl Into<PathBuf>, output: impl Into<PathBuf>, targets: Vec<Target>) -> Self {
        HybridOptions {
            entrypoint: entrypoint.into(),
            output: output.into(),
            targets,
            traits: ProjectTraits::default(),
            forced_mode: None,
            assets: Vec::new(),
            use_snapshot: false,
            use_code_cache: true,
            sign_binary: false,
            project_root: None,
        }
    }
}

/// What happened to one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub target: Target,
    /// The strategy that ran.
    pub mode: BuildMode,
    pub decision: BuildDecision,
    pub result: BuildResult,
    /// Where the binary was (or would have been) written.
    pub output_path: PathBuf,
}

/// Targets packaged per strategy. Rejected targets count toward neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrategySummary {
    pub native: usize,
    pub legacy: usize,
}

/// Aggregate result of a hybrid build.
#[derive(Debug, Clone, Serialize)]
pub struct HybridReport {
    /// True only when every target succeeded.
    pub success: bool,
    pub results: Vec<TargetOutcome>,
    pub total_time_ms: u64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub summary: StrategySummary,
}

type Observer<'a> = Box<dyn Fn(&BuildEvent) + 'a>;

/// Drives decisions and packaging for a list of targets.
pub struct HybridBuilder<'a> {
    host: HostInfo,
    native: Option<&'a NativeAssembler<'a>>,
    legacy: &'a dyn LegacyPackager,
    observer: Option<Observer<'a>>,
}

impl<'a> HybridBuilder<'a> {
    pub fn new(host: HostInfo, legacy: &'a dyn LegacyPackager) -> Self {
        HybridBuilder {
            host,
            native: None,
            legacy,
            observer: None,
        }
    }

    /// Enable native builds. Without an assembler (no host runtime), targets
    /// that decide on native fail with an explanatory error.
    pub fn with_native(mut self, native: &'a NativeAssembler<'a>) -> Self {
        self.native = Some(native);
        self
    }

    /// Receive a [`BuildEvent`] at every milestone.
    pub fn with_observer(mut self, observer: impl Fn(&BuildEvent) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&self, event: BuildEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }

    /// Decide a strategy for every target without building anything.
    pub fn plan(&self, opts: &HybridOptions) -> Vec<BuildDecision> {
        opts.targets
            .iter()
            .map(|target| decide(target, &self.traits_for(target, opts), opts.forced_mode))
            .collect()
    }

    fn traits_for(&self, target: &Target, opts: &HybridOptions) -> ProjectTraits {
        ProjectTraits {
            cross_compile: opts.traits.cross_compile || !target.is_host(&self.host),
            has_assets: opts.traits.has_assets || !opts.assets.is_empty(),
            ..opts.traits
        }
    }

    pub fn build(&self, opts: &HybridOptions) -> HybridReport {
        let start = Instant::now();
        let outputs = output_paths(&opts.output, &opts.targets);
        let decisions = self.plan(opts);
        let total = opts.targets.len();

        let mut results = Vec::with_capacity(total);
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut summary = StrategySummary::default();

        let mut seen = HashSet::new();
        for (index, (decision, output)) in decisions.into_iter().zip(outputs).enumerate() {
            let target = decision.target.clone();
            let rejection = if !seen.insert(target.clone()) {
                Some(format!("{} is listed more than once", target))
            } else {
                let validation = validate(&target);
                (!validation.valid).then(|| validation.reason.unwrap_or_default())
            };

            let mode = decision.effective_mode();
            if rejection.is_none() && mode != decision.mode {
                let warning = format!(
                    "{}: native mode was forced but is unavailable; using legacy bundling",
                    target
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }

            tracing::info!("{}: {} ({})", target, mode, decision.reason);
            self.emit(BuildEvent::decided(&decision, index + 1, total));

            // Rejected targets never reach a packager.
            let result = match (rejection, mode) {
                (Some(reason), _) => {
                    tracing::warn!("{}: skipped: {}", target, reason);
                    BuildResult::failed(PackError::Validation { reason }.to_string(), 0, Vec::new())
                }
                (None, BuildMode::Native) => {
                    summary.native += 1;
                    self.build_native(&target, &output, opts)
                }
                (None, BuildMode::Legacy) => {
                    summary.legacy += 1;
                    self.build_legacy(&target, &output, opts)
                }
            };

            self.emit(BuildEvent::finished_target(target.to_string(), mode, &result));
            warnings.extend(result.warnings.iter().map(|w| format!("{}: {}", target, w)));
            errors.extend(result.errors.iter().map(|e| format!("{}: {}", target, e)));

            results.push(TargetOutcome {
                target,
                mode,
                decision,
                result,
                output_path: output,
            });
        }

        tracing::info!(
            "strategy summary: {} native, {} legacy",
            summary.native,
            summary.legacy
        );

        let success = results.iter().all(|o| o.result.success);
        let total_time_ms = start.elapsed().as_millis() as u64;
        self.emit(BuildEvent::finished(
            success,
            total_time_ms,
            summary.native,
            summary.legacy,
        ));

        HybridReport {
            success,
            results,
            total_time_ms,
            warnings,
            errors,
            summary,
        }
    }

    fn build_native(&self, target: &Target, output: &Path, opts: &HybridOptions) -> BuildResult {
        let Some(native) = self.native else {
            return BuildResult::failed(
                "native build requires a Node.js runtime on this machine, but none was found",
                0,
                Vec::new(),
            );
        };

        let native_opts = NativeBuildOptions {
            entrypoint: opts.entrypoint.clone(),
            output: output.to_path_buf(),
            target: target.clone(),
            assets: opts.assets.clone(),
            use_snapshot: opts.use_snapshot,
            use_code_cache: opts.use_code_cache,
            sign_binary: opts.sign_binary,
            project_root: opts.project_root.clone(),
        };
        native.assemble(&native_opts)
    }

    fn build_legacy(&self, target: &Target, output: &Path, opts: &HybridOptions) -> BuildResult {
        let (legacy_target, warning) = legacy_target_for(target);
        let request = LegacyRequest {
            entrypoint: opts.entrypoint.clone(),
            output: output.to_path_buf(),
            target: legacy_target,
            assets: opts.assets.clone(),
        };

        let mut result = match self.legacy.package(&request) {
            Ok(result) => result,
            Err(e) => BuildResult::failed(format!("{:#}", e), 0, Vec::new()),
        };
        if let Some(warning) = warning {
            tracing::warn!("{}", warning);
            result.warnings.insert(0, warning);
        }
        result
    }
}

/// The target handed to the legacy packager. Versions the legacy toolchain
/// does not ship are replaced by their fallback.
pub fn legacy_target_for(target: &Target) -> (Target, Option<String>) {
    let Some(major) = parse_major(target.runtime_version()) else {
        return (target.clone(), None);
    };
    if LEGACY_TABLE.contains(&major) {
        return (target.with_runtime_version(format!("node{}", major)), None);
    }

    match FALLBACK_TABLE.iter().find(|(from, _)| *from == major) {
        Some((_, to)) => (
            target.with_runtime_version(format!("node{}", to)),
            Some(format!(
                "legacy bundling has no node{} base; packaging with node{} in compatibility mode",
                major, to
            )),
        ),
        None => (target.clone(), None),
    }
}

/// Output path per target. A single target uses `output` as given; several
/// targets get `<output>-<suffix>`, the suffix holding only the components
/// that differ across targets. Windows outputs end in `.exe`.
pub fn output_paths(output: &Path, targets: &[Target]) -> Vec<PathBuf> {
    if targets.len() == 1 {
        return vec![with_exe_suffix(output.to_path_buf(), targets[0].platform())];
    }

    let varies = |f: &dyn Fn(&Target) -> String| {
        targets.iter().map(f).collect::<std::collections::BTreeSet<_>>().len() > 1
    };
    let vary_version = varies(&|t: &Target| t.runtime_version().to_string());
    let vary_platform = varies(&|t: &Target| t.platform().to_string());
    let vary_arch = varies(&|t: &Target| t.arch().to_string());

    let base = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());

    targets
        .iter()
        .map(|target| {
            let mut parts = Vec::new();
            if vary_version {
                parts.push(target.runtime_version().to_string());
            }
            if vary_platform {
                parts.push(target.platform().to_string());
            }
            if vary_arch {
                parts.push(target.arch().to_string());
            }
            let suffix = if parts.is_empty() {
                target.to_string()
            } else {
                parts.join("-")
            };
            let path = output.with_file_name(format!("{}-{}", base, suffix));
            with_exe_suffix(path, target.platform())
        })
        .collect()
}

fn with_exe_suffix(path: PathBuf, platform: Platform) -> PathBuf {
    let suffix = platform.exe_suffix();
    if suffix.is_empty() || path.to_string_lossy().ends_with(suffix) {
        return path;
    }
    let mut name = path.into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::core::host::HostRuntime;
    use crate::core::target::Arch;
    use crate::test_support::{FakeLegacyPackager, MockExecutor, MockProcessOutput, SeaProject};

    fn host() -> HostInfo {
        HostInfo::new(Platform::Linux, Arch::X64).with_runtime_major(22)
    }

    fn targets(list: &[&str]) -> Vec<Target> {
        list.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn assembler<'a>(exec: &'a MockExecutor, project: &SeaProject) -> NativeAssembler<'a> {
        let runtime = HostRuntime::new(project.fake_node("node"), semver::Version::new(22, 3, 0));
        NativeAssembler::new(exec, host(), runtime).with_temp_root(project.temp_root())
    }

    #[test]
    fn test_mixed_targets() {
        let project = SeaProject::new();
        let exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));
        let native = assembler(&exec, &project);
        let legacy = FakeLegacyPackager::new();

        let opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("dist/app"),
            targets(&["node22-linux-x64", "node18-linux-x64", "node22-macos-arm64"]),
        );
        let report = HybridBuilder::new(host(), &legacy)
            .with_native(&native)
            .build(&opts);

        assert!(report.success, "{:?}", report.errors);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary, StrategySummary { native: 1, legacy: 2 });
        assert_eq!(report.results[0].mode, BuildMode::Native);
        assert_eq!(report.results[1].mode, BuildMode::Legacy);
        assert!(report.results[2].decision.reason.contains("cross-compile"));
        assert!(report.results[0]
            .output_path
            .ends_with("dist/app-node22-linux-x64"));
        assert!(report.results[0].output_path.is_file());
        assert_eq!(legacy.requests().len(), 2);
    }

    #[test]
    fn test_failure_does_not_abort_siblings() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new()
            .error_on("node18-linux-x64")
            .fail_on("node20-linux-x64");

        let opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("dist/app"),
            targets(&["node18-linux-x64", "node20-linux-x64", "node22-linux-arm64"]),
        );
        let report = HybridBuilder::new(host(), &legacy).build(&opts);

        assert!(!report.success);
        assert_eq!(report.results.len(), 3);
        assert!(!report.results[0].result.success);
        assert!(!report.results[1].result.success);
        assert!(report.results[2].result.success);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("node18-linux-x64: "));
        assert!(report.errors[0].contains("crashed"));
    }

    #[test]
    fn test_forced_native_without_support_uses_legacy() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new();
        let mut opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("app"),
            targets(&["node18-linux-x64"]),
        );
        opts.forced_mode = Some(BuildMode::Native);

        let report = HybridBuilder::new(host(), &legacy).build(&opts);
        assert!(report.success);
        assert_eq!(report.results[0].mode, BuildMode::Legacy);
        assert_eq!(report.results[0].decision.mode, BuildMode::Native);
        assert!(report.warnings[0].contains("native mode was forced"));
    }

    #[test]
    fn test_invalid_targets_never_reach_a_packager() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new();
        let mut opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("dist/app"),
            targets(&["node8-linux-x64", "node22-linux-x86", "node18-linux-x64"]),
        );
        opts.forced_mode = Some(BuildMode::Native);

        let report = HybridBuilder::new(host(), &legacy).build(&opts);

        assert!(!report.success);
        assert_eq!(report.results.len(), 3);
        assert!(!report.results[0].result.success);
        assert!(!report.results[1].result.success);
        assert!(report.results[2].result.success);
        assert!(report.errors[0].starts_with("node8-linux-x64: invalid target"));
        assert!(report.errors[1].contains("architecture `x86` is not supported"));
        assert_eq!(report.summary, StrategySummary { native: 0, legacy: 1 });
        assert!(report.warnings.iter().all(|w| !w.starts_with("node8-linux-x64")));

        let requested: Vec<String> = legacy.requests().iter().map(|r| r.target.to_string()).collect();
        assert_eq!(requested, vec!["node18-linux-x64"]);
    }

    #[test]
    fn test_duplicate_target_is_built_once() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new();
        let opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("dist/app"),
            targets(&["node20-linux-x64", "node20-macos-x64", "node20-linux-x64"]),
        );

        let report = HybridBuilder::new(host(), &legacy).build(&opts);

        assert!(!report.success);
        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].result.success);
        assert!(report.results[1].result.success);
        assert!(!report.results[2].result.success);
        assert!(report.errors[0].contains("listed more than once"));
        assert_eq!(legacy.requests().len(), 2);
    }

    #[test]
    fn test_native_without_host_runtime_fails_gracefully() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new();
        let opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("app"),
            targets(&["node22-linux-x64"]),
        );

        let report = HybridBuilder::new(host(), &legacy).build(&opts);
        assert!(!report.success);
        assert_eq!(report.results.len(), 1);
        assert!(report.errors[0].contains("none was found"));
        assert!(legacy.requests().is_empty());
    }

    #[test]
    fn test_extended_version_maps_to_legacy_fallback() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new();
        let opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("app"),
            targets(&["node24-windows-x64"]),
        );

        let report = HybridBuilder::new(host(), &legacy).build(&opts);
        assert!(report.success);
        let requests = legacy.requests();
        assert_eq!(requests[0].target.to_string(), "node22-windows-x64");
        assert!(requests[0].output.ends_with("app.exe"));
        assert!(report.warnings[0].contains("compatibility mode"));
    }

    #[test]
    fn test_observer_sees_every_milestone() {
        let project = SeaProject::new();
        let legacy = FakeLegacyPackager::new();
        let opts = HybridOptions::new(
            project.entrypoint(),
            project.root().join("app"),
            targets(&["node18-linux-x64", "node20-macos-x64"]),
        );

        let events = RefCell::new(Vec::new());
        HybridBuilder::new(host(), &legacy)
            .with_observer(|e| events.borrow_mut().push(e.clone()))
            .build(&opts);

        let events = events.into_inner();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], BuildEvent::TargetDecided { index: 1, total: 2, .. }));
        assert!(matches!(events[1], BuildEvent::TargetFinished { success: true, .. }));
        assert!(matches!(
            events[4],
            BuildEvent::BuildFinished { success: true, native_count: 0, legacy_count: 2, .. }
        ));
    }

    #[test]
    fn test_output_paths_single_target() {
        let paths = output_paths(Path::new("dist/app"), &targets(&["node22-windows-x64"]));
        assert_eq!(paths, vec![PathBuf::from("dist/app.exe")]);

        let paths = output_paths(Path::new("dist/app.exe"), &targets(&["node22-windows-x64"]));
        assert_eq!(paths, vec![PathBuf::from("dist/app.exe")]);
    }

    #[test]
    fn test_output_paths_only_differing_components() {
        let paths = output_paths(
            Path::new("dist/app"),
            &targets(&["node22-linux-x64", "node22-macos-x64", "node22-windows-x64"]),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("dist/app-linux"),
                PathBuf::from("dist/app-macos"),
                PathBuf::from("dist/app-windows.exe"),
            ]
        );

        let paths = output_paths(
            Path::new("app"),
            &targets(&["node20-linux-x64", "node22-linux-arm64"]),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("app-node20-x64"),
                PathBuf::from("app-node22-arm64"),
            ]
        );
    }

    #[test]
    fn test_legacy_target_for() {
        let (t, w) = legacy_target_for(&"node20-linux-x64".parse().unwrap());
        assert_eq!(t.to_string(), "node20-linux-x64");
        assert!(w.is_none());

        let (t, w) = legacy_target_for(&"latest-macos-arm64".parse().unwrap());
        assert_eq!(t.to_string(), "node22-macos-arm64");
        assert!(w.unwrap().contains("node25"));

        let (t, _) = legacy_target_for(&"node8-linux-x64".parse().unwrap());
        assert_eq!(t.to_string(), "node8-linux-x64");
    }
}
