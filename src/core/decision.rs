//! Build strategy selection.
//!
//! Decides per target whether to assemble a native single-executable binary
//! or hand the target to the legacy bundling packager. The decision is a pure
//! function of the target, the project traits and the user's forced mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::capability::{capability_of, native_capabilities_of, ASSETS_MIN_MAJOR};
use crate::core::target::Target;
use crate::core::validate::validate;

/// How a target gets packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// The runtime's own single-executable facility.
    Native,
    /// Full bundle of application and runtime.
    Legacy,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Native => "native",
            BuildMode::Legacy => "legacy",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an invalid mode selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid build mode '{0}', valid values: auto, native, legacy")]
pub struct BuildModeParseError(pub String);

impl FromStr for BuildMode {
    type Err = BuildModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" | "sea" => Ok(BuildMode::Native),
            "legacy" | "bundle" => Ok(BuildMode::Legacy),
            _ => Err(BuildModeParseError(s.to_string())),
        }
    }
}

/// Parse a user mode selection where `auto` means "no forced mode".
pub fn parse_mode_selection(s: &str) -> Result<Option<BuildMode>, BuildModeParseError> {
    if s.eq_ignore_ascii_case("auto") {
        Ok(None)
    } else {
        s.parse().map(Some)
    }
}

/// Project characteristics that constrain the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProjectTraits {
    /// The target differs from the host platform/arch.
    pub cross_compile: bool,
    /// The project relies on runtime module resolution (dynamic `require`,
    /// native addons loaded by computed path, ...).
    pub has_complex_dynamic_loading: bool,
    /// The project declares assets to embed.
    pub has_assets: bool,
}

/// Strategy chosen for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDecision {
    pub target: Target,
    pub mode: BuildMode,
    /// Human-readable justification.
    pub reason: String,
    /// The runtime version offers the native facility at all.
    pub can_use_native: bool,
    /// The native pipeline should actually run.
    pub should_use_native: bool,
}

impl BuildDecision {
    fn legacy(target: &Target, reason: impl Into<String>, can_use_native: bool) -> Self {
        BuildDecision {
            target: target.clone(),
            mode: BuildMode::Legacy,
            reason: reason.into(),
            can_use_native,
            should_use_native: false,
        }
    }

    fn native(target: &Target, reason: impl Into<String>) -> Self {
        BuildDecision {
            target: target.clone(),
            mode: BuildMode::Native,
            reason: reason.into(),
            can_use_native: true,
            should_use_native: true,
        }
    }

    /// The strategy that will actually run. A forced native mode on a runtime
    /// without the native facility degrades to legacy.
    pub fn effective_mode(&self) -> BuildMode {
        match self.mode {
            BuildMode::Native if self.should_use_native => BuildMode::Native,
            BuildMode::Native | BuildMode::Legacy => BuildMode::Legacy,
        }
    }
}

/// Decide the build strategy for `target`.
///
/// Rules are applied in order and the first match wins: validation, forced
/// mode, native availability, project constraints, stability.
pub fn decide(
    target: &Target,
    traits: &ProjectTraits,
    forced_mode: Option<BuildMode>,
) -> BuildDecision {
    let validation = validate(target);
    if !validation.valid {
        let reason = validation
            .reason
            .unwrap_or_else(|| format!("target `{}` is not valid", target));
        return BuildDecision::legacy(target, reason, false);
    }

    let version = target.runtime_version();
    let native = native_capabilities_of(version);

    if let Some(mode) = forced_mode {
        let reason = match mode {
            BuildMode::Native if !native.has_native => format!(
                "native mode forced, but {} lacks native single-executable support",
                version
            ),
            _ => format!("{} mode forced", mode),
        };
        return BuildDecision {
            target: target.clone(),
            mode,
            reason,
            can_use_native: native.has_native,
            should_use_native: mode == BuildMode::Native && native.has_native,
        };
    }

    if !native.has_native {
        return BuildDecision::legacy(
            target,
            format!("{} lacks native single-executable support", version),
            false,
        );
    }

    if traits.cross_compile {
        return BuildDecision::legacy(
            target,
            "native builds cannot cross-compile; using legacy bundling",
            true,
        );
    }

    if traits.has_complex_dynamic_loading {
        return BuildDecision::legacy(
            target,
            "native builds have no dynamic module resolution; using legacy bundling",
            true,
        );
    }

    if traits.has_assets && !native.supports_assets {
        return BuildDecision::legacy(
            target,
            format!(
                "native asset embedding requires node{}+; using legacy bundling",
                ASSETS_MIN_MAJOR
            ),
            true,
        );
    }

    if capability_of(version).stable_native {
        BuildDecision::native(
            target,
            format!("{} has stable native single-executable support", version),
        )
    } else {
        BuildDecision::legacy(
            target,
            format!(
                "native support in {} is pre-stable; falling back to legacy bundling",
                version
            ),
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(s: &str) -> Target {
        s.parse().unwrap()
    }

    #[test]
    fn test_unsupported_forced_native_stays_legacy() {
        let decision = decide(
            &target("node8-linux-x64"),
            &ProjectTraits::default(),
            Some(BuildMode::Native),
        );
        assert_eq!(decision.mode, BuildMode::Legacy);
        assert!(!decision.can_use_native);
        assert!(!decision.should_use_native);
        assert!(decision.reason.contains("not supported"));
    }

    #[test]
    fn test_stable_version_goes_native() {
        let decision = decide(&target("node21-linux-x64"), &ProjectTraits::default(), None);
        assert_eq!(decision.mode, BuildMode::Native);
        assert!(decision.should_use_native);
        assert!(decision.can_use_native);
    }

    #[test]
    fn test_pre_stable_version_falls_back() {
        let decision = decide(&target("node20-linux-x64"), &ProjectTraits::default(), None);
        assert_eq!(decision.mode, BuildMode::Legacy);
        assert!(decision.can_use_native);
        assert!(!decision.should_use_native);
        assert!(decision.reason.contains("pre-stable"));
    }

    #[test]
    fn test_no_native_support() {
        let decision = decide(&target("node18-linux-x64"), &ProjectTraits::default(), None);
        assert_eq!(decision.mode, BuildMode::Legacy);
        assert!(!decision.can_use_native);
        assert!(decision.reason.contains("lacks native"));
    }

    #[test]
    fn test_forced_modes_are_honoured() {
        let legacy = decide(
            &target("node22-linux-x64"),
            &ProjectTraits::default(),
            Some(BuildMode::Legacy),
        );
        assert_eq!(legacy.mode, BuildMode::Legacy);
        assert!(legacy.can_use_native);
        assert!(!legacy.should_use_native);

        let native = decide(
            &target("node20-linux-x64"),
            &ProjectTraits {
                cross_compile: true,
                ..Default::default()
            },
            Some(BuildMode::Native),
        );
        assert_eq!(native.mode, BuildMode::Native);
        assert!(native.should_use_native);

        let impossible = decide(
            &target("node18-linux-x64"),
            &ProjectTraits::default(),
            Some(BuildMode::Native),
        );
        assert_eq!(impossible.mode, BuildMode::Native);
        assert!(!impossible.should_use_native);
        assert_eq!(impossible.effective_mode(), BuildMode::Legacy);
        assert_eq!(native.effective_mode(), BuildMode::Native);
    }

    #[test]
    fn test_cross_compile_never_native_in_auto() {
        let traits = ProjectTraits {
            cross_compile: true,
            ..Default::default()
        };
        for major in 0..30 {
            let decision = decide(&target(&format!("node{}-linux-x64", major)), &traits, None);
            assert_eq!(decision.mode, BuildMode::Legacy, "node{}", major);
        }
    }

    #[test]
    fn test_complex_loading_forces_legacy() {
        let traits = ProjectTraits {
            has_complex_dynamic_loading: true,
            ..Default::default()
        };
        let decision = decide(&target("node22-macos-arm64"), &traits, None);
        assert_eq!(decision.mode, BuildMode::Legacy);
        assert!(decision.reason.contains("dynamic module resolution"));
    }

    #[test]
    fn test_assets_need_asset_support() {
        let traits = ProjectTraits {
            has_assets: true,
            ..Default::default()
        };
        assert_eq!(
            decide(&target("node21-linux-x64"), &traits, None).mode,
            BuildMode::Legacy
        );
        assert_eq!(
            decide(&target("node22-linux-x64"), &traits, None).mode,
            BuildMode::Native
        );
    }

    #[test]
    fn test_decision_is_deterministic() {
        let t = target("node23-windows-arm64");
        let traits = ProjectTraits::default();
        assert_eq!(decide(&t, &traits, None), decide(&t, &traits, None));
    }

    #[test]
    fn test_parse_mode_selection() {
        assert_eq!(parse_mode_selection("auto").unwrap(), None);
        assert_eq!(parse_mode_selection("SEA").unwrap(), Some(BuildMode::Native));
        assert_eq!(parse_mode_selection("legacy").unwrap(), Some(BuildMode::Legacy));
        assert!(parse_mode_selection("fast").is_err());
    }
}
