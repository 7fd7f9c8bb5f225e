//! Target validation against the maintained version, platform and arch sets.

use serde::Serialize;

use crate::core::capability::{capability_of, supported_range};
use crate::core::target::{Arch, Platform, Target};

/// Platforms binaries are produced for.
pub const SUPPORTED_PLATFORMS: &[Platform] = &[
    Platform::Linux,
    Platform::Macos,
    Platform::Windows,
    Platform::Alpine,
    Platform::LinuxStatic,
];

/// Architectures binaries are produced for. 32-bit x86 parses but is no
/// longer built.
pub const SUPPORTED_ARCHES: &[Arch] = &[Arch::X64, Arch::Arm64];

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub reason: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Validation {
            valid: true,
            reason: None,
        }
    }

    fn fail(reason: String) -> Self {
        Validation {
            valid: false,
            reason: Some(reason),
        }
    }
}

fn join_names<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check a target against the maintained sets.
pub fn validate(target: &Target) -> Validation {
    if !capability_of(target.runtime_version()).is_supported {
        return Validation::fail(format!(
            "node version `{}` is not supported (supported majors: {})",
            target.runtime_version(),
            supported_range()
        ));
    }

    if !SUPPORTED_PLATFORMS.contains(&target.platform()) {
        return Validation::fail(format!(
            "platform `{}` is not supported (supported: {})",
            target.platform(),
            join_names(SUPPORTED_PLATFORMS)
        ));
    }

    if !SUPPORTED_ARCHES.contains(&target.arch()) {
        return Validation::fail(format!(
            "architecture `{}` is not supported (supported: {})",
            target.arch(),
            join_names(SUPPORTED_ARCHES)
        ));
    }

    Validation::ok()
}
