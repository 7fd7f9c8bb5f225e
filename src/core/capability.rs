//! Runtime capability model.
//!
//! Capabilities are immutable facts derived from a version id, never cached
//! state: call [`capability_of`] again rather than holding on to the result
//! across invocations.

use serde::Serialize;

use crate::core::target::LATEST_TAG;

/// Oldest Node major still serviced.
pub const MIN_SUPPORTED_MAJOR: u64 = 18;

/// Newest Node major maintained; also what `latest` resolves to.
pub const MAX_SUPPORTED_MAJOR: u64 = 25;

/// First major shipping the single-executable facility (experimental).
pub const NATIVE_MIN_MAJOR: u64 = 20;

/// First major where the single-executable facility is considered stable.
pub const NATIVE_STABLE_MAJOR: u64 = 21;

/// First major able to embed assets in the preparation blob.
pub const ASSETS_MIN_MAJOR: u64 = 22;

/// First major able to embed a startup snapshot.
pub const SNAPSHOT_MIN_MAJOR: u64 = 22;

/// First major able to embed a V8 code cache.
pub const CODE_CACHE_MIN_MAJOR: u64 = 22;

/// `NODE_MODULE_VERSION` per major.
const ABI_TABLE: &[(u64, u32)] = &[
    (8, 57),
    (10, 64),
    (12, 72),
    (14, 83),
    (16, 93),
    (18, 108),
    (19, 111),
    (20, 115),
    (21, 120),
    (22, 127),
    (23, 131),
    (24, 137),
    (25, 141),
];

/// What a runtime version is, as far as packaging is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityInfo {
    /// The version id this was derived from, as given.
    pub version: String,
    /// Native module ABI identifier, if the major is known.
    pub abi: Option<u32>,
    pub supports_native: bool,
    pub stable_native: bool,
    pub is_supported: bool,
}

/// Feature set of the native single-executable facility for one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NativeCapabilities {
    pub has_native: bool,
    pub supports_assets: bool,
    pub supports_snapshot: bool,
    pub supports_code_cache: bool,
    pub requires_injection: bool,
}

/// Extract the major version from a version id.
///
/// Accepts `node22`, `node22.3.0`, `v22.3.0`, `22` and the `latest` sentinel.
pub fn parse_major(version_id: &str) -> Option<u64> {
    let id = version_id.trim().to_lowercase();
    if id == LATEST_TAG {
        return Some(MAX_SUPPORTED_MAJOR);
    }

    let bare = id
        .strip_prefix("node")
        .or_else(|| id.strip_prefix('v'))
        .unwrap_or(&id);
    let major = bare.split('.').next()?;
    if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    major.parse().ok()
}

/// ABI identifier for a major version.
pub fn abi_for_major(major: u64) -> Option<u32> {
    ABI_TABLE
        .iter()
        .find(|(m, _)| *m == major)
        .map(|(_, abi)| *abi)
}

/// Whether a major falls inside the maintained range.
pub fn is_supported_major(major: u64) -> bool {
    (MIN_SUPPORTED_MAJOR..=MAX_SUPPORTED_MAJOR).contains(&major)
}

/// Every maintained major, oldest first.
pub fn supported_majors() -> impl Iterator<Item = u64> {
    MIN_SUPPORTED_MAJOR..=MAX_SUPPORTED_MAJOR
}

/// The maintained range as shown to users (`18-25`).
pub fn supported_range() -> String {
    format!("{}-{}", MIN_SUPPORTED_MAJOR, MAX_SUPPORTED_MAJOR)
}

/// Derive the capability record for a version id.
pub fn capability_of(version_id: &str) -> CapabilityInfo {
    let major = parse_major(version_id);
    let is_supported = major.is_some_and(is_supported_major);

    // Native support is only claimed for supported majors so that every
    // native-capable version also has an ABI entry.
    let supported_major = major.filter(|_| is_supported);

    CapabilityInfo {
        version: version_id.to_string(),
        abi: major.and_then(abi_for_major),
        supports_native: supported_major.is_some_and(|m| m >= NATIVE_MIN_MAJOR),
        stable_native: supported_major.is_some_and(|m| m >= NATIVE_STABLE_MAJOR),
        is_supported,
    }
}

/// Derive the native facility feature set for a version id.
pub fn native_capabilities_of(version_id: &str) -> NativeCapabilities {
    let info = capability_of(version_id);
    if !info.supports_native {
        return NativeCapabilities::default();
    }

    // supports_native implies a parseable major
    let major = parse_major(version_id).unwrap_or_default();

    NativeCapabilities {
        has_native: true,
        supports_assets: major >= ASSETS_MIN_MAJOR,
        supports_snapshot: major >= SNAPSHOT_MIN_MAJOR,
        supports_code_cache: major >= CODE_CACHE_MIN_MAJOR,
        requires_injection: true,
    }
}
