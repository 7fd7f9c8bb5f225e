//! Human-readable views of decisions and capabilities.

use serde::Serialize;

use crate::core::capability::{capability_of, native_capabilities_of, supported_majors};
use crate::core::decision::BuildDecision;
use crate::core::validate::{SUPPORTED_ARCHES, SUPPORTED_PLATFORMS};
use crate::sources::runtime::{FALLBACK_TABLE, LEGACY_TABLE};

/// One row of the capability matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityRow {
    pub version: String,
    pub abi: Option<u32>,
    pub native: bool,
    pub stable: bool,
    pub assets: bool,
    pub snapshot: bool,
    pub code_cache: bool,
    /// Version the legacy toolchain packages this major with.
    pub legacy_base: String,
}

/// Capability rows for every maintained major.
pub fn capability_matrix() -> Vec<CapabilityRow> {
    supported_majors()
        .map(|major| {
            let version = format!("node{}", major);
            let info = capability_of(&version);
            let native = native_capabilities_of(&version);
            let legacy_base = if LEGACY_TABLE.contains(&major) {
                version.clone()
            } else {
                FALLBACK_TABLE
                    .iter()
                    .find(|(from, _)| *from == major)
                    .map(|(_, to)| format!("node{} (compat)", to))
                    .unwrap_or_else(|| "-".to_string())
            };
            CapabilityRow {
                abi: info.abi,
                native: info.supports_native,
                stable: info.stable_native,
                assets: native.supports_assets,
                snapshot: native.supports_snapshot,
                code_cache: native.supports_code_cache,
                legacy_base,
                version,
            }
        })
        .collect()
}

fn mark(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "-"
    }
}

/// Render the matrix as an aligned table.
pub fn format_matrix(rows: &[CapabilityRow]) -> String {
    let mut lines = vec![format!(
        "{:<8} {:>4}  {:<6} {:<6} {:<6} {:<8} {:<10} {}",
        "VERSION", "ABI", "NATIVE", "STABLE", "ASSETS", "SNAPSHOT", "CODE-CACHE", "LEGACY BASE"
    )];
    for row in rows {
        lines.push(format!(
            "{:<8} {:>4}  {:<6} {:<6} {:<6} {:<8} {:<10} {}",
            row.version,
            row.abi.map(|a| a.to_string()).unwrap_or_else(|| "?".to_string()),
            mark(row.native),
            mark(row.stable),
            mark(row.assets),
            mark(row.snapshot),
            mark(row.code_cache),
            row.legacy_base
        ));
    }

    let platforms: Vec<_> = SUPPORTED_PLATFORMS.iter().map(|p| p.as_str()).collect();
    let arches: Vec<_> = SUPPORTED_ARCHES.iter().map(|a| a.as_str()).collect();
    lines.push(String::new());
    lines.push(format!("platforms: {}", platforms.join(", ")));
    lines.push(format!("arches:    {}", arches.join(", ")));
    lines.join("\n")
}

/// Render one line per decision: `<target>  <mode>  <reason>`.
pub fn format_plan(decisions: &[BuildDecision]) -> String {
    let width = decisions
        .iter()
        .map(|d| d.target.to_string().len())
        .max()
        .unwrap_or(0);

    decisions
        .iter()
        .map(|d| {
            format!(
                "{:<width$}  {:<6}  {}",
                d.target.to_string(),
                d.effective_mode().as_str(),
                d.reason,
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
