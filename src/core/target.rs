//! Packaging targets.
//!
//! A target is one `(runtime version, platform, architecture)` triple, written
//! on the command line as `node22-linux-x64`. The `linux-static` platform keeps
//! its hyphen in the triple (`node22-linux-static-x64`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::host::HostInfo;

/// Sentinel version tag meaning "newest maintained major".
pub const LATEST_TAG: &str = "latest";

/// Operating system flavour a binary is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Linux,
    Macos,
    Windows,
    Alpine,
    LinuxStatic,
}

impl Platform {
    /// Every platform identifier the triple syntax understands.
    pub const ALL: &'static [Platform] = &[
        Platform::Linux,
        Platform::Macos,
        Platform::Windows,
        Platform::Alpine,
        Platform::LinuxStatic,
    ];

    /// Canonical name used in triples and output file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Windows => "windows",
            Platform::Alpine => "alpine",
            Platform::LinuxStatic => "linux-static",
        }
    }

    /// Executable file extension (`.exe` on Windows, empty elsewhere).
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            Platform::Windows => ".exe",
            _ => "",
        }
    }

    /// Append the platform's executable extension to `name` if it is missing.
    pub fn exe_name(&self, name: &str) -> String {
        let suffix = self.exe_suffix();
        if suffix.is_empty() || name.ends_with(suffix) {
            name.to_string()
        } else {
            format!("{}{}", name, suffix)
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" | "mac" | "darwin" | "osx" => Ok(Platform::Macos),
            "windows" | "win" | "win32" => Ok(Platform::Windows),
            "alpine" => Ok(Platform::Alpine),
            "linux-static" | "linuxstatic" => Ok(Platform::LinuxStatic),
            _ => Err(TargetParseError::UnknownPlatform(s.to_string())),
        }
    }
}

/// CPU architecture a binary is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X64,
    Arm64,
    X86,
}

impl Arch {
    /// Every architecture identifier the triple syntax understands.
    pub const ALL: &'static [Arch] = &[Arch::X64, Arch::Arm64, Arch::X86];

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Arch {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x64" | "amd64" | "x86_64" => Ok(Arch::X64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "x86" | "ia32" | "i686" => Ok(Arch::X86),
            _ => Err(TargetParseError::UnknownArch(s.to_string())),
        }
    }
}

/// Error returned when a target triple cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetParseError {
    #[error("empty target triple")]
    Empty,

    #[error("unknown platform `{0}`, expected one of: linux, macos, windows, alpine, linux-static")]
    UnknownPlatform(String),

    #[error("unknown architecture `{0}`, expected one of: x64, arm64, x86")]
    UnknownArch(String),

    #[error("unrecognised component `{component}` in target `{triple}`")]
    UnknownComponent { component: String, triple: String },

    #[error("target `{triple}` specifies the {kind} more than once")]
    Duplicate { kind: &'static str, triple: String },

    #[error("target `{triple}` is missing the {kind} (expected `<node-version>-<platform>-<arch>`)")]
    Missing { kind: &'static str, triple: String },
}

/// One packaging unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    runtime_version: String,
    platform: Platform,
    arch: Arch,
}

impl Target {
    /// Create a target from its parts.
    pub fn new(runtime_version: impl Into<String>, platform: Platform, arch: Arch) -> Self {
        Target {
            runtime_version: runtime_version.into(),
            platform,
            arch,
        }
    }

    /// The version tag as written (`node22`, `latest`, ...).
    pub fn runtime_version(&self) -> &str {
        &self.runtime_version
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Return a copy of this target with a different runtime version.
    pub fn with_runtime_version(&self, runtime_version: impl Into<String>) -> Self {
        Target {
            runtime_version: runtime_version.into(),
            platform: self.platform,
            arch: self.arch,
        }
    }

    /// Whether this target matches the host's platform and architecture.
    pub fn is_host(&self, host: &HostInfo) -> bool {
        self.platform == host.platform && self.arch == host.arch
    }

    /// Parse a possibly partial triple, filling missing parts from the host.
    ///
    /// `node22` becomes `node22-<host platform>-<host arch>`, `linux-arm64`
    /// takes the host runtime version (or `latest` if none was detected).
    pub fn parse_with_host(s: &str, host: &HostInfo) -> Result<Self, TargetParseError> {
        let parts = parse_components(s)?;
        Ok(Target {
            runtime_version: parts
                .version
                .or_else(|| host.runtime_tag())
                .unwrap_or_else(|| LATEST_TAG.to_string()),
            platform: parts.platform.unwrap_or(host.platform),
            arch: parts.arch.unwrap_or(host.arch),
        })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.runtime_version, self.platform, self.arch)
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_components(s)?;
        let missing = |kind| TargetParseError::Missing {
            kind,
            triple: s.to_string(),
        };
        Ok(Target {
            runtime_version: parts.version.ok_or_else(|| missing("node version"))?,
            platform: parts.platform.ok_or_else(|| missing("platform"))?,
            arch: parts.arch.ok_or_else(|| missing("architecture"))?,
        })
    }
}

#[derive(Default)]
struct TripleParts {
    version: Option<String>,
    platform: Option<Platform>,
    arch: Option<Arch>,
}

fn is_version_tag(token: &str) -> bool {
    token == LATEST_TAG
        || token
            .strip_prefix("node")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn parse_components(s: &str) -> Result<TripleParts, TargetParseError> {
    let normalized = s.trim().to_lowercase().replace("linux-static", "linuxstatic");
    if normalized.is_empty() {
        return Err(TargetParseError::Empty);
    }

    let duplicate = |kind| TargetParseError::Duplicate {
        kind,
        triple: s.to_string(),
    };

    let mut parts = TripleParts::default();
    for token in normalized.split('-') {
        if is_version_tag(token) {
            if parts.version.replace(token.to_string()).is_some() {
                return Err(duplicate("node version"));
            }
        } else if let Ok(platform) = token.parse::<Platform>() {
            if parts.platform.replace(platform).is_some() {
                return Err(duplicate("platform"));
            }
        } else if let Ok(arch) = token.parse::<Arch>() {
            if parts.arch.replace(arch).is_some() {
                return Err(duplicate("architecture"));
            }
        } else {
            return Err(TargetParseError::UnknownComponent {
                component: token.to_string(),
                triple: s.to_string(),
            });
        }
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HostInfo {
        HostInfo::new(Platform::Linux, Arch::X64).with_runtime_major(22)
    }

    #[test]
    fn test_parse_full_triple() {
        let target: Target = "node21-linux-x64".parse().unwrap();
        assert_eq!(target.runtime_version(), "node21");
        assert_eq!(target.platform(), Platform::Linux);
        assert_eq!(target.arch(), Arch::X64);
        assert_eq!(target.to_string(), "node21-linux-x64");
    }

    #[test]
    fn test_parse_linux_static_keeps_hyphen() {
        let target: Target = "node22-linux-static-arm64".parse().unwrap();
        assert_eq!(target.platform(), Platform::LinuxStatic);
        assert_eq!(target.arch(), Arch::Arm64);
        assert_eq!(target.to_string(), "node22-linux-static-arm64");
    }

    #[test]
    fn test_parse_aliases() {
        let target: Target = "node20-win-amd64".parse().unwrap();
        assert_eq!(target.platform(), Platform::Windows);
        assert_eq!(target.arch(), Arch::X64);

        let target: Target = "latest-darwin-aarch64".parse().unwrap();
        assert_eq!(target.runtime_version(), LATEST_TAG);
        assert_eq!(target.platform(), Platform::Macos);
        assert_eq!(target.arch(), Arch::Arm64);
    }

    #[test]
    fn test_parse_rejects_unknown_component() {
        let err = "node21-solaris-x64".parse::<Target>().unwrap_err();
        assert!(matches!(err, TargetParseError::UnknownComponent { .. }));
        assert!(err.to_string().contains("solaris"));
    }

    #[test]
    fn test_parse_rejects_missing_and_duplicate() {
        let err = "node21-linux".parse::<Target>().unwrap_err();
        assert!(err.to_string().contains("missing the architecture"));

        let err = "node21-linux-macos-x64".parse::<Target>().unwrap_err();
        assert!(err.to_string().contains("platform more than once"));

        assert_eq!("".parse::<Target>().unwrap_err(), TargetParseError::Empty);
    }

    #[test]
    fn test_parse_with_host_fills_gaps() {
        let target = Target::parse_with_host("node20", &host()).unwrap();
        assert_eq!(target.to_string(), "node20-linux-x64");

        let target = Target::parse_with_host("macos-arm64", &host()).unwrap();
        assert_eq!(target.to_string(), "node22-macos-arm64");

        let bare = HostInfo::new(Platform::Windows, Arch::X64);
        let target = Target::parse_with_host("x86", &bare).unwrap();
        assert_eq!(target.to_string(), "latest-windows-x86");
    }

    #[test]
    fn test_exe_name() {
        assert_eq!(Platform::Windows.exe_name("app"), "app.exe");
        assert_eq!(Platform::Windows.exe_name("app.exe"), "app.exe");
        assert_eq!(Platform::Linux.exe_name("app"), "app");
    }
}
