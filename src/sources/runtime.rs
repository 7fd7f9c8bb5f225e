//! Resolution of Node.js runtime binaries for arbitrary target versions.
//!
//! Lookup order for `node<N>-<platform>-<arch>`:
//!
//! 1. The local cache (`<cache>/node<N>-<platform>-<arch>/node[.exe]`)
//! 2. The official distribution, verified against `SHASUMS256.txt`
//! 3. The legacy fetcher, either for `node<N>` itself when the legacy
//!    toolchain maintains it, or for its fallback version in compatibility
//!    mode

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::core::capability::{is_supported_major, parse_major, supported_majors};
use crate::core::error::PackError;
use crate::core::target::{Arch, Platform};
use crate::sources::dist::{
    dist_os, extract_member, find_artifact, parse_shasums, release_dir_url, DistArtifact,
    DEFAULT_MIRROR, SHASUMS_FILE,
};
use crate::sources::download::HttpClient;
use crate::sources::legacy_fetch::LegacyFetcher;
use crate::util::fs::{ensure_dir, make_executable, move_file};
use crate::util::hash::sha256_bytes;

/// Majors the legacy toolchain publishes base binaries for.
pub const LEGACY_TABLE: &[u64] = &[18, 20, 22];

/// Extended major -> legacy major used in compatibility mode.
pub const FALLBACK_TABLE: &[(u64, u64)] = &[(19, 18), (21, 20), (23, 22), (24, 22), (25, 22)];

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub cache_dir: PathBuf,
    pub mirror: Url,
    /// Skip the distribution download entirely.
    pub offline: bool,
}

impl ResolverConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(ResolverConfig {
            cache_dir: cache_dir.into(),
            mirror: Url::parse(DEFAULT_MIRROR)?,
            offline: false,
        })
    }

    pub fn with_mirror(mut self, mirror: &str) -> Result<Self> {
        // Url::join drops the last path segment unless it ends in '/'.
        let normalized = if mirror.ends_with('/') {
            mirror.to_string()
        } else {
            format!("{}/", mirror)
        };
        self.mirror =
            Url::parse(&normalized).with_context(|| format!("invalid mirror URL `{}`", mirror))?;
        Ok(self)
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

/// A runtime binary ready to be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRuntime {
    pub path: PathBuf,
    /// Set when a different major stands in for the requested one.
    pub compatibility_warning: Option<String>,
}

/// Check that every supported major outside [`LEGACY_TABLE`] has exactly one
/// fallback entry, and that every entry lands on a supported legacy major.
pub fn verify_fallback_table(table: &[(u64, u64)]) -> Result<()> {
    for major in supported_majors().filter(|m| !LEGACY_TABLE.contains(m)) {
        let count = table.iter().filter(|(from, _)| *from == major).count();
        if count != 1 {
            bail!(
                "fallback table must have exactly one entry for node{}, found {}",
                major,
                count
            );
        }
    }

    for &(from, to) in table {
        if LEGACY_TABLE.contains(&from) {
            bail!("fallback table maps node{}, which the legacy toolchain already covers", from);
        }
        if !is_supported_major(to) || !LEGACY_TABLE.contains(&to) {
            bail!(
                "fallback for node{} points at node{}, which is not a supported legacy version",
                from,
                to
            );
        }
    }

    Ok(())
}

/// Resolves runtime binaries for versions outside the legacy toolchain's
/// table.
pub struct ExtendedVersionResolver<'a> {
    config: ResolverConfig,
    http: &'a dyn HttpClient,
    legacy: &'a dyn LegacyFetcher,
    fallbacks: Vec<(u64, u64)>,
}

impl<'a> ExtendedVersionResolver<'a> {
    pub fn new(
        config: ResolverConfig,
        http: &'a dyn HttpClient,
        legacy: &'a dyn LegacyFetcher,
    ) -> Result<Self> {
        Self::with_fallback_table(config, http, legacy, FALLBACK_TABLE)
    }

    /// Construct with a custom fallback table. Fails if the table is
    /// incomplete or inconsistent.
    pub fn with_fallback_table(
        config: ResolverConfig,
        http: &'a dyn HttpClient,
        legacy: &'a dyn LegacyFetcher,
        table: &[(u64, u64)],
    ) -> Result<Self> {
        verify_fallback_table(table).context("fallback table self-check failed")?;
        Ok(ExtendedVersionResolver {
            config,
            http,
            legacy,
            fallbacks: table.to_vec(),
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn fallback_for(&self, major: u64) -> Option<u64> {
        self.fallbacks
            .iter()
            .find(|(from, _)| *from == major)
            .map(|(_, to)| *to)
    }

    /// Cache location of the binary for `node<major>-<platform>-<arch>`.
    pub fn cache_path(&self, major: u64, platform: Platform, arch: Arch) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("node{}-{}-{}", major, platform, arch))
            .join(platform.exe_name("node"))
    }

    pub fn resolve(&self, version_id: &str, platform: Platform, arch: Arch) -> Result<ResolvedRuntime> {
        let major = parse_major(version_id)
            .ok_or_else(|| anyhow!("unrecognised runtime version `{}`", version_id))?;

        let cached = self.cache_path(major, platform, arch);
        if cached.is_file() {
            tracing::debug!("using cached runtime {}", cached.display());
            return Ok(ResolvedRuntime {
                path: cached,
                compatibility_warning: None,
            });
        }

        if self.config.offline {
            tracing::debug!("offline: skipping download of node{}", major);
        } else {
            match self.download(major, platform, arch, &cached) {
                Ok(()) => {
                    return Ok(ResolvedRuntime {
                        path: cached,
                        compatibility_warning: None,
                    })
                }
                Err(e) => tracing::warn!("direct download of node{} failed: {:#}", major, e),
            }
        }

        if LEGACY_TABLE.contains(&major) {
            let path = self.legacy.fetch(major, platform, arch)?;
            return Ok(ResolvedRuntime {
                path,
                compatibility_warning: None,
            });
        }

        let fallback = self
            .fallback_for(major)
            .ok_or_else(|| PackError::FallbackExhausted {
                version: version_id.to_string(),
            })?;

        let warning = format!(
            "node{} binary unavailable for {}-{}; using node{} in compatibility mode",
            major, platform, arch, fallback
        );
        tracing::warn!("{}", warning);

        let path = self.legacy.fetch(fallback, platform, arch)?;
        Ok(ResolvedRuntime {
            path,
            compatibility_warning: Some(warning),
        })
    }

    fn download(&self, major: u64, platform: Platform, arch: Arch, dest: &Path) -> Result<()> {
        let Some(_) = dist_os(platform) else {
            bail!("no official Node.js build exists for {}", platform);
        };

        let base = release_dir_url(&self.config.mirror, major)?;
        let shasums_url = base.join(SHASUMS_FILE)?;
        let shasums = self.http.get(shasums_url.as_str())?;
        let entries = parse_shasums(&String::from_utf8_lossy(&shasums));

        let artifact = find_artifact(&entries, platform, arch).ok_or_else(|| {
            anyhow!("{} lists no build for {}-{}", shasums_url, platform, arch)
        })?;

        let artifact_url = base.join(artifact.file())?;
        tracing::info!("downloading {}", artifact_url);
        let bytes = self.http.get(artifact_url.as_str())?;

        let actual = sha256_bytes(&bytes);
        if actual != artifact.sha256() {
            bail!(
                "checksum mismatch for {}: expected {}, got {}",
                artifact.file(),
                artifact.sha256(),
                actual
            );
        }

        let parent = dest
            .parent()
            .ok_or_else(|| anyhow!("invalid cache path {}", dest.display()))?;
        ensure_dir(parent)?;

        let partial = parent.join(".partial");
        match &artifact {
            DistArtifact::Tarball { member, .. } => extract_member(&bytes, member, &partial)?,
            DistArtifact::Executable { .. } => std::fs::write(&partial, &bytes)
                .with_context(|| format!("failed to write {}", partial.display()))?,
        }
        make_executable(&partial)
            .with_context(|| format!("failed to mark {} executable", partial.display()))?;
        move_file(&partial, dest)?;

        Ok(())
    }
}
