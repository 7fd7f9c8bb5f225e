//! Layout of the official Node.js binary distribution.
//!
//! ```text
//! <mirror>/latest-v22.x/
//! ├── SHASUMS256.txt
//! ├── node-v22.3.0-linux-x64.tar.gz      # contains node-v22.3.0-linux-x64/bin/node
//! ├── node-v22.3.0-darwin-arm64.tar.gz
//! └── win-x64/
//!     └── node.exe
//! ```

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;
use url::Url;

use crate::core::target::{Arch, Platform};

/// Default distribution root.
pub const DEFAULT_MIRROR: &str = "https://nodejs.org/dist/";

/// Checksum manifest published in every release directory.
pub const SHASUMS_FILE: &str = "SHASUMS256.txt";

/// OS component of distribution file names. Alpine and fully static Linux
/// builds are not published officially.
pub fn dist_os(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Linux => Some("linux"),
        Platform::Macos => Some("darwin"),
        Platform::Windows => Some("win"),
        Platform::Alpine | Platform::LinuxStatic => None,
    }
}

/// `<mirror>/latest-v<major>.x/`
pub fn release_dir_url(mirror: &Url, major: u64) -> Result<Url> {
    mirror
        .join(&format!("latest-v{}.x/", major))
        .with_context(|| format!("invalid mirror URL: {}", mirror))
}

/// One line of `SHASUMS256.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShasumEntry {
    pub sha256: String,
    pub file: String,
}

pub fn parse_shasums(text: &str) -> Vec<ShasumEntry> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let sha256 = parts.next()?;
            let file = parts.next()?;
            Some(ShasumEntry {
                sha256: sha256.to_lowercase(),
                file: file.to_string(),
            })
        })
        .collect()
}

/// A downloadable file holding the runtime executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistArtifact {
    /// A gzipped tarball; `member` is the executable's path inside it.
    Tarball {
        file: String,
        sha256: String,
        member: String,
    },
    /// The bare executable.
    Executable { file: String, sha256: String },
}

impl DistArtifact {
    pub fn file(&self) -> &str {
        match self {
            DistArtifact::Tarball { file, .. } | DistArtifact::Executable { file, .. } => file,
        }
    }

    pub fn sha256(&self) -> &str {
        match self {
            DistArtifact::Tarball { sha256, .. } | DistArtifact::Executable { sha256, .. } => {
                sha256
            }
        }
    }
}

/// Locate the artifact for `platform`/`arch` in a release's checksum list.
pub fn find_artifact(entries: &[ShasumEntry], platform: Platform, arch: Arch) -> Option<DistArtifact> {
    let os = dist_os(platform)?;

    if platform == Platform::Windows {
        let file = format!("win-{}/node.exe", arch);
        return entries
            .iter()
            .find(|e| e.file == file)
            .map(|e| DistArtifact::Executable {
                file: e.file.clone(),
                sha256: e.sha256.clone(),
            });
    }

    let suffix = format!("-{}-{}.tar.gz", os, arch);
    entries
        .iter()
        .find(|e| e.file.starts_with("node-v") && e.file.ends_with(&suffix))
        .map(|e| {
            let stem = e.file.trim_end_matches(".tar.gz");
            DistArtifact::Tarball {
                file: e.file.clone(),
                sha256: e.sha256.clone(),
                member: format!("{}/bin/node", stem),
            }
        })
}

/// Extract one file from a gzipped tarball into `dest`.
pub fn extract_member(tarball: &[u8], member: &str, dest: &Path) -> Result<()> {
    let mut archive = Archive::new(GzDecoder::new(tarball));

    for entry in archive.entries().context("failed to read tarball")? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().into_owned();
        if path.trim_start_matches("./") != member {
            continue;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .with_context(|| format!("failed to read `{}` from tarball", member))?;
        std::fs::write(dest, contents)
            .with_context(|| format!("failed to write {}", dest.display()))?;
        return Ok(());
    }

    bail!("tarball does not contain `{}`", member)
}
