//! Configuration file support for seapack.
//!
//! seapack supports two configuration file locations:
//! - Global: `~/.seapack/config.toml` - User-wide defaults
//! - Project: `.seapack/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::native::NativeTools;
use crate::builder::signing::SigningTools;
use crate::core::decision::{parse_mode_selection, BuildMode};

/// seapack configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// External tool overrides
    pub tools: ToolsConfig,

    /// Runtime binary cache
    pub cache: CacheConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Default strategy (auto, native, legacy)
    pub mode: Option<String>,

    /// Embed a startup snapshot in native builds
    pub snapshot: Option<bool>,

    /// Embed a code cache in native builds
    pub code_cache: Option<bool>,

    /// Re-sign binaries after injection
    pub sign: Option<bool>,

    /// Default targets when none are given on the command line
    pub targets: Vec<String>,

    /// Default asset declarations
    pub assets: Vec<String>,
}

/// Paths or names of the external tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub node: Option<String>,
    pub postject: Option<String>,
    pub legacy_packager: Option<String>,
    pub legacy_fetcher: Option<String>,
    pub codesign: Option<String>,
    pub signtool: Option<String>,
}

impl ToolsConfig {
    pub fn node(&self) -> &str {
        self.node.as_deref().unwrap_or("node")
    }

    pub fn postject(&self) -> &str {
        self.postject.as_deref().unwrap_or("postject")
    }

    pub fn legacy_packager(&self) -> &str {
        self.legacy_packager.as_deref().unwrap_or("pkg")
    }

    pub fn legacy_fetcher(&self) -> &str {
        self.legacy_fetcher.as_deref().unwrap_or("pkg-fetch")
    }

    pub fn signing(&self) -> SigningTools {
        let defaults = SigningTools::default();
        SigningTools {
            codesign: self.codesign.clone().unwrap_or(defaults.codesign),
            signtool: self.signtool.clone().unwrap_or(defaults.signtool),
        }
    }

    pub fn native(&self) -> NativeTools {
        NativeTools {
            postject: self.postject().to_string(),
            signing: self.signing(),
        }
    }
}

/// Runtime cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Where downloaded runtimes are kept
    pub dir: Option<PathBuf>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Distribution mirror (defaults to nodejs.org)
    pub mirror: Option<String>,

    /// Offline mode (don't download runtimes)
    #[serde(default)]
    pub offline: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Build settings
        if other.build.mode.is_some() {
            self.build.mode = other.build.mode;
        }
        if other.build.snapshot.is_some() {
            self.build.snapshot = other.build.snapshot;
        }
        if other.build.code_cache.is_some() {
            self.build.code_cache = other.build.code_cache;
        }
        if other.build.sign.is_some() {
            self.build.sign = other.build.sign;
        }
        if !other.build.targets.is_empty() {
            self.build.targets = other.build.targets;
        }
        if !other.build.assets.is_empty() {
            self.build.assets = other.build.assets;
        }

        // Tool overrides
        let tools = other.tools;
        if tools.node.is_some() {
            self.tools.node = tools.node;
        }
        if tools.postject.is_some() {
            self.tools.postject = tools.postject;
        }
        if tools.legacy_packager.is_some() {
            self.tools.legacy_packager = tools.legacy_packager;
        }
        if tools.legacy_fetcher.is_some() {
            self.tools.legacy_fetcher = tools.legacy_fetcher;
        }
        if tools.codesign.is_some() {
            self.tools.codesign = tools.codesign;
        }
        if tools.signtool.is_some() {
            self.tools.signtool = tools.signtool;
        }

        if other.cache.dir.is_some() {
            self.cache.dir = other.cache.dir;
        }

        // Net settings
        if other.net.mirror.is_some() {
            self.net.mirror = other.net.mirror;
        }
        if other.net.offline {
            self.net.offline = true;
        }
    }

    /// Parse the configured mode. `auto` and an absent value both mean
    /// "let the decision engine choose".
    pub fn mode(&self) -> Result<Option<BuildMode>> {
        match &self.build.mode {
            Some(mode) => parse_mode_selection(mode)
                .with_context(|| "invalid `build.mode` in configuration"),
            None => Ok(None),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.seapack/config.toml)
/// 2. Global config (~/.seapack/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}
