//! The configuration record consumed by `node --experimental-sea-config`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::util::fs::{expand_asset_paths, normalize_path, relative_path, to_slash, write_string};

/// File name of the config inside the assembly directory.
pub const SEA_CONFIG_FILE: &str = "sea-config.json";

/// File name of the preparation blob inside the assembly directory.
pub const BLOB_FILE: &str = "prep.blob";

/// Serialized as the JSON document Node reads to produce the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeaConfig {
    pub main: PathBuf,
    pub output: PathBuf,
    pub disable_experimental_warning: bool,
    pub use_snapshot: bool,
    pub use_code_cache: bool,
    /// Project-relative key -> absolute source path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<BTreeMap<String, PathBuf>>,
}

impl SeaConfig {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize SEA config")
    }

    /// Persist the config to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        write_string(path, &self.to_json()?)
    }
}

/// Map declared assets to `{ project-relative key: absolute path }`.
///
/// Declarations that resolve to nothing on disk are skipped.
pub fn convert_assets(project_root: &Path, declared: &[String]) -> BTreeMap<String, PathBuf> {
    let root = normalize_path(project_root);
    expand_asset_paths(&root, declared)
        .into_iter()
        .map(|file| {
            let absolute = normalize_path(&file);
            let key = to_slash(&relative_path(&root, &absolute));
            (key, absolute)
        })
        .collect()
}
