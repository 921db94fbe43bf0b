use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Catalog file used when neither the config nor the CLI names one.
pub const DEFAULT_CATALOG_FILE: &str = "datasets.toml";

/// Object store backend: S3-compatible HTTP endpoint or a local directory mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Http,
    Local,
}

/// `[store]` section of config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the S3-compatible endpoint.
    pub endpoint: String,
    /// Bucket name appended to the endpoint path (empty for virtual-host endpoints).
    pub bucket: String,
    /// Optional bearer token sent as `Authorization: Bearer ...`.
    pub bearer_token: Option<String>,
    /// Directory standing in for the bucket when `backend = "local"`.
    pub local_root: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    /// Upper bound for a whole transfer, in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Http,
            endpoint: "https://s3.amazonaws.com".to_string(),
            bucket: "datasets".to_string(),
            bearer_token: None,
            local_root: None,
            connect_timeout_secs: 15,
            timeout_secs: 3600,
        }
    }
}

/// Global configuration loaded from `~/.config/datasum/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasumConfig {
    /// Catalog of datasets to check; the `--catalog` flag overrides it.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Digest algorithm name, e.g. "sha256". Validated before any fetch.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Datasets fetched at once. 1 = strictly sequential.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Where scratch copies are written (None = system temp dir).
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_algorithm() -> String {
    "sha256".to_string()
}

fn default_jobs() -> usize {
    1
}

impl Default for DatasumConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            algorithm: default_algorithm(),
            jobs: default_jobs(),
            scratch_dir: None,
            store: StoreConfig::default(),
        }
    }
}

impl DatasumConfig {
    /// Catalog to load: explicit override, then config value, then `datasets.toml`.
    pub fn catalog_path_or(&self, cli_override: Option<&Path>) -> PathBuf {
        cli_override
            .map(Path::to_path_buf)
            .or_else(|| self.catalog_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("datasum")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DatasumConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DatasumConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_from(path: &Path) -> Result<DatasumConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: DatasumConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
