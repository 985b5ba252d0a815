use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::job::{validate_extension, DEFAULT_CHECKSUM_EXTENSION};

fn default_checksum_extension() -> String {
    DEFAULT_CHECKSUM_EXTENSION.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_max_redirections() -> u32 {
    10
}

/// Global configuration loaded from `~/.config/cachedl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedlConfig {
    /// Cache root. If missing, `$XDG_CACHE_HOME/cachedl` is used.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Suffix appended to a job id to name its checksum marker.
    #[serde(default = "default_checksum_extension")]
    pub checksum_extension: String,
    /// Default per-request timeout in milliseconds (None = no timeout).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// TCP/TLS connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum redirects followed per GET.
    #[serde(default = "default_max_redirections")]
    pub max_redirections: u32,
    /// Optional User-Agent sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for CachedlConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            checksum_extension: default_checksum_extension(),
            timeout_ms: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirections: default_max_redirections(),
            user_agent: None,
        }
    }
}

impl CachedlConfig {
    /// Configured cache root, or the XDG default.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_root(),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// `$XDG_CACHE_HOME/cachedl` (usually `~/.cache/cachedl`).
pub fn default_cache_root() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cachedl")?;
    Ok(xdg_dirs.get_cache_home())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cachedl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CachedlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CachedlConfig::default();
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

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<CachedlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: CachedlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    validate_extension(&cfg.checksum_extension)
        .with_context(|| format!("checksum_extension in {}", path.display()))?;
    Ok(cfg)
}
