use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Public download endpoint; the remote id goes into its query string.
pub const DEFAULT_ENDPOINT: &str = "https://drive.google.com/uc";

/// Configuration loaded from `~/.config/drivefetch/config.toml`.
///
/// Every key is optional; a missing file or key falls back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Download endpoint the remote id is embedded into.
    pub endpoint: String,
    /// Seconds allowed for the TCP/TLS connect phase.
    pub connect_timeout_secs: u64,
    /// Abort when the transfer stays below this many bytes/s ...
    pub low_speed_limit: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Maximum HTTP redirects followed per request.
    pub max_redirections: u32,
    /// Maximum large-file confirmation pages followed per file.
    pub max_confirmations: u32,
    /// Optional User-Agent header (None = libcurl default).
    pub user_agent: Option<String>,
    /// Print a progress line while downloading.
    pub progress: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
            max_confirmations: 3,
            user_agent: None,
            progress: true,
        }
    }
}

/// Location of the config file, if one exists in the XDG config dirs.
pub fn find_config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("drivefetch")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

/// Parse a config file at `path`.
pub fn load_from_path(path: &Path) -> Result<FetchConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: FetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from the XDG config dir, or defaults when no file exists.
/// Never writes a default file.
pub fn load_or_default() -> Result<FetchConfig> {
    match find_config_path()? {
        Some(path) => {
            let cfg = load_from_path(&path)?;
            tracing::debug!("loaded config from {}", path.display());
            Ok(cfg)
        }
        None => Ok(FetchConfig::default()),
    }
}
