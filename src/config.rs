use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Default user-listing endpoint
const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/users";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// Rows per table page
  pub page_size: usize,
  /// Seconds before cached data is eligible for background refresh
  pub stale_secs: u64,
  /// Whether to keep fetched data in the in-memory cache
  pub cache_enabled: bool,
  pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// User-listing endpoint
  pub url: Url,
  /// Request timeout in seconds
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Retries after the initial attempt
  pub attempts: u32,
  /// First retry delay; doubles per attempt
  pub base_delay_ms: u64,
  /// Upper bound on the retry delay
  pub max_delay_ms: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      page_size: 5,
      stale_secs: 300,
      cache_enabled: true,
      retry: RetryConfig::default(),
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
      timeout_secs: 10,
    }
  }
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      attempts: 2,
      base_delay_ms: 1000,
      max_delay_ms: 30_000,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./udir.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/udir/config.yaml
  ///
  /// Every field has a default, so a missing config file is fine.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("udir.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("udir").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}
