use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::QueryConfig;

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub query: QuerySettings,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Request timeout in seconds; `null` leaves requests unbounded
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> Option<u64> {
  Some(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySettings {
  /// Seconds before cached data is refetched in the background
  #[serde(default = "default_stale_time_secs")]
  pub stale_time_secs: u64,
  /// Refetch stale queries when the terminal regains focus
  #[serde(default)]
  pub refetch_on_focus: bool,
}

impl Default for QuerySettings {
  fn default() -> Self {
    Self {
      stale_time_secs: default_stale_time_secs(),
      refetch_on_focus: false,
    }
  }
}

fn default_stale_time_secs() -> u64 {
  5 * 60
}

impl QuerySettings {
  pub fn to_query_config(&self) -> QueryConfig {
    QueryConfig {
      stale_time: Duration::from_secs(self.stale_time_secs),
      refetch_on_focus: self.refetch_on_focus,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive (e.g. "info", "rmtui=debug"); RUST_LOG takes precedence
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Log file path (default: $XDG_DATA_HOME/rmtui/rmtui.log)
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

fn default_log_level() -> String {
  "info".to_string()
}

impl LogConfig {
  /// Resolve the log file location.
  pub fn file_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.file {
      return Ok(path.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("rmtui").join("rmtui.log"))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./rmtui.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rmtui/config.yaml
  ///
  /// Without a config file every setting takes its default.
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
    let local = PathBuf::from("rmtui.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rmtui").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
    // An empty file is valid and means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }
}
