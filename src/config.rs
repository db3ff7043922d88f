use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::query::QueryOptions;

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "JOBPULSE_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub query: QueryConfig,
  pub search: SearchConfig,
  pub jobs: JobsConfig,
  pub dashboard: DashboardConfig,
  /// File to write logs to (defaults to $XDG_DATA_HOME/jobpulse/jobpulse.log)
  pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  #[serde(deserialize_with = "deserialize_trimmed_url")]
  pub base_url: String,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000/api".to_string(),
      timeout_secs: 10,
    }
  }
}

fn deserialize_trimmed_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let s = String::deserialize(deserializer)?;
  Ok(s.trim().trim_end_matches('/').to_string())
}

/// Defaults applied to every query unless a view overrides them
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
  pub stale_time_secs: u64,
  pub retry: u32,
  /// Base of the exponential retry backoff
  pub retry_delay_ms: u64,
  pub gc_time_secs: u64,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 300,
      retry: 1,
      retry_delay_ms: 1000,
      gc_time_secs: 300,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub debounce_ms: u64,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self { debounce_ms: 500 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
  pub page_size: u32,
}

impl Default for JobsConfig {
  fn default() -> Self {
    Self { page_size: 20 }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
  pub overview_refresh_secs: u64,
  pub top_skills_limit: u32,
  pub hiring_trend_days: u32,
}

impl Default for DashboardConfig {
  fn default() -> Self {
    Self {
      overview_refresh_secs: 300,
      top_skills_limit: 15,
      hiring_trend_days: 30,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./jobpulse.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/jobpulse/config.yaml
  ///
  /// With no file found the defaults are used. `JOBPULSE_API_URL` overrides
  /// the API base URL either way.
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

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var(API_URL_ENV) {
      if !url.trim().is_empty() {
        config.api.base_url = url.trim().trim_end_matches('/').to_string();
      }
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("jobpulse.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("jobpulse").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }

  pub fn debounce_delay(&self) -> Duration {
    Duration::from_millis(self.search.debounce_ms)
  }

  pub fn overview_refresh(&self) -> Duration {
    Duration::from_secs(self.dashboard.overview_refresh_secs)
  }

  /// Query options every subscription starts from
  pub fn query_defaults(&self) -> QueryOptions {
    QueryOptions::default()
      .with_stale_time(Duration::from_secs(self.query.stale_time_secs))
      .with_retry(self.query.retry)
      .with_retry_delay(Duration::from_millis(self.query.retry_delay_ms))
      .with_gc_time(Duration::from_secs(self.query.gc_time_secs))
  }

  /// Log file location: configured path or $XDG_DATA_HOME/jobpulse/jobpulse.log
  pub fn log_path(&self) -> PathBuf {
    self.log_file.clone().unwrap_or_else(|| {
      dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("jobpulse")
        .join("jobpulse.log")
    })
  }
}
