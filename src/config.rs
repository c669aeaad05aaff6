use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the bearer token for authenticated routes.
pub const API_TOKEN_ENV: &str = "MEDIAFLOW_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Backend root, e.g. `https://api.example.com/api/v1`
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default = "default_user_agent")]
  pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_user_agent() -> String {
  format!("mediaflow/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Disabled cache means no fallback and no writes
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Database location (defaults to the platform data directory)
  pub path: Option<PathBuf>,
  /// Ignore cached responses older than this on fallback
  pub max_fallback_age_secs: Option<u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
      max_fallback_age_secs: None,
    }
  }
}

impl CacheConfig {
  pub fn max_fallback_age(&self) -> Option<Duration> {
    self.max_fallback_age_secs.map(Duration::from_secs)
  }
}

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
  /// Default filter directive; `RUST_LOG` takes precedence
  #[serde(default = "default_level")]
  pub level: String,
  /// Write daily log files here instead of stderr
  pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      directory: None,
    }
  }
}

fn default_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./mediaflow.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/mediaflow/config.yaml
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
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/mediaflow/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("mediaflow.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("mediaflow").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  pub fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml_str(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Invalid configuration: {}", e))?;

    if config.api.base_url.trim().is_empty() {
      return Err(eyre!("api.base_url must not be empty"));
    }

    Ok(config)
  }

  /// Bearer token from `MEDIAFLOW_API_TOKEN`, if set and non-empty.
  pub fn api_token() -> Option<String> {
    std::env::var(API_TOKEN_ENV)
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_defaults() {
    let config = Config::from_yaml_str("api:\n  base_url: https://api.example.com/api/v1\n").unwrap();

    assert_eq!(config.api.timeout_secs, 30);
    assert!(config.api.user_agent.starts_with("mediaflow/"));
    assert!(config.cache.enabled);
    assert!(config.cache.path.is_none());
    assert!(config.cache.max_fallback_age().is_none());
    assert_eq!(config.logging.level, "info");
  }

  #[test]
  fn test_full_config() {
    let yaml = r#"
api:
  base_url: https://api.example.com/api/v1
  timeout_secs: 5
  user_agent: tv-app/2.0
cache:
  enabled: false
  path: /tmp/mediaflow.db
  max_fallback_age_secs: 3600
logging:
  level: debug
  directory: /var/log/mediaflow
"#;
    let config = Config::from_yaml_str(yaml).unwrap();

    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.api.user_agent, "tv-app/2.0");
    assert!(!config.cache.enabled);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/mediaflow.db")));
    assert_eq!(config.cache.max_fallback_age(), Some(Duration::from_secs(3600)));
    assert_eq!(config.logging.directory, Some(PathBuf::from("/var/log/mediaflow")));
  }

  #[test]
  fn test_missing_or_empty_base_url_is_rejected() {
    assert!(Config::from_yaml_str("cache:\n  enabled: true\n").is_err());
    assert!(Config::from_yaml_str("api:\n  base_url: \"  \"\n").is_err());
  }

  #[test]
  fn test_load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "api:\n  base_url: http://localhost:8080\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.api.base_url, "http://localhost:8080");

    assert!(Config::load(Some(&dir.path().join("missing.yaml"))).is_err());
  }
}
