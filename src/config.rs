use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::pager::DEFAULT_PAGE_SIZE;

pub const DEFAULT_FEED_URL: &str =
  "https://rss.applemarketingtools.com/api/v2/in/apps/top-free/100/apps.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub feed: FeedConfig,
  #[serde(default)]
  pub pager: PagerConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  #[serde(default = "default_feed_url", deserialize_with = "deserialize_url")]
  pub url: Url,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      url: default_feed_url(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

impl FeedConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs.max(1))
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagerConfig {
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

impl Default for PagerConfig {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// When false, every load goes to the network and nothing is persisted
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Database file (default: $XDG_DATA_HOME/appfeed/apps.db)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

fn default_feed_url() -> Url {
  Url::parse(DEFAULT_FEED_URL).expect("default feed URL is valid")
}

fn default_timeout_secs() -> u64 {
  15
}

fn default_page_size() -> usize {
  DEFAULT_PAGE_SIZE
}

fn default_true() -> bool {
  true
}

fn deserialize_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
  D: Deserializer<'de>,
{
  let s = String::deserialize(deserializer)?;
  Url::parse(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./appfeed.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/appfeed/config.yaml
  ///
  /// With no file found the built-in defaults are used. `APPFEED_FEED_URL`
  /// overrides the feed URL either way.
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

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    config.with_env_overrides()
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("appfeed.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("appfeed").join("config.yaml");
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

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is an empty mapping, not an error
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  fn with_env_overrides(self) -> Result<Self> {
    match std::env::var("APPFEED_FEED_URL") {
      Ok(url) => self.with_feed_url(&url),
      Err(_) => Ok(self),
    }
  }

  fn with_feed_url(mut self, url: &str) -> Result<Self> {
    self.feed.url = Url::parse(url.trim())
      .map_err(|e| eyre!("Invalid APPFEED_FEED_URL '{}': {}", url, e))?;
    Ok(self)
  }

  /// Database path, falling back to the data directory.
  pub fn cache_path(&self) -> Result<PathBuf> {
    match &self.cache.path {
      Some(path) => Ok(path.clone()),
      None => crate::store::SqliteStore::default_path(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.feed.url.as_str(), DEFAULT_FEED_URL);
    assert_eq!(config.feed.timeout(), Duration::from_secs(15));
    assert_eq!(config.pager.page_size, 3);
    assert!(config.cache.enabled);
    assert!(config.cache.path.is_none());
  }

  #[test]
  fn test_empty_file_uses_defaults() {
    let config = Config::parse("  \n").unwrap();
    assert_eq!(config.pager.page_size, 3);
  }

  #[test]
  fn test_partial_file() {
    let config = Config::parse(
      r#"
pager:
  page_size: 10
cache:
  enabled: false
  path: /tmp/apps.db
"#,
    )
    .unwrap();

    assert_eq!(config.pager.page_size, 10);
    assert!(!config.cache.enabled);
    assert_eq!(config.cache_path().unwrap(), PathBuf::from("/tmp/apps.db"));
    assert_eq!(config.feed.url.as_str(), DEFAULT_FEED_URL);
  }

  #[test]
  fn test_feed_section() {
    let config = Config::parse(
      r#"
feed:
  url: https://example.com/feed.json
  timeout_secs: 0
"#,
    )
    .unwrap();

    assert_eq!(config.feed.url.as_str(), "https://example.com/feed.json");
    // Zero would disable the timeout entirely
    assert_eq!(config.feed.timeout(), Duration::from_secs(1));
  }

  #[test]
  fn test_invalid_url_is_rejected() {
    assert!(Config::parse("feed:\n  url: not a url\n").is_err());
    assert!(Config::default().with_feed_url("::").is_err());
  }

  #[test]
  fn test_feed_url_override() {
    let config = Config::default()
      .with_feed_url(" http://localhost:8080/apps.json ")
      .unwrap();
    assert_eq!(config.feed.url.as_str(), "http://localhost:8080/apps.json");
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let result = Config::load(Some(Path::new("/definitely/not/here.yaml")));
    assert!(result.is_err());
  }
}
