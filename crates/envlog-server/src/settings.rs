//! Server configuration, layered from an optional TOML file and `ENVLOG_*`
//! environment variables.
//!
//! Nested keys use `__` in the environment, e.g.
//! `ENVLOG_WEATHER__LATITUDE=51.5`.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use envlog_weather::OpenMeteoConfig;
use serde::Deserialize;

const ENV_PREFIX: &str = "ENVLOG";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration. Every field has a default, so an empty or
/// missing config file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub collector:  CollectorConfig,
  pub weather:    WeatherConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "0.0.0.0".to_owned(),
      port:       5000,
      store_path: PathBuf::from("envlog.db"),
      collector:  CollectorConfig::default(),
      weather:    WeatherConfig::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
  pub enabled:       bool,
  pub interval_secs: u64,
  /// sysfs directory of the BME680's IIO device.
  pub iio_device:    PathBuf,
}

impl Default for CollectorConfig {
  fn default() -> Self {
    Self {
      enabled:       true,
      interval_secs: 60,
      iio_device:    PathBuf::from("/sys/bus/iio/devices/iio:device0"),
    }
  }
}

impl CollectorConfig {
  pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs) }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
  pub base_url:         String,
  pub latitude:         f64,
  pub longitude:        f64,
  pub timeout_secs:     u64,
  pub max_retries:      u32,
  pub retry_backoff_ms: u64,
  pub cache_ttl_secs:   u64,
}

impl Default for WeatherConfig {
  fn default() -> Self {
    let client = OpenMeteoConfig::default();
    Self {
      base_url:         client.base_url,
      latitude:         client.latitude,
      longitude:        client.longitude,
      timeout_secs:     client.timeout.as_secs(),
      max_retries:      client.max_retries,
      retry_backoff_ms: client.retry_backoff.as_millis() as u64,
      cache_ttl_secs:   client.cache_ttl.as_secs(),
    }
  }
}

impl WeatherConfig {
  pub fn client_config(&self) -> OpenMeteoConfig {
    OpenMeteoConfig {
      base_url:      self.base_url.clone(),
      latitude:      self.latitude,
      longitude:     self.longitude,
      timeout:       Duration::from_secs(self.timeout_secs),
      max_retries:   self.max_retries,
      retry_backoff: Duration::from_millis(self.retry_backoff_ms),
      cache_ttl:     Duration::from_secs(self.cache_ttl_secs),
    }
  }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Read `path` (if it exists) and overlay the environment.
///
/// A zero `collector.interval_secs` is rejected.
pub fn load(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  let cfg: ServerConfig = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()?;

  if cfg.collector.interval_secs == 0 {
    return Err(config::ConfigError::Message(
      "collector.interval_secs must be at least 1".to_owned(),
    ));
  }
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
