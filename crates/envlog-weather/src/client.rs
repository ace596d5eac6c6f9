//! Async HTTP client for the Open-Meteo hourly forecast API.

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use envlog_core::historical::{HistoricalPoint, WeatherProvider};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Error, Result, cache::TtlCache};

const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m";

// ─── Config ──────────────────────────────────────────────────────────────────

/// Location and request policy for [`OpenMeteoClient`].
#[derive(Debug, Clone)]
pub struct OpenMeteoConfig {
  pub base_url:      String,
  pub latitude:      f64,
  pub longitude:     f64,
  /// Per-attempt timeout.
  pub timeout:       Duration,
  /// Additional attempts after the first one fails.
  pub max_retries:   u32,
  /// Delay before retry `n` is `retry_backoff * n`.
  pub retry_backoff: Duration,
  pub cache_ttl:     Duration,
}

impl Default for OpenMeteoConfig {
  fn default() -> Self {
    Self {
      base_url:      "https://api.open-meteo.com/v1/forecast".to_owned(),
      latitude:      45.5657,
      longitude:     -122.6184,
      timeout:       Duration::from_secs(10),
      max_retries:   5,
      retry_backoff: Duration::from_millis(200),
      cache_ttl:     Duration::from_secs(3600),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ForecastResponse {
  hourly: Hourly,
}

/// Column-oriented hourly series; every vector is indexed by `time`.
#[derive(Deserialize)]
struct Hourly {
  time:                 Vec<i64>,
  temperature_2m:       Vec<Option<f64>>,
  relative_humidity_2m: Vec<Option<f64>>,
}

impl Hourly {
  fn into_points(self) -> Result<Vec<HistoricalPoint>> {
    let len = self.time.len();
    if self.temperature_2m.len() != len || self.relative_humidity_2m.len() != len {
      return Err(Error::Malformed(format!(
        "hourly series lengths differ: time={len}, temperature_2m={}, \
         relative_humidity_2m={}",
        self.temperature_2m.len(),
        self.relative_humidity_2m.len()
      )));
    }

    self
      .time
      .into_iter()
      .zip(self.temperature_2m)
      .zip(self.relative_humidity_2m)
      .map(|((secs, temperature), humidity)| -> Result<HistoricalPoint> {
        let timestamp = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
          Error::Malformed(format!("timestamp {secs} out of range"))
        })?;
        Ok(HistoricalPoint {
          timestamp,
          temperature,
          humidity,
        })
      })
      .collect()
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Weather provider backed by Open-Meteo.
///
/// Successful responses are cached per `(start, end)` for
/// [`OpenMeteoConfig::cache_ttl`]. Failures are never cached.
pub struct OpenMeteoClient {
  client: Client,
  config: OpenMeteoConfig,
  cache:  TtlCache<(NaiveDate, NaiveDate), Vec<HistoricalPoint>>,
}

impl OpenMeteoClient {
  pub fn new(config: OpenMeteoConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(Error::Client)?;
    let cache = TtlCache::new(config.cache_ttl);
    Ok(Self {
      client,
      config,
      cache,
    })
  }

  /// `GET {base_url}?latitude=..&longitude=..&hourly=..&start_date=..&end_date=..`
  async fn request(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<HistoricalPoint>> {
    let resp = self
      .client
      .get(&self.config.base_url)
      .query(&[
        ("latitude", self.config.latitude.to_string()),
        ("longitude", self.config.longitude.to_string()),
        ("hourly", HOURLY_FIELDS.to_owned()),
        ("start_date", start.format("%Y-%m-%d").to_string()),
        ("end_date", end.format("%Y-%m-%d").to_string()),
        ("timeformat", "unixtime".to_owned()),
        ("timezone", "GMT".to_owned()),
      ])
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status(status));
    }

    let body = resp.bytes().await?;
    let parsed: ForecastResponse = serde_json::from_slice(&body)
      .map_err(|e| Error::Malformed(e.to_string()))?;
    parsed.hourly.into_points()
  }

  /// Fetch hourly points for `start..=end`, consulting the cache first and
  /// retrying transient failures with linear backoff.
  pub async fn fetch(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<HistoricalPoint>> {
    if let Some(points) = self.cache.get(&(start, end)).await {
      debug!(%start, %end, points = points.len(), "weather cache hit");
      return Ok(points);
    }

    let mut attempt: u32 = 0;
    loop {
      match self.request(start, end).await {
        Ok(points) => {
          debug!(%start, %end, points = points.len(), "weather history fetched");
          self.cache.insert((start, end), points.clone()).await;
          return Ok(points);
        }
        Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
          attempt += 1;
          let sleep_for = self.config.retry_backoff * attempt;
          warn!(
            error = %e,
            attempt,
            "weather request failed, retrying with backoff"
          );
          tokio::time::sleep(sleep_for).await;
        }
        Err(e) if e.is_retryable() => {
          return Err(Error::Exhausted {
            attempts: attempt + 1,
            last:     Box::new(e),
          });
        }
        Err(e) => return Err(e),
      }
    }
  }
}

impl WeatherProvider for OpenMeteoClient {
  type Error = Error;

  async fn fetch_historical(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<HistoricalPoint>> {
    self.fetch(start, end).await
  }
}
