//! Historical weather points and the provider trait that supplies them.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One hourly sample of outdoor weather. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
  /// Nominally on the hour; the merger truncates it again regardless.
  pub timestamp:   DateTime<Utc>,
  /// °C
  pub temperature: Option<f64>,
  /// %RH
  pub humidity:    Option<f64>,
}

/// Abstraction over a source of hourly weather history.
///
/// The provider is day-granular: `end` is inclusive of the whole day.
/// Implementations own their timeout and retry policy; an `Err` means the
/// provider is unavailable for this request.
pub trait WeatherProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_historical(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<HistoricalPoint>, Self::Error>> + Send + '_;
}
