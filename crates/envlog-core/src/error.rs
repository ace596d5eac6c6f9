//! Error types for `envlog-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required input was missing or malformed. Raised before any I/O.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("invalid range: start date {start} is after end date {end}")]
  InvalidRange { start: NaiveDate, end: NaiveDate },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from a [`ReadingStore`](crate::store::ReadingStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
