//! Error type for `envlog-weather`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  /// Connection failure, timeout or truncated body.
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("weather service responded with {0}")]
  Status(StatusCode),

  #[error("malformed weather response: {0}")]
  Malformed(String),

  #[error("gave up after {attempts} attempts: {last}")]
  Exhausted { attempts: u32, last: Box<Error> },
}

impl Error {
  /// Whether another attempt could plausibly succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      Self::Request(_) => true,
      Self::Status(status) => {
        status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
      }
      Self::Client(_) | Self::Malformed(_) | Self::Exhausted { .. } => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
