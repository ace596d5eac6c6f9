//! Error type for `envlog-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(#[from] envlog_core::hour_key::ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
