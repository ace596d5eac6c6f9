//! Error type for `envlog-server`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {}: {source}", path.display())]
  SensorIo {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("unparseable value {value:?} in {}", path.display())]
  SensorValue { path: PathBuf, value: String },

  #[error("sensor read failed: {0}")]
  Sensor(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
