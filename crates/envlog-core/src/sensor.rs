//! The `Sensor` capability polled by the collector.

use std::future::Future;

use crate::reading::RawSample;

/// A source of environmental samples, e.g. a BME680 exposed over IIO.
///
/// The collector owns the sensor and calls [`Sensor::read`] once per tick.
/// A failed read is reported, never retried within the same tick.
pub trait Sensor: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn read(&self) -> impl Future<Output = Result<RawSample, Self::Error>> + Send + '_;
}
