//! The collection loop: read the sensor, convert units, persist.

use std::{sync::Arc, time::Duration};

use envlog_core::{reading::SensorReading, sensor::Sensor, store::ReadingStore};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

use crate::{Error, Result};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Polls a [`Sensor`] on a fixed interval and appends each sample to a
/// [`ReadingStore`].
pub struct Collector<Z, S> {
  sensor:   Z,
  store:    Arc<S>,
  interval: Duration,
}

impl<Z, S> Collector<Z, S>
where
  Z: Sensor,
  S: ReadingStore,
{
  /// A zero `interval` is raised to one millisecond.
  pub fn new(sensor: Z, store: Arc<S>, interval: Duration) -> Self {
    Self {
      sensor,
      store,
      interval: interval.max(MIN_INTERVAL),
    }
  }

  /// Take and store a single reading.
  pub async fn tick(&self) -> Result<SensorReading> {
    let raw = self
      .sensor
      .read()
      .await
      .map_err(|e| Error::Sensor(Box::new(e)))?;
    let reading = self
      .store
      .insert_reading(raw.convert())
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;

    info!(
      reading_id = reading.id,
      temperature = reading.temperature,
      humidity = reading.humidity,
      pressure = reading.pressure,
      gas_resistance = reading.gas_resistance,
      "reading collected"
    );
    Ok(reading)
  }

  /// Tick forever. A failed tick is logged and the loop carries on.
  pub async fn run(self) {
    let mut ticker = time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_ms = self.interval.as_millis() as u64, "collector loop started");

    loop {
      ticker.tick().await;
      if let Err(e) = self.tick().await {
        error!(error = %e, "failed to collect reading");
      }
    }
  }
}
