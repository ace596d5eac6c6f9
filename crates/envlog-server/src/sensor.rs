//! BME680 access through the Linux Industrial I/O sysfs interface.
//!
//! The `bme680` kernel driver exposes one file per channel under the device
//! directory. Values are plain decimal text in these units:
//!
//! | File | Unit |
//! |------|------|
//! | `in_temp_input` | m°C |
//! | `in_humidityrelative_input` | m%RH |
//! | `in_pressure_input` | kPa |
//! | `in_resistance_input` | Ω (absent or unreadable until the gas heater settles) |

use std::path::{Path, PathBuf};

use envlog_core::{reading::RawSample, sensor::Sensor};
use tracing::debug;

use crate::{Error, Result};

const TEMPERATURE: &str = "in_temp_input";
const HUMIDITY: &str = "in_humidityrelative_input";
const PRESSURE: &str = "in_pressure_input";
const GAS_RESISTANCE: &str = "in_resistance_input";

/// A BME680 bound to the IIO device at `device`.
pub struct IioSensor {
  device: PathBuf,
}

impl IioSensor {
  pub fn new(device: impl Into<PathBuf>) -> Self {
    Self {
      device: device.into(),
    }
  }

  pub fn device(&self) -> &Path { &self.device }

  async fn read_channel(&self, name: &str) -> Result<f64> {
    let path = self.device.join(name);
    let raw = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => raw,
      Err(source) => return Err(Error::SensorIo { path, source }),
    };
    let value = raw.trim();
    value.parse().map_err(|_| Error::SensorValue {
      value: value.to_owned(),
      path,
    })
  }
}

impl Sensor for IioSensor {
  type Error = Error;

  async fn read(&self) -> Result<RawSample> {
    let temperature = self.read_channel(TEMPERATURE).await?;
    let humidity = self.read_channel(HUMIDITY).await?;
    let pressure = self.read_channel(PRESSURE).await?;
    let gas_resistance = match self.read_channel(GAS_RESISTANCE).await {
      Ok(ohms) => Some(ohms),
      Err(e) => {
        debug!(error = %e, "gas resistance unavailable");
        None
      }
    };

    Ok(RawSample {
      temperature_c:       temperature / 1000.0,
      humidity_pct:        humidity / 1000.0,
      pressure_hpa:        pressure * 10.0,
      gas_resistance_ohms: gas_resistance,
    })
  }
}
