//! Sensor readings and their optional annotation metadata.
//!
//! A reading is immutable once the store has assigned its id. Metadata is a
//! separate, mutable record attached to at most one reading and edited
//! through [`MetadataPatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Samples ─────────────────────────────────────────────────────────────────

/// A measurement in the units the BME680 reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
  /// Degrees Celsius.
  pub temperature_c:       f64,
  /// Relative humidity, percent.
  pub humidity_pct:        f64,
  /// Hectopascal.
  pub pressure_hpa:        f64,
  /// Ohms. `None` while the gas heater has not produced a stable reading.
  pub gas_resistance_ohms: Option<f64>,
}

impl RawSample {
  /// Convert to storage units: pressure to kPa and gas resistance to kΩ.
  pub fn convert(self) -> SensorSample {
    SensorSample {
      temperature:    self.temperature_c,
      humidity:       self.humidity_pct,
      pressure:       self.pressure_hpa / 10.0,
      gas_resistance: self.gas_resistance_ohms.map(|ohms| ohms / 1000.0),
    }
  }
}

/// A measurement in storage units, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
  /// °C
  pub temperature:    f64,
  /// %RH
  pub humidity:       f64,
  /// kPa
  pub pressure:       f64,
  /// kΩ
  pub gas_resistance: Option<f64>,
}

// ─── Reading ─────────────────────────────────────────────────────────────────

/// A persisted reading. The id is assigned by the store and increases
/// monotonically with insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
  pub id:             i64,
  pub temperature:    f64,
  pub humidity:       f64,
  pub pressure:       f64,
  pub gas_resistance: Option<f64>,
  /// Creation time exactly as persisted, normally `YYYY-MM-DDTHH:MM:SSZ`.
  /// Parsed by [`crate::align`] rather than on read so a corrupt row
  /// surfaces per record instead of failing the whole query.
  pub created_at:     String,
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Manual annotations attached to a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingMetadata {
  pub entry_id:   i64,
  pub reading_id: i64,
  /// Air-conditioning state at the time of the reading.
  pub ac:         Option<i64>,
  /// Number of window coverings drawn.
  pub coverings:  Option<i64>,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::ReadingStore::insert_metadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMetadata {
  pub reading_id: i64,
  pub ac:         Option<i64>,
  pub coverings:  Option<i64>,
  pub notes:      Option<String>,
}

/// A partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataPatch {
  pub ac:        Option<i64>,
  #[serde(alias = "converings")]
  pub coverings: Option<i64>,
  pub notes:     Option<String>,
}

impl MetadataPatch {
  pub fn is_empty(&self) -> bool {
    self.ac.is_none() && self.coverings.is_none() && self.notes.is_none()
  }
}

// ─── Joined row ──────────────────────────────────────────────────────────────

/// A reading left-joined with its metadata, as returned by range queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingWithMetadata {
  #[serde(flatten)]
  pub reading:  SensorReading,
  pub metadata: Option<ReadingMetadata>,
}
