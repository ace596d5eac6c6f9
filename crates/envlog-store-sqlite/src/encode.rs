//! Encoding and decoding helpers between envlog domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as `YYYY-MM-DDTHH:MM:SSZ` so that lexical order on
//! the `created_at` column equals chronological order.

use chrono::{DateTime, Utc};
use envlog_core::{
  hour_key::{format_timestamp, parse_timestamp},
  reading::{ReadingMetadata, ReadingWithMetadata, SensorReading},
};

use crate::Result;

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { format_timestamp(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> { Ok(parse_timestamp(s)?) }

// ─── Column lists ────────────────────────────────────────────────────────────

/// Select list shared by every reading query; pairs with [`RawRow::from_row`].
pub const ROW_COLUMNS: &str = "
  r.reading_id, r.temperature, r.humidity, r.pressure, r.gas_resistance,
  r.created_at,
  m.entry_id, m.ac, m.coverings, m.notes, m.created_at AS metadata_created_at";

/// Readings left-joined with their metadata.
pub const ROW_SOURCE: &str =
  "readings r LEFT JOIN reading_metadata m ON m.reading_id = r.reading_id";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `readings` row joined with
/// `reading_metadata`.
pub struct RawRow {
  // readings columns
  pub reading_id:          i64,
  pub temperature:         f64,
  pub humidity:            f64,
  pub pressure:            f64,
  pub gas_resistance:      Option<f64>,
  pub created_at:          String,
  // reading_metadata join
  pub entry_id:            Option<i64>,
  pub ac:                  Option<i64>,
  pub coverings:           Option<i64>,
  pub notes:               Option<String>,
  pub metadata_created_at: Option<String>,
}

impl RawRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reading_id:          row.get(0)?,
      temperature:         row.get(1)?,
      humidity:            row.get(2)?,
      pressure:            row.get(3)?,
      gas_resistance:      row.get(4)?,
      created_at:          row.get(5)?,
      entry_id:            row.get(6)?,
      ac:                  row.get(7)?,
      coverings:           row.get(8)?,
      notes:               row.get(9)?,
      metadata_created_at: row.get(10)?,
    })
  }

  /// Decode into the domain type. The reading's own `created_at` is passed
  /// through as text; only the metadata timestamp is parsed here.
  pub fn into_domain(self) -> Result<ReadingWithMetadata> {
    let metadata = match (self.entry_id, self.metadata_created_at) {
      (Some(entry_id), Some(at)) => Some(ReadingMetadata {
        entry_id,
        reading_id: self.reading_id,
        ac: self.ac,
        coverings: self.coverings,
        notes: self.notes,
        created_at: decode_dt(&at)?,
      }),
      _ => None,
    };

    Ok(ReadingWithMetadata {
      reading: SensorReading {
        id:             self.reading_id,
        temperature:    self.temperature,
        humidity:       self.humidity,
        pressure:       self.pressure,
        gas_resistance: self.gas_resistance,
        created_at:     self.created_at,
      },
      metadata,
    })
  }
}

/// Raw values read directly from a `reading_metadata` row.
pub struct RawMetadata {
  pub entry_id:   i64,
  pub reading_id: i64,
  pub ac:         Option<i64>,
  pub coverings:  Option<i64>,
  pub notes:      Option<String>,
  pub created_at: String,
}

impl RawMetadata {
  pub const COLUMNS: &str = "entry_id, reading_id, ac, coverings, notes, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:   row.get(0)?,
      reading_id: row.get(1)?,
      ac:         row.get(2)?,
      coverings:  row.get(3)?,
      notes:      row.get(4)?,
      created_at: row.get(5)?,
    })
  }

  pub fn into_metadata(self) -> Result<ReadingMetadata> {
    Ok(ReadingMetadata {
      entry_id:   self.entry_id,
      reading_id: self.reading_id,
      ac:         self.ac,
      coverings:  self.coverings,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
