//! The aligner: attaches an [`HourKey`] to each stored reading.
//!
//! Pure and order-preserving. Every input produces exactly one output; a
//! reading whose `created_at` cannot be parsed keeps its place and carries
//! the [`ParseError`] instead of a key.

use tracing::warn;

use crate::{
  hour_key::{HourKey, ParseError, parse_timestamp},
  reading::{ReadingWithMetadata, SensorReading},
};

/// A reading paired with the hour bucket it falls into.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReading {
  pub row:      ReadingWithMetadata,
  pub hour_key: Result<HourKey, ParseError>,
}

/// Compute the hour key of a single reading.
pub fn hour_key_of(reading: &SensorReading) -> Result<HourKey, ParseError> {
  parse_timestamp(&reading.created_at).map(HourKey::of)
}

/// Align `rows` 1:1, preserving order.
pub fn align(rows: Vec<ReadingWithMetadata>) -> Vec<AlignedReading> {
  rows
    .into_iter()
    .map(|row| {
      let hour_key = hour_key_of(&row.reading);
      if let Err(e) = &hour_key {
        warn!(reading_id = row.reading.id, error = %e, "reading has an unparseable timestamp");
      }
      AlignedReading { row, hour_key }
    })
    .collect()
}
