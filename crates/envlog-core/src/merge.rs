//! The merger: a left outer join of aligned readings against hourly weather.
//!
//! Every reading appears in the output exactly once and in input order. A
//! reading without a matching point gets `null` historical fields; it is
//! never dropped.

use std::collections::{HashMap, hash_map::Entry};

use serde::Serialize;

use crate::{
  align::AlignedReading,
  historical::HistoricalPoint,
  hour_key::HourKey,
  reading::{ReadingMetadata, ReadingWithMetadata, SensorReading},
};

// ─── Output types ────────────────────────────────────────────────────────────

/// Weather fields joined onto a reading. Serialised as explicit `null`s when
/// there was no match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HistoricalFields {
  pub historical_temperature: Option<f64>,
  pub historical_humidity:    Option<f64>,
}

impl From<&HistoricalPoint> for HistoricalFields {
  fn from(p: &HistoricalPoint) -> Self {
    Self {
      historical_temperature: p.temperature,
      historical_humidity:    p.humidity,
    }
  }
}

/// A reading as returned by range queries.
///
/// `historical` is `None` when enrichment was not requested or the provider
/// was unavailable; those fields are then omitted from the JSON rather than
/// nulled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedReading {
  #[serde(flatten)]
  pub reading:         SensorReading,
  pub metadata:        Option<ReadingMetadata>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hour_key:        Option<HourKey>,
  #[serde(flatten)]
  pub historical:      Option<HistoricalFields>,
  /// Set when `created_at` could not be parsed.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub alignment_error: Option<String>,
}

impl EnrichedReading {
  /// A reading with no alignment or weather attached.
  pub fn sensor_only(row: ReadingWithMetadata) -> Self {
    Self {
      reading:         row.reading,
      metadata:        row.metadata,
      hour_key:        None,
      historical:      None,
      alignment_error: None,
    }
  }
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Index points by the hour their own timestamp truncates to.
///
/// When two points share an hour the first one wins, so the result depends
/// only on provider order.
pub fn index_by_hour(points: &[HistoricalPoint]) -> HashMap<HourKey, &HistoricalPoint> {
  let mut lookup = HashMap::with_capacity(points.len());
  for point in points {
    if let Entry::Vacant(slot) = lookup.entry(HourKey::of(point.timestamp)) {
      slot.insert(point);
    }
  }
  lookup
}

// ─── Merge ───────────────────────────────────────────────────────────────────

/// Join `aligned` against `points`.
///
/// Readings with a parse error keep `hour_key = None` and get `null`
/// historical fields plus an `alignment_error` marker.
pub fn merge(aligned: Vec<AlignedReading>, points: &[HistoricalPoint]) -> Vec<EnrichedReading> {
  let lookup = index_by_hour(points);
  aligned
    .into_iter()
    .map(|a| {
      let historical = a
        .hour_key
        .as_ref()
        .ok()
        .and_then(|key| lookup.get(key))
        .map(|p| HistoricalFields::from(*p))
        .unwrap_or_default();
      into_enriched(a, Some(historical))
    })
    .collect()
}

/// Keep alignment but attach no weather at all. Used when the provider is
/// unavailable.
pub fn without_history(aligned: Vec<AlignedReading>) -> Vec<EnrichedReading> {
  aligned.into_iter().map(|a| into_enriched(a, None)).collect()
}

fn into_enriched(a: AlignedReading, historical: Option<HistoricalFields>) -> EnrichedReading {
  let (hour_key, alignment_error) = match a.hour_key {
    Ok(key) => (Some(key), None),
    Err(e) => (None, Some(e.to_string())),
  };
  EnrichedReading {
    reading: a.row.reading,
    metadata: a.row.metadata,
    hour_key,
    historical,
    alignment_error,
  }
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeZone, Utc};
  use serde_json::json;

  use super::*;
  use crate::align::align;

  fn row(id: i64, created_at: &str) -> ReadingWithMetadata {
    ReadingWithMetadata {
      reading:  SensorReading {
        id,
        temperature: 22.0,
        humidity: 40.0,
        pressure: 101.0,
        gas_resistance: Some(120.0),
        created_at: created_at.into(),
      },
      metadata: None,
    }
  }

  fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, h, m, 0).unwrap()
  }

  fn point(t: DateTime<Utc>, temperature: Option<f64>, humidity: Option<f64>) -> HistoricalPoint {
    HistoricalPoint { timestamp: t, temperature, humidity }
  }

  #[test]
  fn matches_reading_to_its_hour() {
    let aligned = align(vec![row(1, "2024-06-01T14:23:10Z")]);
    let points = [
      point(at(1, 13, 0), Some(17.0), Some(70.0)),
      point(at(1, 14, 0), Some(18.4), Some(65.0)),
    ];

    let merged = merge(aligned, &points);
    assert_eq!(merged.len(), 1);
    let h = merged[0].historical.unwrap();
    assert_eq!(h.historical_temperature, Some(18.4));
    assert_eq!(h.historical_humidity, Some(65.0));
    assert_eq!(merged[0].hour_key.unwrap().to_string(), "2024-06-01T14:00:00Z");
  }

  #[test]
  fn unmatched_readings_get_null_fields_and_are_kept() {
    let aligned = align(vec![
      row(3, "2024-06-01T16:05:00Z"),
      row(2, "2024-06-01T14:10:00Z"),
      row(1, "2024-06-01T09:00:00Z"),
    ]);
    let points = [point(at(1, 14, 0), Some(18.4), None)];

    let merged = merge(aligned, &points);
    let ids: Vec<i64> = merged.iter().map(|e| e.reading.id).collect();
    assert_eq!(ids, [3, 2, 1]);
    assert_eq!(merged[0].historical, Some(HistoricalFields::default()));
    assert_eq!(merged[1].historical.unwrap().historical_temperature, Some(18.4));
    assert_eq!(merged[1].historical.unwrap().historical_humidity, None);
    assert_eq!(merged[2].historical, Some(HistoricalFields::default()));
  }

  #[test]
  fn output_length_always_equals_input_length() {
    let rows: Vec<_> = (0..24)
      .map(|h| row(h, &format!("2024-06-01T{h:02}:30:00Z")))
      .collect();
    let point_sets: [Vec<HistoricalPoint>; 3] = [
      Vec::new(),
      (0..24).step_by(3).map(|h| point(at(1, h, 0), Some(10.0), Some(50.0))).collect(),
      (0..48).map(|h| point(at(1 + h / 24, h % 24, 0), Some(11.0), None)).collect(),
    ];
    for points in &point_sets {
      assert_eq!(merge(align(rows.clone()), points).len(), rows.len());
    }
  }

  #[test]
  fn empty_history_nulls_every_reading() {
    let merged = merge(
      align(vec![row(2, "2024-06-01T10:00:00Z"), row(1, "2024-06-01T09:00:00Z")]),
      &[],
    );
    assert!(merged.iter().all(|e| e.historical == Some(HistoricalFields::default())));
  }

  #[test]
  fn empty_readings_give_empty_output() {
    let points = [point(at(1, 14, 0), Some(18.4), Some(60.0))];
    assert!(merge(Vec::new(), &points).is_empty());
  }

  #[test]
  fn point_timestamps_are_truncated_before_lookup() {
    let aligned = align(vec![row(1, "2024-06-01T14:50:00Z")]);
    let points = [point(at(1, 14, 1), Some(19.0), Some(55.0))];
    let merged = merge(aligned, &points);
    assert_eq!(merged[0].historical.unwrap().historical_temperature, Some(19.0));
  }

  #[test]
  fn first_point_wins_on_duplicate_hours() {
    let points = [
      point(at(1, 14, 0), Some(18.0), None),
      point(at(1, 14, 30), Some(25.0), None),
    ];
    let lookup = index_by_hour(&points);
    assert_eq!(lookup.len(), 1);
    assert_eq!(lookup[&HourKey::of(at(1, 14, 0))].temperature, Some(18.0));
  }

  #[test]
  fn parse_failures_carry_a_marker() {
    let aligned = align(vec![row(1, "garbage")]);
    let merged = merge(aligned, &[point(at(1, 14, 0), Some(18.4), None)]);
    assert_eq!(merged.len(), 1);
    assert!(merged[0].hour_key.is_none());
    assert_eq!(merged[0].historical, Some(HistoricalFields::default()));
    assert!(merged[0].alignment_error.as_deref().unwrap().contains("garbage"));
  }

  #[test]
  fn without_history_omits_weather_fields() {
    let enriched = without_history(align(vec![row(1, "2024-06-01T14:23:10Z")]));
    assert!(enriched[0].historical.is_none());
    assert!(enriched[0].hour_key.is_some());
  }

  #[test]
  fn serialises_nulls_for_unmatched_and_omits_for_sensor_only() {
    let merged = merge(align(vec![row(1, "2024-06-01T14:23:10Z")]), &[]);
    let value = serde_json::to_value(&merged[0]).unwrap();
    assert_eq!(value["id"], json!(1));
    assert_eq!(value["hour_key"], json!("2024-06-01T14:00:00Z"));
    assert_eq!(value["historical_temperature"], json!(null));
    assert!(value.as_object().unwrap().contains_key("historical_humidity"));
    assert!(!value.as_object().unwrap().contains_key("alignment_error"));

    let plain = EnrichedReading::sensor_only(row(2, "2024-06-01T14:23:10Z"));
    let value = serde_json::to_value(&plain).unwrap();
    let obj = value.as_object().unwrap();
    assert!(!obj.contains_key("historical_temperature"));
    assert!(!obj.contains_key("hour_key"));
    assert_eq!(obj["metadata"], json!(null));
  }
}
