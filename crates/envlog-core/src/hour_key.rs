//! `HourKey`: a UTC timestamp truncated to the top of the hour.
//!
//! Sensor readings arrive at arbitrary seconds while weather history is
//! sampled hourly. Both sides are reduced to an `HourKey` and joined on it.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Textual form of every timestamp envlog writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const SECONDS_PER_HOUR: i64 = 3600;

/// A timestamp string that could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse timestamp {value:?}: {reason}")]
pub struct ParseError {
  pub value:  String,
  pub reason: String,
}

/// Parse a stored UTC timestamp.
///
/// Accepts RFC 3339 (`2024-06-01T14:23:10Z`, `...+02:00`), the same without a
/// designator, and SQLite's `CURRENT_TIMESTAMP` form (`2024-06-01 14:23:10`).
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ParseError> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }

  let naive = s.strip_suffix('Z').unwrap_or(s);
  NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S")
    .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S"))
    .map(|dt| dt.and_utc())
    .map_err(|e| ParseError { value: s.to_owned(), reason: e.to_string() })
}

/// Format a timestamp the way the store persists it.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
  dt.format(TIMESTAMP_FORMAT).to_string()
}

// ─── HourKey ─────────────────────────────────────────────────────────────────

/// The hour bucket a timestamp falls into.
///
/// `HourKey::of` is idempotent and monotonic: truncating an already
/// truncated timestamp is a no-op, and `t1 <= t2` implies
/// `HourKey::of(t1) <= HourKey::of(t2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HourKey(DateTime<Utc>);

impl HourKey {
  pub fn of(t: DateTime<Utc>) -> Self {
    let excess = TimeDelta::seconds(t.timestamp().rem_euclid(SECONDS_PER_HOUR))
      + TimeDelta::nanoseconds(i64::from(t.timestamp_subsec_nanos()));
    Self(t - excess)
  }

  /// The start of the hour as a timestamp.
  pub fn start(&self) -> DateTime<Utc> { self.0 }
}

impl From<DateTime<Utc>> for HourKey {
  fn from(t: DateTime<Utc>) -> Self { Self::of(t) }
}

impl fmt::Display for HourKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
  }
}

impl FromStr for HourKey {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    parse_timestamp(s).map(Self::of)
  }
}

impl Serialize for HourKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
  }

  #[test]
  fn truncates_to_top_of_hour() {
    let key = HourKey::of(at(14, 23, 10));
    assert_eq!(key.to_string(), "2024-06-01T14:00:00Z");
    assert_eq!(key.start(), at(14, 0, 0));
  }

  #[test]
  fn drops_subsecond_precision() {
    let t = at(9, 59, 59) + TimeDelta::milliseconds(999);
    assert_eq!(HourKey::of(t).start(), at(9, 0, 0));
  }

  #[test]
  fn truncation_is_idempotent() {
    for t in [at(0, 0, 0), at(14, 23, 10), at(23, 59, 59)] {
      let once = HourKey::of(t);
      let twice = HourKey::of(once.start());
      assert_eq!(once, twice);
      let reparsed: HourKey = once.to_string().parse().unwrap();
      assert_eq!(reparsed, once);
    }
  }

  #[test]
  fn truncation_is_monotonic() {
    let times = [at(0, 0, 0), at(0, 59, 59), at(1, 0, 0), at(13, 1, 0), at(13, 2, 0)];
    for pair in times.windows(2) {
      assert!(HourKey::of(pair[0]) <= HourKey::of(pair[1]));
    }
  }

  #[test]
  fn handles_pre_epoch_timestamps() {
    let t = Utc.with_ymd_and_hms(1969, 12, 31, 23, 30, 15).unwrap();
    assert_eq!(HourKey::of(t).to_string(), "1969-12-31T23:00:00Z");
  }

  #[test]
  fn parses_trailing_utc_designator() {
    assert_eq!(parse_timestamp("2024-06-01T14:23:10Z").unwrap(), at(14, 23, 10));
  }

  #[test]
  fn parses_offset_and_bare_forms() {
    assert_eq!(
      parse_timestamp("2024-06-01T16:23:10+02:00").unwrap(),
      at(14, 23, 10)
    );
    assert_eq!(parse_timestamp("2024-06-01T14:23:10").unwrap(), at(14, 23, 10));
    assert_eq!(parse_timestamp("2024-06-01 14:23:10").unwrap(), at(14, 23, 10));
  }

  #[test]
  fn rejects_garbage() {
    let err = parse_timestamp("yesterday-ish").unwrap_err();
    assert_eq!(err.value, "yesterday-ish");
  }

  #[test]
  fn serializes_as_string() {
    let json = serde_json::to_string(&HourKey::of(at(14, 23, 10))).unwrap();
    assert_eq!(json, "\"2024-06-01T14:00:00Z\"");
  }
}
