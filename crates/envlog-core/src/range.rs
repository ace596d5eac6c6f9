//! Day-granular query ranges and their boundary policy.
//!
//! Dates are inclusive on both ends: a range `[d1, d2]` covers
//! `d1 00:00:00` through `d2 23:59:59` UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::{Error, Result, store::ReadingBounds};

/// A validated query range. `end = None` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  start: NaiveDate,
  end:   Option<NaiveDate>,
}

impl DateRange {
  /// Validate presence and ordering. Fails without side effects.
  pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
    let start = start.ok_or_else(|| Error::Validation("start_date is required".into()))?;
    if let Some(end) = end
      && start > end
    {
      return Err(Error::InvalidRange { start, end });
    }
    Ok(Self { start, end })
  }

  /// Parse `YYYY-MM-DD` strings. A full timestamp is cut at the `T` so
  /// clients may pass either form. Empty strings count as absent.
  pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self> {
    Self::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
  }

  pub fn start(&self) -> NaiveDate { self.start }

  pub fn end(&self) -> Option<NaiveDate> { self.end }

  /// Both bounds are present, so the range can be enriched.
  pub fn is_closed(&self) -> bool { self.end.is_some() }

  /// The equivalent `created_at` bounds for the store.
  pub fn bounds(&self) -> ReadingBounds {
    ReadingBounds {
      start: start_of_day(self.start),
      end:   self.end.map(end_of_day),
    }
  }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
  let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
    return Ok(None);
  };
  let day = raw.split('T').next().unwrap_or(raw);
  NaiveDate::parse_from_str(day, "%Y-%m-%d")
    .map(Some)
    .map_err(|e| Error::Validation(format!("{field} must be YYYY-MM-DD, got {raw:?}: {e}")))
}

fn start_of_day(d: NaiveDate) -> DateTime<Utc> {
  d.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(d: NaiveDate) -> DateTime<Utc> {
  // Second precision; 23:59:59 is always representable.
  d.and_hms_opt(23, 59, 59)
    .map(|dt| dt.and_utc())
    .unwrap_or_else(|| start_of_day(d))
}
