//! The range query engine.
//!
//! Validates the range, fetches readings and weather history concurrently,
//! aligns the readings and left-joins them against the history. A failing
//! weather provider degrades the answer to sensor-only output; a failing
//! store fails the query.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
  Error, Result,
  align::align,
  historical::WeatherProvider,
  merge::{EnrichedReading, merge, without_history},
  range::DateRange,
  store::ReadingStore,
};

/// How the weather side of a query was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
  /// The range was open-ended, so the provider was not asked.
  NotRequested,
  Applied,
  /// The provider failed; the reason is kept for logging and headers.
  Unavailable(String),
}

impl Enrichment {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NotRequested => "not_requested",
      Self::Applied => "applied",
      Self::Unavailable(_) => "unavailable",
    }
  }
}

/// The result of [`QueryEngine::query`].
#[derive(Debug, Clone)]
pub struct QueryOutcome {
  /// In store order (newest first).
  pub readings:   Vec<EnrichedReading>,
  pub enrichment: Enrichment,
}

/// Answers range queries over a [`ReadingStore`] and a [`WeatherProvider`].
pub struct QueryEngine<S, W> {
  store:   Arc<S>,
  weather: Arc<W>,
}

impl<S, W> Clone for QueryEngine<S, W> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), weather: self.weather.clone() }
  }
}

impl<S, W> QueryEngine<S, W>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  pub fn new(store: Arc<S>, weather: Arc<W>) -> Self {
    Self { store, weather }
  }

  /// Parse and validate raw date strings, then run the query. Validation
  /// errors are returned before the store or provider is touched.
  pub async fn query_dates(&self, start: Option<&str>, end: Option<&str>) -> Result<QueryOutcome> {
    let range = DateRange::parse(start, end)?;
    self.query(range).await
  }

  pub async fn query(&self, range: DateRange) -> Result<QueryOutcome> {
    let bounds = range.bounds();

    let Some(end) = range.end() else {
      let rows = self.store.query_range(bounds).await.map_err(Error::store)?;
      debug!(start = %range.start(), count = rows.len(), "open-ended range query");
      return Ok(QueryOutcome {
        readings:   rows.into_iter().map(EnrichedReading::sensor_only).collect(),
        enrichment: Enrichment::NotRequested,
      });
    };

    let (rows, points) = tokio::join!(
      self.store.query_range(bounds),
      self.weather.fetch_historical(range.start(), end),
    );
    let rows = rows.map_err(Error::store)?;
    let aligned = align(rows);

    let outcome = match points {
      Ok(points) => {
        debug!(
          start = %range.start(),
          end = %end,
          readings = aligned.len(),
          points = points.len(),
          "merging readings with weather history"
        );
        QueryOutcome { readings: merge(aligned, &points), enrichment: Enrichment::Applied }
      }
      Err(e) => {
        let reason = format!("weather provider unavailable: {e}");
        warn!(start = %range.start(), end = %end, error = %reason, "serving readings without weather history");
        QueryOutcome {
          readings:   without_history(aligned),
          enrichment: Enrichment::Unavailable(reason),
        }
      }
    };
    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use chrono::{DateTime, NaiveDate, TimeZone, Utc};

  use super::*;
  use crate::{
    hour_key::{format_timestamp, parse_timestamp},
    historical::HistoricalPoint,
    merge::HistoricalFields,
    reading::{
      MetadataPatch, NewMetadata, ReadingMetadata, ReadingWithMetadata, SensorReading,
      SensorSample,
    },
    store::{MetadataInsert, ReadingBounds},
  };

  // ─── Fakes ────────────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("fake failure")]
  struct FakeError;

  #[derive(Default)]
  struct FakeStore {
    rows:       Mutex<Vec<SensorReading>>,
    range_hits: AtomicUsize,
    fail:       bool,
  }

  impl FakeStore {
    fn with(rows: &[(i64, &str)]) -> Self {
      let rows = rows
        .iter()
        .map(|(id, at)| SensorReading {
          id:             *id,
          temperature:    21.0,
          humidity:       45.0,
          pressure:       101.3,
          gas_resistance: None,
          created_at:     (*at).to_owned(),
        })
        .collect();
      Self { rows: Mutex::new(rows), ..Default::default() }
    }

    fn failing() -> Self {
      Self { fail: true, ..Default::default() }
    }
  }

  impl ReadingStore for FakeStore {
    type Error = FakeError;

    async fn insert_reading(&self, _sample: SensorSample) -> Result<SensorReading, FakeError> {
      Err(FakeError)
    }

    async fn insert_reading_at(
      &self,
      _sample: SensorSample,
      _created_at: DateTime<Utc>,
    ) -> Result<SensorReading, FakeError> {
      Err(FakeError)
    }

    async fn get_reading(&self, _id: i64) -> Result<Option<ReadingWithMetadata>, FakeError> {
      Ok(None)
    }

    async fn latest(&self, _limit: usize) -> Result<Vec<ReadingWithMetadata>, FakeError> {
      Ok(Vec::new())
    }

    async fn query_range(
      &self,
      bounds: ReadingBounds,
    ) -> Result<Vec<ReadingWithMetadata>, FakeError> {
      self.range_hits.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(FakeError);
      }
      let rows = self.rows.lock().unwrap();
      let mut hits: Vec<_> = rows
        .iter()
        .filter(|r| parse_timestamp(&r.created_at).is_ok_and(|t| bounds.contains(t)))
        .cloned()
        .map(|reading| ReadingWithMetadata { reading, metadata: None })
        .collect();
      hits.sort_by(|a, b| b.reading.id.cmp(&a.reading.id));
      Ok(hits)
    }

    async fn insert_metadata(&self, _input: NewMetadata) -> Result<MetadataInsert, FakeError> {
      Ok(MetadataInsert::MissingReading)
    }

    async fn update_metadata(
      &self,
      _entry_id: i64,
      _patch: MetadataPatch,
    ) -> Result<Option<ReadingMetadata>, FakeError> {
      Ok(None)
    }
  }

  #[derive(Default)]
  struct FakeWeather {
    points: Vec<HistoricalPoint>,
    calls:  Mutex<Vec<(NaiveDate, NaiveDate)>>,
    fail:   bool,
  }

  impl FakeWeather {
    fn calls(&self) -> usize { self.calls.lock().unwrap().len() }
  }

  impl WeatherProvider for FakeWeather {
    type Error = FakeError;

    async fn fetch_historical(
      &self,
      start: NaiveDate,
      end: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>, FakeError> {
      self.calls.lock().unwrap().push((start, end));
      if self.fail { Err(FakeError) } else { Ok(self.points.clone()) }
    }
  }

  type Harness = (QueryEngine<FakeStore, FakeWeather>, Arc<FakeStore>, Arc<FakeWeather>);

  fn engine(store: FakeStore, weather: FakeWeather) -> Harness {
    let store = Arc::new(store);
    let weather = Arc::new(weather);
    (QueryEngine::new(store.clone(), weather.clone()), store, weather)
  }

  fn hour(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
  }

  fn day(d: u32) -> Option<NaiveDate> { NaiveDate::from_ymd_opt(2024, 6, d) }

  // ─── Tests ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn enriches_matching_readings() {
    let (engine, _, weather) = engine(
      FakeStore::with(&[(1, "2024-06-01T14:23:10Z")]),
      FakeWeather {
        points: vec![HistoricalPoint {
          timestamp:   hour(1, 14),
          temperature: Some(18.4),
          humidity:    Some(62.0),
        }],
        ..Default::default()
      },
    );

    let outcome = engine.query(DateRange::new(day(1), day(1)).unwrap()).await.unwrap();
    assert_eq!(outcome.enrichment, Enrichment::Applied);
    assert_eq!(outcome.readings.len(), 1);
    let h = outcome.readings[0].historical.unwrap();
    assert_eq!(h.historical_temperature, Some(18.4));
    assert_eq!(weather.calls.lock().unwrap().as_slice(), &[(day(1).unwrap(), day(1).unwrap())]);
  }

  #[tokio::test]
  async fn empty_history_yields_null_fields_for_every_reading() {
    let (engine, _, _) = engine(
      FakeStore::with(&[(2, "2024-06-01T18:00:00Z"), (1, "2024-06-01T07:45:00Z")]),
      FakeWeather::default(),
    );

    let outcome = engine.query_dates(Some("2024-06-01"), Some("2024-06-01")).await.unwrap();
    assert_eq!(outcome.readings.len(), 2);
    for r in &outcome.readings {
      assert_eq!(r.historical, Some(HistoricalFields::default()));
    }
  }

  #[tokio::test]
  async fn inverted_range_makes_no_calls() {
    let (engine, store, weather) = engine(FakeStore::default(), FakeWeather::default());

    let err = engine.query_dates(Some("2024-06-02"), Some("2024-06-01")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
    assert_eq!(store.range_hits.load(Ordering::SeqCst), 0);
    assert_eq!(weather.calls(), 0);
  }

  #[tokio::test]
  async fn missing_start_makes_no_calls() {
    let (engine, store, weather) = engine(FakeStore::default(), FakeWeather::default());

    let err = engine.query_dates(None, Some("2024-06-01")).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.range_hits.load(Ordering::SeqCst), 0);
    assert_eq!(weather.calls(), 0);
  }

  #[tokio::test]
  async fn open_ended_range_skips_the_provider() {
    let (engine, _, weather) = engine(
      FakeStore::with(&[(2, "2024-06-05T10:00:00Z"), (1, "2024-05-31T23:59:59Z")]),
      FakeWeather::default(),
    );

    let outcome = engine.query_dates(Some("2024-06-01"), None).await.unwrap();
    assert_eq!(outcome.enrichment, Enrichment::NotRequested);
    assert_eq!(weather.calls(), 0);
    assert_eq!(outcome.readings.len(), 1);
    assert_eq!(outcome.readings[0].reading.id, 2);
    assert!(outcome.readings[0].historical.is_none());
  }

  #[tokio::test]
  async fn provider_failure_degrades_to_sensor_only() {
    let (engine, _, _) = engine(
      FakeStore::with(&[(1, "2024-06-01T14:23:10Z")]),
      FakeWeather { fail: true, ..Default::default() },
    );

    let outcome = engine.query_dates(Some("2024-06-01"), Some("2024-06-01")).await.unwrap();
    assert!(matches!(
      &outcome.enrichment,
      Enrichment::Unavailable(reason) if reason == "weather provider unavailable: fake failure"
    ));
    assert_eq!(outcome.enrichment.as_str(), "unavailable");
    assert_eq!(outcome.readings.len(), 1);
    assert!(outcome.readings[0].historical.is_none());
  }

  #[tokio::test]
  async fn store_failure_fails_the_query() {
    let (engine, _, _) = engine(FakeStore::failing(), FakeWeather::default());
    let err = engine.query_dates(Some("2024-06-01"), Some("2024-06-02")).await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
  }

  #[tokio::test]
  async fn range_boundaries_are_inclusive() {
    let midnight = hour(1, 0);
    let last_second = format_timestamp(midnight + chrono::TimeDelta::seconds(86_399));
    let one_past = format_timestamp(midnight + chrono::TimeDelta::seconds(86_400));
    let (engine, _, _) = engine(
      FakeStore::with(&[
        (3, one_past.as_str()),
        (2, last_second.as_str()),
        (1, "2024-06-01T00:00:00Z"),
      ]),
      FakeWeather::default(),
    );

    let outcome = engine.query_dates(Some("2024-06-01"), Some("2024-06-01")).await.unwrap();
    let ids: Vec<i64> = outcome.readings.iter().map(|r| r.reading.id).collect();
    assert_eq!(ids, [2, 1]);
  }

  #[tokio::test]
  async fn preserves_store_order() {
    let (engine, _, _) = engine(
      FakeStore::with(&[
        (1, "2024-06-01T08:00:00Z"),
        (3, "2024-06-01T10:00:00Z"),
        (2, "2024-06-01T09:00:00Z"),
      ]),
      FakeWeather::default(),
    );

    let outcome = engine.query_dates(Some("2024-06-01"), Some("2024-06-01")).await.unwrap();
    let ids: Vec<i64> = outcome.readings.iter().map(|r| r.reading.id).collect();
    assert_eq!(ids, [3, 2, 1]);
  }
}
