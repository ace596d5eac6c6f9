//! The `ReadingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `envlog-store-sqlite`).
//! The query engine and the HTTP layer depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::reading::{
  MetadataPatch, NewMetadata, ReadingMetadata, ReadingWithMetadata, SensorReading,
  SensorSample,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Inclusive bounds on `created_at`, at second granularity.
/// `end = None` leaves the range open towards the present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingBounds {
  pub start: DateTime<Utc>,
  pub end:   Option<DateTime<Utc>>,
}

impl ReadingBounds {
  pub fn contains(&self, t: DateTime<Utc>) -> bool {
    t >= self.start && self.end.is_none_or(|end| t <= end)
  }
}

/// Outcome of [`ReadingStore::insert_metadata`]. The existence and
/// uniqueness checks run in the same transaction as the insert, so callers
/// can map each case to a response without checking first.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataInsert {
  Inserted(ReadingMetadata),
  /// No reading with the requested id exists.
  MissingReading,
  /// The reading already has a metadata entry.
  AlreadyPresent,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an envlog storage backend.
///
/// Readings are append-only. Writes must be serialised so that ids increase
/// with insertion order. Metadata rows are always written after their parent
/// reading exists.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ReadingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Readings ──────────────────────────────────────────────────────────

  /// Persist a sample. `created_at` is set by the store to the current
  /// second.
  fn insert_reading(
    &self,
    sample: SensorSample,
  ) -> impl Future<Output = Result<SensorReading, Self::Error>> + Send + '_;

  /// Persist a sample with a caller-supplied creation time, truncated to
  /// the second. Used for imports and tests.
  fn insert_reading_at(
    &self,
    sample: SensorSample,
    created_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<SensorReading, Self::Error>> + Send + '_;

  /// Retrieve a reading with its metadata. Returns `None` if not found.
  fn get_reading(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ReadingWithMetadata>, Self::Error>> + Send + '_;

  /// The `limit` most recent readings, newest first.
  fn latest(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ReadingWithMetadata>, Self::Error>> + Send + '_;

  /// All readings whose `created_at` lies within `bounds`, newest first,
  /// left-joined with their metadata.
  fn query_range(
    &self,
    bounds: ReadingBounds,
  ) -> impl Future<Output = Result<Vec<ReadingWithMetadata>, Self::Error>> + Send + '_;

  // ── Metadata ──────────────────────────────────────────────────────────

  /// Attach metadata to an existing reading. A missing reading or an
  /// existing entry is reported through [`MetadataInsert`], not as an error.
  fn insert_metadata(
    &self,
    input: NewMetadata,
  ) -> impl Future<Output = Result<MetadataInsert, Self::Error>> + Send + '_;

  /// Apply `patch` to the metadata entry `entry_id`, changing only the
  /// fields it carries. Returns `None` if the entry does not exist.
  fn update_metadata(
    &self,
    entry_id: i64,
    patch: MetadataPatch,
  ) -> impl Future<Output = Result<Option<ReadingMetadata>, Self::Error>> + Send + '_;
}
