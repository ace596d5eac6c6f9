//! [`SqliteStore`], the SQLite implementation of [`ReadingStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;

use envlog_core::{
  reading::{
    MetadataPatch, NewMetadata, ReadingMetadata, ReadingWithMetadata, SensorReading,
    SensorSample,
  },
  store::{MetadataInsert, ReadingBounds, ReadingStore},
};

use crate::{
  encode::{encode_dt, RawMetadata, RawRow, ROW_COLUMNS, ROW_SOURCE},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An envlog reading store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Undecoded outcome of the metadata insert transaction.
enum RawInsert {
  Inserted(RawMetadata),
  MissingReading,
  AlreadyPresent,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a reading select with the shared column list and decode each row.
  async fn select_rows(
    &self,
    tail: &'static str,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<ReadingWithMetadata>> {
    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ROW_COLUMNS} FROM {ROW_SOURCE} {tail}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRow::into_domain).collect()
  }

  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ReadingStore impl ───────────────────────────────────────────────────────

impl ReadingStore for SqliteStore {
  type Error = Error;

  // ── Readings ──────────────────────────────────────────────────────────────

  async fn insert_reading(&self, sample: SensorSample) -> Result<SensorReading> {
    self.insert_reading_at(sample, Utc::now()).await
  }

  async fn insert_reading_at(
    &self,
    sample: SensorSample,
    created_at: DateTime<Utc>,
  ) -> Result<SensorReading> {
    let created_at_str = encode_dt(created_at);
    let stored_at = created_at_str.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO readings
             (temperature, humidity, pressure, gas_resistance, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            sample.temperature,
            sample.humidity,
            sample.pressure,
            sample.gas_resistance,
            stored_at,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(reading_id = id, created_at = %created_at_str, "reading stored");

    Ok(SensorReading {
      id,
      temperature: sample.temperature,
      humidity: sample.humidity,
      pressure: sample.pressure,
      gas_resistance: sample.gas_resistance,
      created_at: created_at_str,
    })
  }

  async fn get_reading(&self, id: i64) -> Result<Option<ReadingWithMetadata>> {
    let raw: Option<RawRow> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {ROW_COLUMNS} FROM {ROW_SOURCE} WHERE r.reading_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], RawRow::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRow::into_domain).transpose()
  }

  async fn latest(&self, limit: usize) -> Result<Vec<ReadingWithMetadata>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .select_rows("ORDER BY r.reading_id DESC LIMIT ?1", vec![limit.into()])
      .await
  }

  async fn query_range(
    &self,
    bounds: ReadingBounds,
  ) -> Result<Vec<ReadingWithMetadata>> {
    let start = encode_dt(bounds.start);
    let end = match bounds.end {
      Some(end) => encode_dt(end).into(),
      None => rusqlite::types::Value::Null,
    };

    self
      .select_rows(
        "WHERE strftime('%Y-%m-%dT%H:%M:%SZ', r.created_at) >= ?1
           AND (?2 IS NULL OR strftime('%Y-%m-%dT%H:%M:%SZ', r.created_at) <= ?2)
         ORDER BY r.reading_id DESC",
        vec![start.into(), end],
      )
      .await
  }

  // ── Metadata ──────────────────────────────────────────────────────────────

  async fn insert_metadata(&self, input: NewMetadata) -> Result<MetadataInsert> {
    let reading_id = input.reading_id;
    let created_at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM readings WHERE reading_id = ?1",
            rusqlite::params![input.reading_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(RawInsert::MissingReading);
        }

        let present: bool = tx
          .query_row(
            "SELECT 1 FROM reading_metadata WHERE reading_id = ?1",
            rusqlite::params![input.reading_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if present {
          return Ok(RawInsert::AlreadyPresent);
        }

        tx.execute(
          "INSERT INTO reading_metadata (reading_id, ac, coverings, notes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            input.reading_id,
            input.ac,
            input.coverings,
            input.notes,
            created_at_str,
          ],
        )?;
        let entry_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(RawInsert::Inserted(RawMetadata {
          entry_id,
          reading_id: input.reading_id,
          ac: input.ac,
          coverings: input.coverings,
          notes: input.notes,
          created_at: created_at_str,
        }))
      })
      .await?;

    match outcome {
      RawInsert::Inserted(raw) => {
        debug!(entry_id = raw.entry_id, reading_id, "metadata stored");
        raw.into_metadata().map(MetadataInsert::Inserted)
      }
      RawInsert::MissingReading => {
        debug!(reading_id, "metadata rejected, no such reading");
        Ok(MetadataInsert::MissingReading)
      }
      RawInsert::AlreadyPresent => {
        debug!(reading_id, "metadata rejected, entry already present");
        Ok(MetadataInsert::AlreadyPresent)
      }
    }
  }

  async fn update_metadata(
    &self,
    entry_id: i64,
    patch: MetadataPatch,
  ) -> Result<Option<ReadingMetadata>> {
    let empty = patch.is_empty();

    let raw: Option<RawMetadata> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !patch.is_empty() {
          tx.execute(
            "UPDATE reading_metadata
                SET ac        = COALESCE(?1, ac),
                    coverings = COALESCE(?2, coverings),
                    notes     = COALESCE(?3, notes)
              WHERE entry_id = ?4",
            rusqlite::params![patch.ac, patch.coverings, patch.notes, entry_id],
          )?;
        }

        let sql = format!(
          "SELECT {} FROM reading_metadata WHERE entry_id = ?1",
          RawMetadata::COLUMNS
        );
        let row = tx
          .query_row(&sql, rusqlite::params![entry_id], RawMetadata::from_row)
          .optional()?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    if empty {
      debug!(entry_id, "metadata update carried no fields");
    }

    raw.map(RawMetadata::into_metadata).transpose()
  }
}
