//! Handlers for `/metadata` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/metadata` | Body: `{"reading_id":1,"ac":0,"coverings":2,"notes":".."}`; 404 unknown reading, 409 if already annotated |
//! | `PUT`/`PATCH` | `/metadata/{entry_id}` | Partial update; absent fields are left untouched |
//!
//! `converings` is accepted as an alias of `coverings` in both bodies.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use envlog_core::{
  historical::WeatherProvider,
  reading::{MetadataPatch, NewMetadata, ReadingMetadata},
  store::{MetadataInsert, ReadingStore},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub reading_id: Option<i64>,
  pub ac:         Option<i64>,
  #[serde(alias = "converings")]
  pub coverings:  Option<i64>,
  pub notes:      Option<String>,
}

/// `POST /metadata`
pub async fn create<S, W>(
  State(state): State<AppState<S, W>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  let reading_id = body
    .reading_id
    .ok_or_else(|| ApiError::BadRequest("missing required fields: reading_id".into()))?;

  let outcome = state
    .store
    .insert_metadata(NewMetadata {
      reading_id,
      ac: body.ac,
      coverings: body.coverings,
      notes: body.notes,
    })
    .await
    .map_err(ApiError::store)?;

  match outcome {
    MetadataInsert::Inserted(metadata) => Ok((StatusCode::CREATED, Json(metadata))),
    MetadataInsert::MissingReading => {
      Err(ApiError::NotFound(format!("reading {reading_id} not found")))
    }
    MetadataInsert::AlreadyPresent => Err(ApiError::Conflict(format!(
      "reading {reading_id} already has metadata"
    ))),
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /metadata/{entry_id}` and `PATCH /metadata/{entry_id}`
pub async fn update<S, W>(
  State(state): State<AppState<S, W>>,
  Path(entry_id): Path<i64>,
  Json(patch): Json<MetadataPatch>,
) -> Result<Json<ReadingMetadata>, ApiError>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  let metadata = state
    .store
    .update_metadata(entry_id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("metadata entry {entry_id} not found")))?;
  Ok(Json(metadata))
}
