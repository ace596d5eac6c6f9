//! Handlers for `/readings` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/readings` | `?start_date=YYYY-MM-DD[&end_date=YYYY-MM-DD]`; sets `x-enrichment` |
//! | `GET`  | `/readings/latest` | Optional `?limit=N` (default 100) |
//! | `GET`  | `/readings/{id}` | 404 if not found |
//! | `POST` | `/readings` | Body: `{"temperature":..,"humidity":..,"pressure":..,"gas_resistance":..}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use envlog_core::{
  historical::WeatherProvider,
  reading::{ReadingWithMetadata, SensorSample},
  store::ReadingStore,
};
use serde::Deserialize;
use tracing::info;

use crate::{AppState, error::ApiError};

/// Response header reporting how the weather side of a range query went.
pub const ENRICHMENT_HEADER: &str = "x-enrichment";

const DEFAULT_LATEST_LIMIT: usize = 100;

// ─── Range query ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RangeParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
}

/// `GET /readings?start_date=<day>[&end_date=<day>]`
pub async fn range<S, W>(
  State(state): State<AppState<S, W>>,
  Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  let outcome = state
    .engine
    .query_dates(params.start_date.as_deref(), params.end_date.as_deref())
    .await?;
  Ok((
    [(ENRICHMENT_HEADER, outcome.enrichment.as_str())],
    Json(outcome.readings),
  ))
}

// ─── Latest ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LatestParams {
  pub limit: Option<usize>,
}

/// `GET /readings/latest[?limit=<n>]`
pub async fn latest<S, W>(
  State(state): State<AppState<S, W>>,
  Query(params): Query<LatestParams>,
) -> Result<Json<Vec<ReadingWithMetadata>>, ApiError>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  let rows = state
    .store
    .latest(params.limit.unwrap_or(DEFAULT_LATEST_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /readings/{id}`
pub async fn get_one<S, W>(
  State(state): State<AppState<S, W>>,
  Path(id): Path<i64>,
) -> Result<Json<ReadingWithMetadata>, ApiError>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  let row = state
    .store
    .get_reading(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("reading {id} not found")))?;
  Ok(Json(row))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Every field is optional on the wire so that absence can be reported as a
/// 400 naming the missing fields rather than a generic decode rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  pub temperature:    Option<f64>,
  pub humidity:       Option<f64>,
  pub pressure:       Option<f64>,
  pub gas_resistance: Option<f64>,
}

impl CreateBody {
  fn into_sample(self) -> Result<SensorSample, ApiError> {
    match (self.temperature, self.humidity, self.pressure) {
      (Some(temperature), Some(humidity), Some(pressure)) => Ok(SensorSample {
        temperature,
        humidity,
        pressure,
        gas_resistance: self.gas_resistance,
      }),
      _ => {
        let missing: Vec<&str> = [
          ("temperature", self.temperature.is_none()),
          ("humidity", self.humidity.is_none()),
          ("pressure", self.pressure.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        Err(ApiError::BadRequest(format!(
          "missing required fields: {}",
          missing.join(", ")
        )))
      }
    }
  }
}

/// `POST /readings`
pub async fn create<S, W>(
  State(state): State<AppState<S, W>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  let sample = body.into_sample()?;
  let reading = state
    .store
    .insert_reading(sample)
    .await
    .map_err(ApiError::store)?;
  info!(reading_id = reading.id, "reading created via API");
  Ok((StatusCode::CREATED, Json(reading)))
}
