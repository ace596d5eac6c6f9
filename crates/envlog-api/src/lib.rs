//! JSON REST API for envlog.
//!
//! Exposes an axum [`Router`] backed by any
//! [`envlog_core::store::ReadingStore`] and
//! [`envlog_core::historical::WeatherProvider`]. Tracing, TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = envlog_api::app(AppState::new(store, weather));
//! ```

pub mod error;
pub mod metadata;
pub mod readings;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post, put},
};
use envlog_core::{historical::WeatherProvider, query::QueryEngine, store::ReadingStore};
use serde_json::{Value, json};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, W> {
  pub store:  Arc<S>,
  pub engine: QueryEngine<S, W>,
}

impl<S, W> Clone for AppState<S, W> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      engine: self.engine.clone(),
    }
  }
}

impl<S, W> AppState<S, W>
where
  S: ReadingStore,
  W: WeatherProvider,
{
  pub fn new(store: Arc<S>, weather: Arc<W>) -> Self {
    let engine = QueryEngine::new(store.clone(), weather);
    Self { store, engine }
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// Build the `/api` routes for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, W>(state: AppState<S, W>) -> Router<()>
where
  S: ReadingStore + 'static,
  W: WeatherProvider + 'static,
{
  Router::new()
    // Readings
    .route(
      "/readings",
      get(readings::range::<S, W>).post(readings::create::<S, W>),
    )
    .route("/readings/latest", get(readings::latest::<S, W>))
    .route("/readings/{id}", get(readings::get_one::<S, W>))
    // Metadata
    .route("/metadata", post(metadata::create::<S, W>))
    .route(
      "/metadata/{entry_id}",
      put(metadata::update::<S, W>).patch(metadata::update::<S, W>),
    )
    .with_state(state)
}

/// The complete application: `/health` plus the API nested under `/api`.
pub fn app<S, W>(state: AppState<S, W>) -> Router<()>
where
  S: ReadingStore + 'static,
  W: WeatherProvider + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
}

/// `GET /health`
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
