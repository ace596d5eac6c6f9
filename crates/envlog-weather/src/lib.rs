//! Open-Meteo client supplying hourly outdoor weather history.
//!
//! [`OpenMeteoClient`] implements [`envlog_core::historical::WeatherProvider`]
//! with a per-request timeout, linear retry backoff and a short-lived
//! in-memory cache keyed by the requested date range.

mod cache;
mod client;

pub mod error;

pub use client::{OpenMeteoClient, OpenMeteoConfig};
pub use error::{Error, Result};
