//! Core types and trait definitions for envlog.
//!
//! This crate holds the sensor-reading domain model, the hour-key aligner,
//! the left-join merger, and the range query engine. It has no HTTP or
//! database dependencies; storage, weather and sensor access are expressed
//! as traits implemented by the other workspace crates.

// Capability traits spell out `impl Future + Send` in their signatures;
// implementors write plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod align;
pub mod error;
pub mod historical;
pub mod hour_key;
pub mod merge;
pub mod query;
pub mod range;
pub mod reading;
pub mod sensor;
pub mod store;

pub use error::{Error, Result};
