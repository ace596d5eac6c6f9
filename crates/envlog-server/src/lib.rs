//! Runtime pieces of the envlog server binary: configuration, the IIO
//! sensor and the collection loop.

pub mod collector;
pub mod error;
pub mod sensor;
pub mod settings;

pub use error::{Error, Result};
