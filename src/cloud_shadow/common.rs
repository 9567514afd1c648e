//! Common utilities module
//!
//! Error type and result alias shared by the detection core and the raster adapters.

pub mod error;

pub use error::{DetectionError, Result};
