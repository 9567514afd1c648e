//! Load → detect → store orchestration
//!
//! Wires a [`RasterReader`](crate::cloud_shadow::raster::RasterReader) and a
//! [`MaskWriter`](crate::cloud_shadow::raster::MaskWriter) around the
//! detection core, with per-step timings.

mod config;
mod runner;
mod timing;

#[cfg(test)]
mod tests;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use runner::CloudShadowPipeline;
pub use timing::{PipelineTimings, StepTiming, Timer};
