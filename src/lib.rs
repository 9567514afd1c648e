//! Cloud and cloud shadow detection for multispectral rasters.
//!
//! Implements CSD-SI (Cloud/Shadow Detection based on Spectral Indices,
//! Zhai et al., 2018) for multispectral imagery: two spectral indices, image
//! adaptive thresholds, a spatial match between cloud and shadow candidates and
//! median filtering of both masks.

pub mod cloud_shadow;
pub mod logger;
