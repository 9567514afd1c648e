//! Cloud and cloud shadow detection from spectral indices
//!
//! Stages run strictly in order on one in-memory image:
//! indices → cloud mask → shadow mask. Every stage is a pure function of its
//! inputs and can be exercised on its own.

pub mod params;
pub mod stats;
pub mod indices;
pub mod filters;
pub mod cloud;
pub mod shadow;


use ndarray::ArrayView3;
use tracing::{info, instrument};

use crate::cloud_shadow::common::error::{DetectionError, Result};
use crate::cloud_shadow::raster::types::Mask;

pub use params::{
    BandIndices, BandOffsets, CloudParams, DetectionParams, DetectionParamsBuilder, SearchWindow,
    ShadowParams,
};
pub use indices::{compute_ci1, compute_ci2};
pub use filters::{median_filter, window_sum};
pub use cloud::{classify_preliminary_cloud, derive_t2, detect_cloud};
pub use shadow::{
    classify_preliminary_shadow, derive_t3, derive_t4, detect_shadow, near_cloud_mask, refine,
};

/// Final masks of one detection run
#[derive(Debug, Clone, PartialEq)]
pub struct CloudShadowMasks {
    pub cloud: Mask,
    pub shadow: Mask,
}

/// Fraction of pixels set in `mask`, 0.0 for an empty mask.
pub fn coverage(mask: &Mask) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|&&v| v != 0).count() as f64 / mask.len() as f64
}

/// Runs cloud then shadow detection on an (height, width, band) image.
///
/// Every parameter is validated before any pixel is touched.
#[instrument(skip_all)]
pub fn detect(image: ArrayView3<'_, f64>, params: &DetectionParams) -> Result<CloudShadowMasks> {
    let (height, width, band_count) = image.dim();
    if height == 0 || width == 0 {
        return Err(DetectionError::InvalidDimensions(width, height));
    }
    params.validate(band_count)?;

    let cloud = detect_cloud(image, params.bands, &params.cloud)?;
    let shadow = detect_shadow(image, params.bands, cloud.view(), &params.shadow)?;

    info!(
        cloud_coverage = coverage(&cloud),
        shadow_coverage = coverage(&shadow),
        "Detection complete"
    );

    Ok(CloudShadowMasks { cloud, shadow })
}
