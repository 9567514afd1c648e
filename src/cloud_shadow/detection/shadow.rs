//! Cloud shadow classification
//!
//! Dark pixels in both NIR and Blue are shadow candidates. Only candidates
//! with a cloud pixel inside the search window survive; the rest are pseudo
//! shadows such as water or terrain shade.

use ndarray::{ArrayView2, ArrayView3, Zip};
use tracing::{debug, instrument};

use crate::cloud_shadow::common::error::{DetectionError, Result};
use crate::cloud_shadow::detection::filters::{median_filter, window_sum};
use crate::cloud_shadow::detection::indices::band;
use crate::cloud_shadow::detection::params::{BandIndices, SearchWindow, ShadowParams};
use crate::cloud_shadow::detection::stats::{finite_threshold, stats};
use crate::cloud_shadow::raster::types::Mask;

/// `T3 = min(nir) + t3 · (mean(nir) − min(nir))`
pub fn derive_t3(nir: ArrayView2<'_, f64>, t3: f64) -> Result<f64> {
    min_mean_blend(nir, t3, "NIR", "T3")
}

/// `T4 = min(blue) + t4 · (mean(blue) − min(blue))`
pub fn derive_t4(blue: ArrayView2<'_, f64>, t4: f64) -> Result<f64> {
    min_mean_blend(blue, t4, "Blue", "T4")
}

fn min_mean_blend(values: ArrayView2<'_, f64>, coefficient: f64, label: &str, name: &str) -> Result<f64> {
    let s = stats(values, label)?;
    finite_threshold(name, s.min + coefficient * (s.mean - s.min))
}

/// Candidate iff `NIR < T3` and `Blue < T4`; equality does not qualify.
pub fn classify_preliminary_shadow(
    nir: ArrayView2<'_, f64>,
    blue: ArrayView2<'_, f64>,
    t3_threshold: f64,
    t4_threshold: f64,
) -> Mask {
    Zip::from(nir)
        .and(blue)
        .map_collect(|&n, &b| u8::from(n < t3_threshold && b < t4_threshold))
}

/// Pixels with at least one cloud pixel inside the search window.
pub fn near_cloud_mask(cloud_mask: ArrayView2<'_, u8>, window: SearchWindow) -> Result<Mask> {
    Ok(window_sum(cloud_mask, window)?.mapv(|count| u8::from(count > 0)))
}

/// Elementwise AND of the preliminary shadow mask and the near-cloud mask.
pub fn refine(preliminary: ArrayView2<'_, u8>, near_cloud: ArrayView2<'_, u8>) -> Result<Mask> {
    check_shape(preliminary.dim(), near_cloud.dim())?;
    Ok(Zip::from(preliminary)
        .and(near_cloud)
        .map_collect(|&p, &n| u8::from(p != 0 && n != 0)))
}

/// Final shadow mask for `image` given its final cloud mask.
#[instrument(skip_all, fields(t3 = params.t3, t4 = params.t4, kernel = params.median_kernel))]
pub fn detect_shadow(
    image: ArrayView3<'_, f64>,
    bands: BandIndices,
    cloud_mask: ArrayView2<'_, u8>,
    params: &ShadowParams,
) -> Result<Mask> {
    let (height, width, band_count) = image.dim();
    let offsets = bands.resolve(band_count)?;
    params.validate()?;
    check_shape((height, width), cloud_mask.dim())?;

    let nir = band(image, offsets.nir());
    let blue = band(image, offsets.blue());

    let t3_threshold = derive_t3(nir, params.t3)?;
    let t4_threshold = derive_t4(blue, params.t4)?;
    debug!(t3_threshold, t4_threshold, "Derived shadow darkness thresholds");

    let preliminary = classify_preliminary_shadow(nir, blue, t3_threshold, t4_threshold);
    let near_cloud = near_cloud_mask(cloud_mask, params.search_window)?;
    let refined = refine(preliminary.view(), near_cloud.view())?;
    debug!(
        candidates = preliminary.iter().filter(|&&v| v == 1).count(),
        matched = refined.iter().filter(|&&v| v == 1).count(),
        "Shadow candidates matched to clouds"
    );

    median_filter(refined.view(), params.median_kernel)
}

fn check_shape(expected: (usize, usize), actual: (usize, usize)) -> Result<()> {
    if expected != actual {
        return Err(DetectionError::MaskShapeMismatch { expected, actual });
    }
    Ok(())
}
