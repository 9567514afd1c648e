//! Cloud classification
//!
//! A pixel is a cloud candidate when its CI1 lies within T1 of 1 and its CI2
//! exceeds the adaptive brightness threshold T2. The candidate mask is then
//! median filtered.

use ndarray::{ArrayView2, ArrayView3, Zip};
use tracing::{debug, instrument};

use crate::cloud_shadow::common::error::Result;
use crate::cloud_shadow::detection::filters::median_filter;
use crate::cloud_shadow::detection::indices::{compute_ci1, compute_ci2, ensure_finite};
use crate::cloud_shadow::detection::params::{BandIndices, CloudParams};
use crate::cloud_shadow::detection::stats::{finite_threshold, stats};
use crate::cloud_shadow::raster::types::Mask;

/// `T2 = mean(ci2) + t2 · (max(ci2) − mean(ci2))`, no clamping on `t2`.
pub fn derive_t2(ci2: ArrayView2<'_, f64>, t2: f64) -> Result<f64> {
    let s = stats(ci2, "CI2")?;
    finite_threshold("T2", s.mean + t2 * (s.max - s.mean))
}

pub fn classify_preliminary_cloud(
    ci1: ArrayView2<'_, f64>,
    ci2: ArrayView2<'_, f64>,
    t1: f64,
    t2_threshold: f64,
) -> Mask {
    Zip::from(ci1)
        .and(ci2)
        .map_collect(|&c1, &c2| u8::from((c1 - 1.0).abs() < t1 && c2 > t2_threshold))
}

/// Final cloud mask for `image`.
#[instrument(skip_all, fields(t1 = params.t1, t2 = params.t2, kernel = params.median_kernel))]
pub fn detect_cloud(image: ArrayView3<'_, f64>, bands: BandIndices, params: &CloudParams) -> Result<Mask> {
    let offsets = bands.resolve(image.dim().2)?;
    params.validate()?;

    let ci1 = compute_ci1(image, &offsets);
    let ci2 = compute_ci2(image, &offsets);
    ensure_finite(ci1.view(), "CI1")?;
    ensure_finite(ci2.view(), "CI2")?;

    let t2_threshold = derive_t2(ci2.view(), params.t2)?;
    debug!(t2_threshold, "Derived cloud brightness threshold");

    let preliminary = classify_preliminary_cloud(ci1.view(), ci2.view(), params.t1, t2_threshold);
    debug!(
        candidates = preliminary.iter().filter(|&&v| v == 1).count(),
        "Preliminary cloud mask"
    );

    median_filter(preliminary.view(), params.median_kernel)
}
