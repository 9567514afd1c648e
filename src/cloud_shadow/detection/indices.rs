//! Cloud spectral indices
//!
//! `CI1 = 3·NIR / (R + G + B + NIR + 1)` measures NIR dominance; the `+1`
//! keeps the ratio defined when all four bands are zero.
//! `CI2 = (R + G + B + NIR) / 4` is the mean brightness of the four bands.

use ndarray::{Array2, ArrayView2, ArrayView3, Axis, Zip};

use crate::cloud_shadow::common::error::{DetectionError, Result};
use crate::cloud_shadow::detection::params::BandOffsets;

pub fn compute_ci1(image: ArrayView3<'_, f64>, bands: &BandOffsets) -> Array2<f64> {
    Zip::from(band(image, bands.red()))
        .and(band(image, bands.green()))
        .and(band(image, bands.blue()))
        .and(band(image, bands.nir()))
        .map_collect(|&r, &g, &b, &nir| 3.0 * nir / (r + g + b + nir + 1.0))
}

pub fn compute_ci2(image: ArrayView3<'_, f64>, bands: &BandOffsets) -> Array2<f64> {
    Zip::from(band(image, bands.red()))
        .and(band(image, bands.green()))
        .and(band(image, bands.blue()))
        .and(band(image, bands.nir()))
        .map_collect(|&r, &g, &b, &nir| (r + g + b + nir) / 4.0)
}

/// One band plane of an (height, width, band) image.
pub fn band(image: ArrayView3<'_, f64>, offset: usize) -> ArrayView2<'_, f64> {
    image.index_axis_move(Axis(2), offset)
}

/// Fails on the first non-finite value, reporting its position.
pub fn ensure_finite(index: ArrayView2<'_, f64>, label: &str) -> Result<()> {
    match index.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), v)) => Err(DetectionError::NumericDegeneracy(format!(
            "{} is {} at row {}, col {}",
            label, v, row, col
        ))),
        None => Ok(()),
    }
}
