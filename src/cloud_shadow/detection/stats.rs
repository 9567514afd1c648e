//! Whole-image statistics backing the adaptive thresholds

use ndarray::ArrayView2;

use crate::cloud_shadow::common::error::{DetectionError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Min, max and mean over every pixel of `values`.
///
/// Fails with `NumericDegeneracy` on an empty input or when any statistic is
/// not finite, so NaN never reaches a threshold.
pub fn stats(values: ArrayView2<'_, f64>, label: &str) -> Result<Stats> {
    if values.is_empty() {
        return Err(DetectionError::NumericDegeneracy(format!(
            "{} has no pixels",
            label
        )));
    }

    let (min, max, sum) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
    );
    let mean = sum / values.len() as f64;

    // f64::min/max skip NaN, the sum does not.
    if !(min.is_finite() && max.is_finite() && mean.is_finite()) {
        return Err(DetectionError::NumericDegeneracy(format!(
            "{} statistics are not finite (min={}, max={}, mean={})",
            label, min, max, mean
        )));
    }

    Ok(Stats { min, max, mean })
}

/// Rejects a derived threshold that is NaN or infinite.
pub fn finite_threshold(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DetectionError::NumericDegeneracy(format!(
            "threshold {} is not finite ({})",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    #[test]
    fn test_basic_stats() {
        let values = array![[1.0, 2.0], [3.0, 6.0]];
        let s = stats(values.view(), "test").unwrap();
        assert_eq!(s, Stats { min: 1.0, max: 6.0, mean: 3.0 });
    }

    #[test]
    fn test_nan_is_degenerate() {
        let values = array![[1.0, f64::NAN], [3.0, 6.0]];
        assert!(matches!(
            stats(values.view(), "test").unwrap_err(),
            DetectionError::NumericDegeneracy(_)
        ));
    }

    #[test]
    fn test_infinity_is_degenerate() {
        let values = array![[1.0, f64::INFINITY]];
        assert!(stats(values.view(), "test").is_err());
    }

    #[test]
    fn test_empty_is_degenerate() {
        let values: Array2<f64> = Array2::zeros((0, 3));
        assert!(stats(values.view(), "test").is_err());
    }

    #[test]
    fn test_finite_threshold() {
        assert_eq!(finite_threshold("T2", 0.5).unwrap(), 0.5);
        assert!(finite_threshold("T2", f64::NAN).is_err());
    }
}
