//! Detection parameters
//!
//! Band indices are 1-based as supplied by the caller and become 0-based
//! offsets only through [`BandIndices::resolve`].

use crate::cloud_shadow::common::error::{DetectionError, Result};

/// 1-based band numbers of the four bands the indices are computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandIndices {
    pub red: usize,
    pub green: usize,
    pub blue: usize,
    pub nir: usize,
}

impl Default for BandIndices {
    fn default() -> Self {
        Self {
            red: 1,
            green: 2,
            blue: 3,
            nir: 4,
        }
    }
}

impl BandIndices {
    pub fn new(red: usize, green: usize, blue: usize, nir: usize) -> Self {
        Self { red, green, blue, nir }
    }

    /// Checks every index against `band_count` and converts to 0-based offsets.
    pub fn resolve(&self, band_count: usize) -> Result<BandOffsets> {
        let offset = |band: &'static str, index: usize| {
            if index == 0 || index > band_count {
                Err(DetectionError::InvalidBandIndex {
                    band,
                    index,
                    band_count,
                })
            } else {
                Ok(index - 1)
            }
        };

        Ok(BandOffsets {
            red: offset("red", self.red)?,
            green: offset("green", self.green)?,
            blue: offset("blue", self.blue)?,
            nir: offset("nir", self.nir)?,
        })
    }
}

/// 0-based band offsets, only obtainable from [`BandIndices::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandOffsets {
    red: usize,
    green: usize,
    blue: usize,
    nir: usize,
}

impl BandOffsets {
    pub fn red(&self) -> usize {
        self.red
    }

    pub fn green(&self) -> usize {
        self.green
    }

    pub fn blue(&self) -> usize {
        self.blue
    }

    pub fn nir(&self) -> usize {
        self.nir
    }
}

/// Spatial search window used to match shadow candidates to clouds.
///
/// Any positive size is accepted; the window need not be odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    /// Window height in rows (T5)
    pub height: usize,
    /// Window width in columns (T6)
    pub width: usize,
}

impl SearchWindow {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn validate(&self) -> Result<()> {
        if self.height == 0 {
            return Err(DetectionError::InvalidKernelSize {
                name: "search_window_height",
                size: self.height,
                reason: "must be a positive integer",
            });
        }
        if self.width == 0 {
            return Err(DetectionError::InvalidKernelSize {
                name: "search_window_width",
                size: self.width,
                reason: "must be a positive integer",
            });
        }
        Ok(())
    }
}

/// Median filter kernels must be odd and at least 1.
pub fn validate_median_kernel(name: &'static str, size: usize) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(DetectionError::InvalidKernelSize {
            name,
            size,
            reason: "median kernel must be a positive odd integer",
        });
    }
    Ok(())
}

/// Cloud stage parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudParams {
    /// Absolute tolerance on `|CI1 - 1|` (T1)
    pub t1: f64,
    /// Blend coefficient between mean and max of CI2 (t2)
    pub t2: f64,
    /// Median kernel applied to the preliminary cloud mask (T7)
    pub median_kernel: usize,
}

impl CloudParams {
    pub fn validate(&self) -> Result<()> {
        validate_median_kernel("cloud_median_kernel", self.median_kernel)
    }
}

/// Shadow stage parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    /// Blend coefficient between min and mean of NIR (t3)
    pub t3: f64,
    /// Blend coefficient between min and mean of Blue (t4)
    pub t4: f64,
    /// Cloud search window (T5 x T6)
    pub search_window: SearchWindow,
    /// Median kernel applied to the refined shadow mask (T8)
    pub median_kernel: usize,
}

impl ShadowParams {
    pub fn validate(&self) -> Result<()> {
        self.search_window.validate()?;
        validate_median_kernel("shadow_median_kernel", self.median_kernel)
    }
}

/// Complete parameter set for one detection run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub bands: BandIndices,
    pub cloud: CloudParams,
    pub shadow: ShadowParams,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            bands: BandIndices::default(),
            cloud: CloudParams {
                t1: 1.0,
                t2: 0.3,
                median_kernel: 3,
            },
            shadow: ShadowParams {
                t3: 0.5,
                t4: 0.5,
                search_window: SearchWindow::new(50, 50),
                median_kernel: 3,
            },
        }
    }
}

impl DetectionParams {
    pub fn builder() -> DetectionParamsBuilder {
        DetectionParamsBuilder::default()
    }

    /// Validates band indices against `band_count` and every kernel size.
    pub fn validate(&self, band_count: usize) -> Result<BandOffsets> {
        let offsets = self.bands.resolve(band_count)?;
        self.cloud.validate()?;
        self.shadow.validate()?;
        Ok(offsets)
    }
}

/// Builder for DetectionParams
#[derive(Default)]
pub struct DetectionParamsBuilder {
    bands: Option<BandIndices>,
    t1: Option<f64>,
    t2: Option<f64>,
    t3: Option<f64>,
    t4: Option<f64>,
    search_window: Option<SearchWindow>,
    cloud_kernel: Option<usize>,
    shadow_kernel: Option<usize>,
}

impl DetectionParamsBuilder {
    pub fn bands(mut self, red: usize, green: usize, blue: usize, nir: usize) -> Self {
        self.bands = Some(BandIndices::new(red, green, blue, nir));
        self
    }

    pub fn t1(mut self, t1: f64) -> Self {
        self.t1 = Some(t1);
        self
    }

    pub fn t2(mut self, t2: f64) -> Self {
        self.t2 = Some(t2);
        self
    }

    pub fn t3(mut self, t3: f64) -> Self {
        self.t3 = Some(t3);
        self
    }

    pub fn t4(mut self, t4: f64) -> Self {
        self.t4 = Some(t4);
        self
    }

    pub fn search_window(mut self, height: usize, width: usize) -> Self {
        self.search_window = Some(SearchWindow::new(height, width));
        self
    }

    pub fn cloud_kernel(mut self, size: usize) -> Self {
        self.cloud_kernel = Some(size);
        self
    }

    pub fn shadow_kernel(mut self, size: usize) -> Self {
        self.shadow_kernel = Some(size);
        self
    }

    pub fn build(self) -> DetectionParams {
        let default = DetectionParams::default();
        DetectionParams {
            bands: self.bands.unwrap_or(default.bands),
            cloud: CloudParams {
                t1: self.t1.unwrap_or(default.cloud.t1),
                t2: self.t2.unwrap_or(default.cloud.t2),
                median_kernel: self.cloud_kernel.unwrap_or(default.cloud.median_kernel),
            },
            shadow: ShadowParams {
                t3: self.t3.unwrap_or(default.shadow.t3),
                t4: self.t4.unwrap_or(default.shadow.t4),
                search_window: self.search_window.unwrap_or(default.shadow.search_window),
                median_kernel: self.shadow_kernel.unwrap_or(default.shadow.median_kernel),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_converts_to_zero_based() {
        let offsets = BandIndices::new(3, 2, 1, 4).resolve(4).unwrap();
        assert_eq!(offsets.red(), 2);
        assert_eq!(offsets.green(), 1);
        assert_eq!(offsets.blue(), 0);
        assert_eq!(offsets.nir(), 3);
    }

    #[test]
    fn test_resolve_rejects_zero_and_overflow() {
        let err = BandIndices::new(0, 2, 3, 4).resolve(4).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidBandIndex { band: "red", index: 0, band_count: 4 }));

        let err = BandIndices::new(1, 2, 3, 5).resolve(4).unwrap_err();
        assert!(matches!(err, DetectionError::InvalidBandIndex { band: "nir", index: 5, .. }));
    }

    #[test]
    fn test_repeated_bands_are_allowed() {
        assert!(BandIndices::new(1, 1, 1, 1).resolve(1).is_ok());
    }

    #[test]
    fn test_median_kernel_validation() {
        assert!(validate_median_kernel("k", 1).is_ok());
        assert!(validate_median_kernel("k", 7).is_ok());
        assert!(matches!(
            validate_median_kernel("k", 0).unwrap_err(),
            DetectionError::InvalidKernelSize { size: 0, .. }
        ));
        assert!(matches!(
            validate_median_kernel("k", 4).unwrap_err(),
            DetectionError::InvalidKernelSize { size: 4, .. }
        ));
    }

    #[test]
    fn test_search_window_accepts_even_sizes() {
        assert!(SearchWindow::new(4, 6).validate().is_ok());
        assert!(SearchWindow::new(0, 6).validate().is_err());
        assert!(SearchWindow::new(6, 0).validate().is_err());
    }

    #[test]
    fn test_builder() {
        let params = DetectionParams::builder()
            .bands(3, 2, 1, 4)
            .t1(0.8)
            .t2(0.25)
            .t3(0.6)
            .t4(0.4)
            .search_window(20, 30)
            .cloud_kernel(5)
            .shadow_kernel(7)
            .build();

        assert_eq!(params.bands, BandIndices::new(3, 2, 1, 4));
        assert_eq!(params.cloud.t1, 0.8);
        assert_eq!(params.cloud.t2, 0.25);
        assert_eq!(params.cloud.median_kernel, 5);
        assert_eq!(params.shadow.t3, 0.6);
        assert_eq!(params.shadow.t4, 0.4);
        assert_eq!(params.shadow.search_window, SearchWindow::new(20, 30));
        assert_eq!(params.shadow.median_kernel, 7);
    }

    #[test]
    fn test_builder_defaults() {
        assert_eq!(DetectionParams::builder().build(), DetectionParams::default());
    }

    #[test]
    fn test_validate_checks_all_kernels() {
        let params = DetectionParams::builder().shadow_kernel(2).build();
        assert!(matches!(
            params.validate(4).unwrap_err(),
            DetectionError::InvalidKernelSize { name: "shadow_median_kernel", .. }
        ));

        let params = DetectionParams::builder().search_window(0, 3).build();
        assert!(matches!(
            params.validate(4).unwrap_err(),
            DetectionError::InvalidKernelSize { name: "search_window_height", .. }
        ));
    }
}
