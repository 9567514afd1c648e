//! Pipeline configuration types

use crate::cloud_shadow::detection::DetectionParams;
use crate::cloud_shadow::raster::types::{MaskEncoding, TiffCompression};

/// Configuration for a load → detect → store run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Band selection, thresholds and kernel sizes
    pub params: DetectionParams,
    /// Compression and predictor for the written masks
    pub encoding: MaskEncoding,
    /// Whether to validate image dimensions before detection
    pub validate_dimensions: bool,
    /// Largest accepted width or height, unlimited when `None`
    pub max_dimension: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            params: DetectionParams::default(),
            encoding: MaskEncoding::default(),
            validate_dimensions: true,
            max_dimension: None,
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    params: Option<DetectionParams>,
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
}

impl PipelineConfigBuilder {
    pub fn params(mut self, params: DetectionParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        PipelineConfig {
            params: self.params.unwrap_or(default.params),
            encoding: MaskEncoding {
                compression: self.compression.unwrap_or(default.encoding.compression),
                predictor: self.predictor.unwrap_or(default.encoding.predictor),
            },
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}
