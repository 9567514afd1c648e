//! Cloud/shadow detection module
//!
//! Detects clouds and cloud shadows in multispectral rasters from two spectral
//! indices, adaptive thresholds and a spatial cloud/shadow consistency check.

pub mod common;
pub mod detection;
pub mod raster;
pub mod pipeline;

pub use common::{
    DetectionError,
    Result,
};

pub use detection::{
    BandIndices,
    CloudParams,
    CloudShadowMasks,
    DetectionParams,
    DetectionParamsBuilder,
    SearchWindow,
    ShadowParams,
    detect,
    detect_cloud,
    detect_shadow,
};

pub use raster::{
    GeoTiffMaskWriter,
    GeoTiffReader,
    Mask,
    MaskEncoding,
    MaskWriter,
    RasterMetadata,
    RasterReader,
    SpectralImage,
    TiffCompression,
};

pub use pipeline::{
    CloudShadowPipeline,
    PipelineConfig,
    PipelineConfigBuilder,
    PipelineTimings,
};
