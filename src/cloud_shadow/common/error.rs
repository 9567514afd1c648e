use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Invalid {band} band index {index}: image has {band_count} band(s), indices are 1-based")]
    InvalidBandIndex {
        band: &'static str,
        index: usize,
        band_count: usize,
    },

    #[error("Invalid kernel size {name}={size}: {reason}")]
    InvalidKernelSize {
        name: &'static str,
        size: usize,
        reason: &'static str,
    },

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("Mask shape mismatch: expected {expected:?}, got {actual:?}")]
    MaskShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode raster: {0}")]
    DecodeError(String),

    #[error("Failed to encode mask: {0}")]
    EncodeError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
