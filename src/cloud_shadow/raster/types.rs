//! Raster data types shared by the detection core and the GeoTIFF adapters

use std::fmt;

use ndarray::{Array2, Array3};

/// Binary mask, one byte per pixel, values restricted to {0, 1}
pub type Mask = Array2<u8>;

/// Sample type of the source raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::U8 => "uint8",
            ElementType::U16 => "uint16",
            ElementType::U32 => "uint32",
            ElementType::U64 => "uint64",
            ElementType::I8 => "int8",
            ElementType::I16 => "int16",
            ElementType::I32 => "int32",
            ElementType::I64 => "int64",
            ElementType::F32 => "float32",
            ElementType::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Affine pixel-to-world transform, coefficients in GDAL order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    /// Negative for north-up images
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// Builds a transform from ModelPixelScale + ModelTiepoint values.
    ///
    /// Tiepoint layout is `[I, J, K, X, Y, Z]`, scale is `[ScaleX, ScaleY, ScaleZ]`.
    pub fn from_scale_tiepoint(scale: &[f64], tiepoint: &[f64]) -> Option<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return None;
        }
        Some(Self::north_up(
            tiepoint[3] - tiepoint[0] * scale[0],
            tiepoint[4] + tiepoint[1] * scale[1],
            scale[0],
            -scale[1],
        ))
    }

    /// Builds a transform from a row-major 4x4 ModelTransformation matrix.
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }
        Some(Self {
            origin_x: matrix[3],
            pixel_width: matrix[0],
            row_rotation: matrix[1],
            origin_y: matrix[7],
            col_rotation: matrix[4],
            pixel_height: matrix[5],
        })
    }

    pub fn pixel_scale(&self) -> [f64; 3] {
        [self.pixel_width, -self.pixel_height, 0.0]
    }

    pub fn tiepoint(&self) -> [f64; 6] {
        [0.0, 0.0, 0.0, self.origin_x, self.origin_y, 0.0]
    }

    pub fn model_transformation(&self) -> [f64; 16] {
        [
            self.pixel_width, self.row_rotation, 0.0, self.origin_x,
            self.col_rotation, self.pixel_height, 0.0, self.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

/// GeoKey key ids that carry an EPSG code
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

/// Coordinate reference system as stored in the GeoTIFF key directory.
///
/// The key directory and its parameter tags are carried verbatim so that
/// masks are written with exactly the CRS of the source raster.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeys {
    pub directory: Vec<u16>,
    pub double_params: Option<Vec<f64>>,
    pub ascii_params: Option<String>,
}

impl GeoKeys {
    /// EPSG code of the projected or geographic CRS, if the directory stores one inline.
    pub fn epsg(&self) -> Option<u16> {
        if self.directory.len() < 4 {
            return None;
        }
        let key_count = self.directory[3] as usize;
        let entries = self.directory[4..].chunks_exact(4).take(key_count);

        let mut geographic = None;
        for entry in entries {
            let (key_id, location, value) = (entry[0], entry[1], entry[3]);
            if location != 0 {
                continue;
            }
            match key_id {
                PROJECTED_CS_TYPE_GEO_KEY => return Some(value),
                GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
                _ => {}
            }
        }
        geographic
    }
}

/// Metadata describing a raster, mirrored onto the masks written for it
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub element_type: ElementType,
    pub geo_transform: Option<GeoTransform>,
    pub crs: Option<GeoKeys>,
    /// GDAL_NODATA value as stored in the file
    pub nodata: Option<String>,
}

impl RasterMetadata {
    pub fn new(width: usize, height: usize, band_count: usize, element_type: ElementType) -> Self {
        Self {
            width,
            height,
            band_count,
            element_type,
            geo_transform: None,
            crs: None,
            nodata: None,
        }
    }

    /// Metadata for a single-band 8-bit mask derived from this raster.
    ///
    /// Georeferencing is kept as is. A nodata value survives only if it is
    /// representable as `u8`.
    pub fn for_mask(&self) -> Self {
        let nodata = self
            .nodata
            .as_deref()
            .and_then(|v| v.trim().parse::<u8>().ok())
            .map(|v| v.to_string());

        Self {
            band_count: 1,
            element_type: ElementType::U8,
            nodata,
            ..self.clone()
        }
    }
}

/// A multispectral image held in memory as (height, width, band) samples.
#[derive(Debug, Clone)]
pub struct SpectralImage {
    pub data: Array3<f64>,
    pub metadata: RasterMetadata,
}

impl SpectralImage {
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn band_count(&self) -> usize {
        self.data.dim().2
    }
}

/// TIFF compression methods for written masks
#[derive(Debug, Clone, Copy)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// PackBits run-length encoding, a good fit for binary masks
    PackBits,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Encoding options for mask rasters
#[derive(Debug, Clone, Copy)]
pub struct MaskEncoding {
    pub compression: TiffCompression,
    /// Predictor value for compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
}

impl Default for MaskEncoding {
    fn default() -> Self {
        Self {
            compression: TiffCompression::DeflateBalanced,
            predictor: None,
        }
    }
}
