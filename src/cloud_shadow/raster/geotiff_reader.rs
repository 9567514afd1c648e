//! GeoTIFF reader built on the `tiff` crate.
//!
//! Two band layouts are accepted:
//! - a single chunky (pixel-interleaved) image with one sample per band
//! - a stack of single-sample pages of equal size, one page per band
//!
//! Sample values of any integer or float type are widened to `f64`.

use std::io::{Cursor, Read, Seek};

use ndarray::{Array3, ArrayView2, Axis};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::cloud_shadow::common::error::{DetectionError, Result};
use crate::cloud_shadow::raster::geo_tags::{self, tag};
use crate::cloud_shadow::raster::reader::RasterReader;
use crate::cloud_shadow::raster::types::{
    ElementType, GeoKeys, GeoTransform, RasterMetadata, SpectralImage,
};

/// PlanarConfiguration value for band-sequential storage
const PLANAR_SEPARATE: u32 = 2;

/// Decodes whole scenes into memory. The decoded buffer size is unbounded
/// unless a cap is set with [`GeoTiffReader::with_max_decode_bytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffReader {
    max_decode_bytes: Option<usize>,
}

impl GeoTiffReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_decode_bytes(max_decode_bytes: usize) -> Self {
        Self {
            max_decode_bytes: Some(max_decode_bytes),
        }
    }

    pub(crate) fn decoder_limits(&self) -> Limits {
        let mut limits = Limits::unlimited();
        if let Some(max) = self.max_decode_bytes {
            limits.decoding_buffer_size = max;
        }
        limits
    }
}

impl RasterReader for GeoTiffReader {
    fn read_raster(&self, data: &[u8]) -> Result<SpectralImage> {
        debug!("Decoding GeoTIFF, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(decode_error)?
            .with_limits(self.decoder_limits());

        let (width, height) = decoder.dimensions().map_err(decode_error)?;
        let (width, height) = (width as usize, height as usize);
        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidDimensions(width, height));
        }

        let samples = find_u32(&mut decoder, Tag::SamplesPerPixel)?.unwrap_or(1) as usize;
        if samples > 1 && find_u32(&mut decoder, Tag::PlanarConfiguration)? == Some(PLANAR_SEPARATE) {
            return Err(DetectionError::UnsupportedFormat(
                "band-sequential (planar) multi-sample TIFF".to_string(),
            ));
        }

        // Georeferencing lives on the first IFD; read it before moving to other pages.
        let geo_transform = read_geo_transform(&mut decoder)?;
        let crs = read_geo_keys(&mut decoder)?;
        let nodata = find_ascii(&mut decoder, geo_tags::GDAL_NODATA)?;

        let (first, element_type) = widen_samples(decoder.read_image().map_err(decode_error)?)?;
        if first.len() != width * height * samples {
            return Err(DetectionError::DecodeError(format!(
                "expected {} samples for {}x{}x{}, got {}",
                width * height * samples,
                width,
                height,
                samples,
                first.len()
            )));
        }

        let data = if samples > 1 {
            Array3::from_shape_vec((height, width, samples), first)
                .map_err(|e| DetectionError::DecodeError(e.to_string()))?
        } else {
            let planes = read_band_pages(&mut decoder, first, width, height)?;
            stack_planes(&planes, width, height)?
        };

        let band_count = data.dim().2;
        debug!(
            "Decoded raster: {}x{}, {} band(s) of {}",
            width, height, band_count, element_type
        );

        Ok(SpectralImage {
            data,
            metadata: RasterMetadata {
                width,
                height,
                band_count,
                element_type,
                geo_transform,
                crs,
                nodata,
            },
        })
    }
}

/// Collects the first plane plus every following single-sample page of the same size.
///
/// Pages with other dimensions (overviews, thumbnails) end the band stack.
fn read_band_pages<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    first: Vec<f64>,
    width: usize,
    height: usize,
) -> Result<Vec<Vec<f64>>> {
    let mut planes = vec![first];

    while decoder.more_images() {
        decoder.next_image().map_err(decode_error)?;

        let (page_width, page_height) = decoder.dimensions().map_err(decode_error)?;
        let page_samples = find_u32(decoder, Tag::SamplesPerPixel)?.unwrap_or(1);
        if (page_width as usize, page_height as usize) != (width, height) || page_samples != 1 {
            debug!(
                "Stopping band stack at page {}: {}x{} with {} sample(s)",
                planes.len() + 1,
                page_width,
                page_height,
                page_samples
            );
            break;
        }

        let (plane, _) = widen_samples(decoder.read_image().map_err(decode_error)?)?;
        if plane.len() != width * height {
            return Err(DetectionError::DecodeError(format!(
                "page {} holds {} samples, expected {}",
                planes.len() + 1,
                plane.len(),
                width * height
            )));
        }
        planes.push(plane);
    }

    Ok(planes)
}

fn stack_planes(planes: &[Vec<f64>], width: usize, height: usize) -> Result<Array3<f64>> {
    let mut data = Array3::zeros((height, width, planes.len()));
    for (band, plane) in planes.iter().enumerate() {
        let view = ArrayView2::from_shape((height, width), plane)
            .map_err(|e| DetectionError::DecodeError(e.to_string()))?;
        data.index_axis_mut(Axis(2), band).assign(&view);
    }
    Ok(data)
}

fn widen_samples(result: DecodingResult) -> Result<(Vec<f64>, ElementType)> {
    let widened = match result {
        DecodingResult::U8(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::U8),
        DecodingResult::U16(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::U16),
        DecodingResult::U32(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::U32),
        DecodingResult::U64(buf) => (buf.into_iter().map(|v| v as f64).collect(), ElementType::U64),
        DecodingResult::I8(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::I8),
        DecodingResult::I16(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::I16),
        DecodingResult::I32(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::I32),
        DecodingResult::I64(buf) => (buf.into_iter().map(|v| v as f64).collect(), ElementType::I64),
        DecodingResult::F32(buf) => (buf.into_iter().map(f64::from).collect(), ElementType::F32),
        DecodingResult::F64(buf) => (buf, ElementType::F64),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(DetectionError::UnsupportedFormat(
                "TIFF sample format".to_string(),
            ));
        }
    };
    Ok(widened)
}

/// Prefers ModelTransformation, falls back to ModelPixelScale + ModelTiepoint.
fn read_geo_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoTransform>> {
    if let Some(matrix) = find_f64_vec(decoder, geo_tags::MODEL_TRANSFORMATION)? {
        return Ok(GeoTransform::from_model_transformation(&matrix));
    }

    let scale = find_f64_vec(decoder, geo_tags::MODEL_PIXEL_SCALE)?;
    let tiepoint = find_f64_vec(decoder, geo_tags::MODEL_TIEPOINT)?;
    Ok(match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => GeoTransform::from_scale_tiepoint(&scale, &tiepoint),
        _ => None,
    })
}

fn read_geo_keys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoKeys>> {
    let Some(directory) = decoder
        .find_tag(tag(geo_tags::GEO_KEY_DIRECTORY))
        .map_err(decode_error)?
    else {
        return Ok(None);
    };

    Ok(Some(GeoKeys {
        directory: directory.into_u16_vec().map_err(decode_error)?,
        double_params: find_f64_vec(decoder, geo_tags::GEO_DOUBLE_PARAMS)?,
        ascii_params: find_ascii(decoder, geo_tags::GEO_ASCII_PARAMS)?,
    }))
}

fn find_u32<R: Read + Seek>(decoder: &mut Decoder<R>, tag: Tag) -> Result<Option<u32>> {
    decoder
        .find_tag(tag)
        .map_err(decode_error)?
        .map(|value| value.into_u32())
        .transpose()
        .map_err(decode_error)
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<Vec<f64>>> {
    decoder
        .find_tag(tag(code))
        .map_err(decode_error)?
        .map(|value| value.into_f64_vec())
        .transpose()
        .map_err(decode_error)
}

fn find_ascii<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<String>> {
    let value = decoder
        .find_tag(tag(code))
        .map_err(decode_error)?
        .map(|value| value.into_string())
        .transpose()
        .map_err(decode_error)?;
    Ok(value.map(|s| s.trim_end_matches('\0').to_string()))
}

fn decode_error(e: tiff::TiffError) -> DetectionError {
    DetectionError::DecodeError(e.to_string())
}
