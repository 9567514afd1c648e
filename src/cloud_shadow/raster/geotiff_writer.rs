use std::io::Write;

use tiff::encoder::colortype::Gray8;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::cloud_shadow::common::error::{DetectionError, Result};
use crate::cloud_shadow::raster::geo_tags::{self, tag};
use crate::cloud_shadow::raster::types::{Mask, MaskEncoding, RasterMetadata, TiffCompression};
use crate::cloud_shadow::raster::writer::MaskWriter;

/// Writes masks as single-band 8-bit GeoTIFFs.
pub struct GeoTiffMaskWriter;

impl MaskWriter for GeoTiffMaskWriter {
    fn write_mask(
        &self,
        mask: &Mask,
        metadata: &RasterMetadata,
        output: &mut dyn Write,
        encoding: &MaskEncoding,
    ) -> Result<()> {
        let (height, width) = mask.dim();
        if (height, width) != (metadata.height, metadata.width) {
            return Err(DetectionError::MaskShapeMismatch {
                expected: (metadata.height, metadata.width),
                actual: (height, width),
            });
        }

        debug!("Encoding mask GeoTIFF: {}x{}", width, height);

        let mut buffer = Vec::new();

        let compression = match encoding.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::PackBits => Compression::Packbits,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        {
            let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
                .map_err(encode_error)?
                .with_compression(compression);

            if let Some(predictor_val) = encoding.predictor {
                let predictor = match predictor_val {
                    2 => Predictor::Horizontal,
                    _ => Predictor::None,
                };
                encoder = encoder.with_predictor(predictor);
            }

            let mut image = encoder
                .new_image::<Gray8>(width as u32, height as u32)
                .map_err(encode_error)?;

            if let Some(gt) = &metadata.geo_transform {
                if gt.is_north_up() {
                    image
                        .encoder()
                        .write_tag(tag(geo_tags::MODEL_PIXEL_SCALE), &gt.pixel_scale()[..])
                        .map_err(encode_error)?;
                    image
                        .encoder()
                        .write_tag(tag(geo_tags::MODEL_TIEPOINT), &gt.tiepoint()[..])
                        .map_err(encode_error)?;
                } else {
                    image
                        .encoder()
                        .write_tag(tag(geo_tags::MODEL_TRANSFORMATION), &gt.model_transformation()[..])
                        .map_err(encode_error)?;
                }
            }

            if let Some(crs) = &metadata.crs {
                image
                    .encoder()
                    .write_tag(tag(geo_tags::GEO_KEY_DIRECTORY), crs.directory.as_slice())
                    .map_err(encode_error)?;
                if let Some(doubles) = &crs.double_params {
                    image
                        .encoder()
                        .write_tag(tag(geo_tags::GEO_DOUBLE_PARAMS), doubles.as_slice())
                        .map_err(encode_error)?;
                }
                if let Some(ascii) = &crs.ascii_params {
                    image
                        .encoder()
                        .write_tag(tag(geo_tags::GEO_ASCII_PARAMS), ascii.as_str())
                        .map_err(encode_error)?;
                }
            }

            if let Some(nodata) = &metadata.nodata {
                image
                    .encoder()
                    .write_tag(tag(geo_tags::GDAL_NODATA), nodata.as_str())
                    .map_err(encode_error)?;
            }

            let data: Vec<u8> = mask.iter().copied().collect();
            image.write_data(&data).map_err(encode_error)?;
        }

        output.write_all(&buffer)?;

        debug!("Mask encoding complete, {} bytes", buffer.len());
        Ok(())
    }
}

fn encode_error(e: tiff::TiffError) -> DetectionError {
    DetectionError::EncodeError(e.to_string())
}
