//! Raster boundary adapters
//!
//! Loads multispectral GeoTIFFs into memory and stores single-band masks,
//! carrying georeferencing from the source raster to every mask.

mod reader;
mod writer;
mod geotiff_reader;
mod geotiff_writer;
pub(crate) mod geo_tags;
pub mod types;


pub use reader::RasterReader;
pub use writer::MaskWriter;
pub use geotiff_reader::GeoTiffReader;
pub use geotiff_writer::GeoTiffMaskWriter;
pub use types::{
    ElementType, GeoKeys, GeoTransform, Mask, MaskEncoding, RasterMetadata, SpectralImage,
    TiffCompression,
};
