use crate::cloud_shadow::common::error::Result;
use crate::cloud_shadow::raster::types::SpectralImage;

pub trait RasterReader {
    fn read_raster(&self, data: &[u8]) -> Result<SpectralImage>;
}
