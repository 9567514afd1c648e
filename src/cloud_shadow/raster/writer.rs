use std::io::Write;
use crate::cloud_shadow::common::error::Result;
use crate::cloud_shadow::raster::types::{Mask, MaskEncoding, RasterMetadata};

pub trait MaskWriter {
    fn write_mask(
        &self,
        mask: &Mask,
        metadata: &RasterMetadata,
        output: &mut dyn Write,
        encoding: &MaskEncoding,
    ) -> Result<()>;
}
