//! GeoTIFF tag codes.
//!
//! Resolved through `Tag::from_u16_exhaustive` so that lookups hit the named
//! variant when the `tiff` crate knows the tag and `Tag::Unknown` otherwise.

use tiff::tags::Tag;

pub const MODEL_PIXEL_SCALE: u16 = 33550;
pub const MODEL_TIEPOINT: u16 = 33922;
pub const MODEL_TRANSFORMATION: u16 = 34264;
pub const GEO_KEY_DIRECTORY: u16 = 34735;
pub const GEO_DOUBLE_PARAMS: u16 = 34736;
pub const GEO_ASCII_PARAMS: u16 = 34737;
pub const GDAL_NODATA: u16 = 42113;

pub fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}
