//! Raster decoding at the pipeline boundary.

/// Encoded bytes to [`RasterImage`](crate::RasterImage).
pub mod decode;

pub use decode::{decode_image, decode_image_path};
