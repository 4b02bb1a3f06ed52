use std::path::Path;

use crate::foundation::core::RasterImage;
use crate::foundation::error::{ShadowError, ShadowResult};

/// Decode an encoded image (PNG, JPEG, ...) into a straight-alpha [`RasterImage`].
///
/// Decoding sits outside the shadow pipeline; a failure here is surfaced to the caller and the
/// pipeline keeps whatever it held before.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> ShadowResult<RasterImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ShadowError::decode(format!("decode image from memory: {e}")))?;
    Ok(RasterImage::new(dyn_img.to_rgba8()))
}

/// Read and decode an image file.
pub fn decode_image_path(path: impl AsRef<Path>) -> ShadowResult<RasterImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| ShadowError::decode(format!("failed to read '{}': {e}", path.display())))?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
