use image::imageops::FilterType;

use crate::foundation::core::RasterImage;
use crate::foundation::math::premultiply_rgba8_in_place;

/// Smooth (bilinear) resample to exactly `w x h`. Same-size requests share the source pixels.
pub(crate) fn resample(src: &RasterImage, w: u32, h: u32) -> RasterImage {
    if src.dimensions() == (w, h) {
        return src.clone();
    }
    RasterImage::new(image::imageops::resize(
        src.as_image(),
        w,
        h,
        FilterType::Triangle,
    ))
}

/// Premultiply, then resample to `w x h`, returning premultiplied RGBA8 bytes.
///
/// Filtering premultiplied pixels keeps the color of fully transparent texels out of the
/// result, so cutout edges do not pick up a dark fringe.
pub(crate) fn resample_premultiplied(src: &RasterImage, w: u32, h: u32) -> Vec<u8> {
    let mut premul = src.as_image().clone();
    premultiply_rgba8_in_place(&mut premul);
    if src.dimensions() == (w, h) {
        return premul.into_raw();
    }
    image::imageops::resize(&premul, w, h, FilterType::Triangle).into_raw()
}

#[cfg(test)]
#[path = "../../tests/unit/raster/resample.rs"]
mod tests;
