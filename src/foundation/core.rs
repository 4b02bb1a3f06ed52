use std::sync::Arc;

use crate::foundation::error::{ShadowError, ShadowResult};
use crate::foundation::math::unpremultiply_px;

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Decoded straight-alpha RGBA8 raster, origin top-left.
///
/// Immutable once built; clones share the pixel buffer.
#[derive(Clone, Debug)]
pub struct RasterImage {
    pixels: Arc<image::RgbaImage>,
}

impl RasterImage {
    /// Wrap an already-decoded straight-alpha image.
    pub fn new(pixels: image::RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Build a raster from tightly packed straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> ShadowResult<Self> {
        let expected = rgba_len(width, height)?;
        if data.len() != expected {
            return Err(ShadowError::validation(format!(
                "raster data length {} does not match {width}x{height}x4",
                data.len()
            )));
        }
        let pixels = image::RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| ShadowError::validation("raster data does not fit dimensions"))?;
        Ok(Self::new(pixels))
    }

    /// A raster filled with a single straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(image::RgbaImage::from_pixel(width, height, image::Rgba(rgba)))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrow the underlying image buffer.
    pub fn as_image(&self) -> &image::RgbaImage {
        &self.pixels
    }

    /// Raw straight-alpha RGBA8 bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Return `true` when both rasters share the same pixel allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

/// Monotonic revision stamped on every derived entity.
///
/// Consumers compare revisions instead of deep-comparing buffers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    /// The revision following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Hands out increasing revisions for one kind of derived entity.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevisionCounter {
    current: Revision,
}

impl RevisionCounter {
    /// Advance and return the new revision.
    pub fn bump(&mut self) -> Revision {
        self.current = self.current.next();
        self.current
    }

    /// Latest revision handed out (`Revision(0)` before the first bump).
    pub fn current(&self) -> Revision {
        self.current
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rectangle, in background canvas space, at which the subject is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Placement {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width, always > 0.
    pub w: u32,
    /// Height, always > 0.
    pub h: u32,
}

impl Placement {
    /// `(w, h)` of the placed subject.
    pub fn size(self) -> (u32, u32) {
        (self.w, self.h)
    }

    /// Bottom-center of the placement: where the subject meets the ground.
    pub fn anchor(self) -> Point {
        Point::new(
            f64::from(self.x) + f64::from(self.w) / 2.0,
            f64::from(self.y) + f64::from(self.h),
        )
    }

    /// Placement as a float rectangle.
    pub fn rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.x) + f64::from(self.w),
            f64::from(self.y) + f64::from(self.h),
        )
    }
}

/// A rendered raster as RGBA8 pixels.
///
/// Rendered outputs are **premultiplied alpha**; the flag makes this explicit at API boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent premultiplied frame.
    pub fn transparent(width: u32, height: u32) -> ShadowResult<Self> {
        Ok(Self {
            width,
            height,
            data: vec![0u8; rgba_len(width, height)?],
            premultiplied: true,
        })
    }

    /// Alpha value at `(x, y)`; out-of-bounds reads are transparent.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[((y as usize) * (self.width as usize) + (x as usize)) * 4 + 3]
    }

    /// Return `true` when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Convert into a straight-alpha image suitable for encoding.
    pub fn to_rgba_image(&self) -> ShadowResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            for px in data.chunks_exact_mut(4) {
                let out = unpremultiply_px([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&out);
            }
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| ShadowError::evaluation("frame data does not fit dimensions"))
    }
}

/// Byte length of a tightly packed RGBA8 buffer.
pub(crate) fn rgba_len(width: u32, height: u32) -> ShadowResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ShadowError::evaluation("rgba buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
