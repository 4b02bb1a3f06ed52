use crate::foundation::core::{Affine, Placement, Point, Rect, Vec2};
use crate::foundation::math::lerp;
use crate::params::Light;
use crate::raster::blur::PixelRect;

/// Flattening applied across the cast direction.
pub const SQUASH: f64 = 0.7;

/// Base blur in pixels before the elevation factor.
const BASE_BLUR_PX: f64 = 6.0;
const BLUR_FACTOR_RANGE: (f64, f64) = (0.7, 2.0);

/// Projection frame shared by every draw of one render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowGeometry {
    /// Unit vector the shadow is cast along (opposite the light).
    pub dir: Vec2,
    /// Unit vector perpendicular to `dir`.
    pub perp: Vec2,
    /// Cast length per pixel of subject height: `1 / tan(elevation)`.
    pub k_base: f64,
    /// Bottom-center of the placement.
    pub anchor: Point,
    /// Placement width.
    pub width: f64,
    /// Placement height.
    pub height: f64,
}

impl ShadowGeometry {
    /// Derive the frame for `light` over `placement`. Elevation is clamped to `[1, 89]`.
    pub fn new(light: Light, placement: &Placement) -> Self {
        let rad = light.normalized_angle_deg().to_radians();
        let dir = Vec2::new(-rad.cos(), rad.sin());
        let perp = Vec2::new(-dir.y, dir.x);
        let elev = light.clamped_elevation_deg().to_radians();
        Self {
            dir,
            perp,
            k_base: 1.0 / elev.tan(),
            anchor: placement.anchor(),
            width: f64::from(placement.w),
            height: f64::from(placement.h),
        }
    }

    /// Map silhouette pixels (origin top-left, `w x h`) onto the ground for cast length `k`.
    ///
    /// The base row lands on the anchor, the top row lands `h * k` along `dir`, and the width
    /// is laid out along `perp` scaled by [`SQUASH`].
    pub fn transform(&self, k: f64) -> Affine {
        let ground = Affine::new([
            self.perp.x * SQUASH,
            self.perp.y * SQUASH,
            -k * self.dir.x,
            -k * self.dir.y,
            self.anchor.x,
            self.anchor.y,
        ]);
        ground * Affine::translate((-self.width / 2.0, -self.height))
    }

    /// Cast length of a depth band centered at `z_mid`.
    pub fn k_layer(&self, depth_strength: f64, z_mid: f64) -> f64 {
        self.k_base * (1.0 + depth_strength * z_mid)
    }

    /// Blur standard deviation for the no-depth cast, in pixels.
    pub fn base_blur_sigma(&self) -> f64 {
        BASE_BLUR_PX
            * self
                .k_base
                .clamp(BLUR_FACTOR_RANGE.0, BLUR_FACTOR_RANGE.1)
    }

    /// Length along `dir` over which the depth-aware cast fades out.
    pub fn max_len(&self, depth_strength: f64) -> f64 {
        (self.height * self.k_base * (1.0 + depth_strength.max(0.0)) * 0.9).max(10.0)
    }

    /// Screen pixels touched by the silhouette drawn through `transform`, grown by `pad` and
    /// clipped to the canvas.
    pub(crate) fn pixel_bounds(
        &self,
        transform: Affine,
        pad: u32,
        canvas_w: u32,
        canvas_h: u32,
    ) -> PixelRect {
        let bbox = transform.transform_rect_bbox(Rect::new(0.0, 0.0, self.width, self.height));
        let clip = |v: f64, max: u32| -> u32 {
            if v.is_nan() {
                0
            } else {
                v.clamp(0.0, f64::from(max)) as u32
            }
        };
        PixelRect {
            x0: clip(bbox.x0.floor(), canvas_w),
            y0: clip(bbox.y0.floor(), canvas_h),
            x1: clip(bbox.x1.ceil(), canvas_w),
            y1: clip(bbox.y1.ceil(), canvas_h),
        }
        .inflate_clipped(pad, canvas_w, canvas_h)
    }
}

/// Sharp and blurred opacities plus the blur multiplier of a depth band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStyle {
    /// Opacity of the sharp pass.
    pub sharp_alpha: f32,
    /// Opacity of the blurred pass.
    pub blur_alpha: f32,
    /// Factor applied to the base blur.
    pub blur_scale: f64,
}

impl LayerStyle {
    /// Nearer bands (higher `z_mid`) render fainter and blurrier.
    pub fn for_depth(z_mid: f64) -> Self {
        let z = z_mid.clamp(0.0, 1.0);
        Self {
            sharp_alpha: lerp(0.85, 0.25, z) as f32,
            blur_alpha: lerp(0.06, 0.2, z) as f32,
            blur_scale: lerp(0.7, 1.8, z),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/shadow/geometry.rs"]
mod tests;
