use crate::foundation::core::{Affine, Point};
use crate::shadow::geometry::ShadowGeometry;

/// Opacity stop of the directional fade at 75% of the fade length.
const DIRECTIONAL_MID_STOP: f64 = 0.55;

/// Vertical fade in silhouette space: transparent at the top row, opaque at the base.
///
/// `inverse` maps screen space back to silhouette pixels. Screen pixels outside the silhouette
/// rectangle get 0.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LocalFade {
    inverse: Affine,
    width: f64,
    height: f64,
}

impl LocalFade {
    pub(crate) fn new(geometry: &ShadowGeometry, transform: Affine) -> Self {
        Self {
            inverse: transform.inverse(),
            width: geometry.width,
            height: geometry.height,
        }
    }

    pub(crate) fn factor(&self, x: u32, y: u32) -> f32 {
        if self.height <= 0.0 {
            return 0.0;
        }
        let p = self.inverse * pixel_center(x, y);
        if !(0.0..=self.width).contains(&p.x) || !(0.0..=self.height).contains(&p.y) {
            return 0.0;
        }
        (p.y / self.height).clamp(0.0, 1.0) as f32
    }
}

/// Screen-space fade along the cast direction, starting at the anchor.
///
/// Opaque before the anchor, `0.55` at 75% of `max_len`, transparent from `max_len` on.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DirectionalFade {
    anchor: Point,
    dir: (f64, f64),
    max_len: f64,
}

impl DirectionalFade {
    pub(crate) fn new(geometry: &ShadowGeometry, depth_strength: f64) -> Self {
        Self {
            anchor: geometry.anchor,
            dir: (geometry.dir.x, geometry.dir.y),
            max_len: geometry.max_len(depth_strength),
        }
    }

    pub(crate) fn factor(&self, x: u32, y: u32) -> f32 {
        let p = pixel_center(x, y);
        let s = (p.x - self.anchor.x) * self.dir.0 + (p.y - self.anchor.y) * self.dir.1;
        directional_stop(s / self.max_len) as f32
    }
}

fn directional_stop(t: f64) -> f64 {
    if t <= 0.0 {
        1.0
    } else if t < 0.75 {
        1.0 + (DIRECTIONAL_MID_STOP - 1.0) * (t / 0.75)
    } else if t < 1.0 {
        DIRECTIONAL_MID_STOP * (1.0 - (t - 0.75) / 0.25)
    } else {
        0.0
    }
}

fn pixel_center(x: u32, y: u32) -> Point {
    Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5)
}

#[cfg(test)]
#[path = "../../tests/unit/shadow/fade.rs"]
mod tests;
