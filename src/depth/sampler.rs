use crate::foundation::core::{Placement, RasterImage, Revision, RevisionCounter};
use crate::foundation::math::clamp01;
use crate::mask::Mask;
use crate::params::DepthCalibration;
use crate::raster::resample::resample;

/// One calibrated depth value per subject pixel, row-major.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    width: u32,
    height: u32,
    values: Vec<f32>,
    revision: Revision,
}

impl DepthBuffer {
    /// `(w, h)` of the buffer.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// All depth values, row-major, each in `[0, 1]`.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Depth at `(x, y)`; out-of-bounds reads are `0.0`.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Revision stamped when this buffer was built.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Return `true` when the buffer no longer matches `placement` and must be treated as absent.
    pub fn is_stale_for(&self, placement: &Placement) -> bool {
        self.size() != placement.size()
    }

    /// Grayscale visualization: `v = round(z * 255)`, fully opaque.
    pub fn to_grayscale(&self) -> RasterImage {
        let mut img = image::RgbaImage::new(self.width, self.height);
        for (px, &z) in img.pixels_mut().zip(&self.values) {
            let v = depth_to_u8(z);
            px.0 = [v, v, v, 255];
        }
        RasterImage::new(img)
    }

    /// Grayscale visualization clipped by the subject silhouette (alpha = mask alpha).
    ///
    /// Returns `None` when the mask and buffer sizes disagree.
    pub fn to_masked_grayscale(&self, mask: &Mask) -> Option<RasterImage> {
        if mask.size() != self.size() {
            return None;
        }
        let mut img = image::RgbaImage::new(self.width, self.height);
        for ((px, &z), a) in img.pixels_mut().zip(&self.values).zip(mask.alphas()) {
            let v = depth_to_u8(z);
            px.0 = [v, v, v, a];
        }
        Some(RasterImage::new(img))
    }
}

/// Builds [`DepthBuffer`]s and numbers each one with a fresh revision.
#[derive(Debug, Default)]
pub struct DepthSampler {
    revisions: RevisionCounter,
}

impl DepthSampler {
    /// Create a sampler whose first buffer gets `Revision(1)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision of the most recently built buffer.
    pub fn current_revision(&self) -> Revision {
        self.revisions.current()
    }

    /// Sample `source` into a `size` buffer under `calibration`.
    ///
    /// Returns `None` when the source or target is empty.
    #[tracing::instrument(skip(self, source), fields(w = size.0, h = size.1))]
    pub fn sample(
        &mut self,
        source: &RasterImage,
        size: (u32, u32),
        calibration: DepthCalibration,
    ) -> Option<DepthBuffer> {
        let values = sample_depth_values(source, size, calibration)?;
        let revision = self.revisions.bump();
        tracing::debug!(revision = revision.0, "depth buffer built");
        Some(DepthBuffer {
            width: size.0,
            height: size.1,
            values,
            revision,
        })
    }
}

/// Pure depth sampling: place, grayscale, invert, gamma.
///
/// The source is drawn into a `size` canvas at `size * scale`, centered and shifted by the
/// calibration offsets. The drawn rectangle is snapped to whole pixels (origin and size rounded
/// to nearest), so every covered canvas pixel reads exactly one resampled source pixel. Canvas
/// pixels the source does not cover read as depth `0` before inversion.
pub fn sample_depth_values(
    source: &RasterImage,
    size: (u32, u32),
    calibration: DepthCalibration,
) -> Option<Vec<f32>> {
    let (w, h) = size;
    if source.is_empty() || w == 0 || h == 0 {
        return None;
    }
    let cal = calibration.clamped();
    let scale = f64::from(cal.scale);

    let dw = f64::from(w) * scale;
    let dh = f64::from(h) * scale;
    let dx = ((f64::from(w) - dw) / 2.0 + f64::from(cal.offset_x)).round() as i64;
    let dy = ((f64::from(h) - dh) / 2.0 + f64::from(cal.offset_y)).round() as i64;
    let draw_w = (dw.round() as u32).max(1);
    let draw_h = (dh.round() as u32).max(1);

    let drawn = resample(source, draw_w, draw_h);
    let src = drawn.as_bytes();

    let mut values = vec![0.0f32; (w as usize) * (h as usize)];
    for y in 0..h {
        for x in 0..w {
            let sx = i64::from(x) - dx;
            let sy = i64::from(y) - dy;
            let mut z = 0.0f32;
            if sx >= 0 && sy >= 0 && sx < i64::from(draw_w) && sy < i64::from(draw_h) {
                let i = ((sy as usize) * (draw_w as usize) + (sx as usize)) * 4;
                if src[i + 3] != 0 {
                    let sum = u32::from(src[i]) + u32::from(src[i + 1]) + u32::from(src[i + 2]);
                    z = sum as f32 / (3.0 * 255.0);
                }
            }
            if cal.invert {
                z = 1.0 - z;
            }
            values[(y as usize) * (w as usize) + (x as usize)] = clamp01(clamp01(z).powf(cal.gamma));
        }
    }
    Some(values)
}

fn depth_to_u8(z: f32) -> u8 {
    (clamp01(z) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/depth/sampler.rs"]
mod tests;
