use rayon::prelude::*;

use crate::foundation::core::rgba_len;
use crate::foundation::error::{ShadowError, ShadowResult};

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PixelRect {
    pub(crate) x0: u32,
    pub(crate) y0: u32,
    pub(crate) x1: u32,
    pub(crate) y1: u32,
}

impl PixelRect {
    pub(crate) fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub(crate) fn width(self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub(crate) fn height(self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub(crate) fn is_empty(self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Grow by `by` pixels on every side, clipped to `width x height`.
    pub(crate) fn inflate_clipped(self, by: u32, width: u32, height: u32) -> Self {
        Self {
            x0: self.x0.saturating_sub(by),
            y0: self.y0.saturating_sub(by),
            x1: self.x1.saturating_add(by).min(width),
            y1: self.y1.saturating_add(by).min(height),
        }
    }
}

/// Kernel radius that covers three standard deviations.
pub(crate) fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Separable Gaussian blur over a premultiplied RGBA8 buffer.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> ShadowResult<Vec<u8>> {
    let expected_len = rgba_len(width, height)?;
    if src.len() != expected_len {
        return Err(ShadowError::evaluation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

/// Blur only `region` of `buf` in place; pixels outside the region are untouched.
///
/// Samples are clamped to the region's edges, so the region must already include the kernel
/// radius around any content that should spread.
pub(crate) fn blur_region_in_place(
    buf: &mut [u8],
    width: u32,
    height: u32,
    region: PixelRect,
    sigma: f32,
) -> ShadowResult<()> {
    if buf.len() != rgba_len(width, height)? {
        return Err(ShadowError::evaluation(
            "blur_region_in_place expects buf matching width*height*4",
        ));
    }
    let bounds = PixelRect::full(width, height);
    let region = PixelRect {
        x0: region.x0.min(bounds.x1),
        y0: region.y0.min(bounds.y1),
        x1: region.x1.min(bounds.x1),
        y1: region.y1.min(bounds.y1),
    };
    let radius = radius_for_sigma(sigma);
    if radius == 0 || region.is_empty() {
        return Ok(());
    }

    let (rw, rh) = (region.width(), region.height());
    let row_bytes = (width as usize) * 4;
    let region_row_bytes = (rw as usize) * 4;

    let mut sub = Vec::with_capacity(rgba_len(rw, rh)?);
    for y in region.y0..region.y1 {
        let start = (y as usize) * row_bytes + (region.x0 as usize) * 4;
        sub.extend_from_slice(&buf[start..start + region_row_bytes]);
    }

    let blurred = blur_rgba8_premul(&sub, rw, rh, radius, sigma)?;

    for (i, y) in (region.y0..region.y1).enumerate() {
        let start = (y as usize) * row_bytes + (region.x0 as usize) * 4;
        buf[start..start + region_row_bytes]
            .copy_from_slice(&blurred[i * region_row_bytes..(i + 1) * region_row_bytes]);
    }
    Ok(())
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ShadowResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ShadowError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(ShadowError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Keep the kernel summing to exactly 1.0 in q16 so flat regions stay flat.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let new_mid = (i64::from(weights[mid]) + delta).clamp(0, 65536);
        weights[mid] = new_mid as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let row_bytes = (width as usize) * 4;
    dst.par_chunks_mut(row_bytes)
        .take(height as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                    let idx = ((y * w + sx) as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                let out_idx = (x as usize) * 4;
                for c in 0..4 {
                    row[out_idx + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    let row_bytes = (width as usize) * 4;
    dst.par_chunks_mut(row_bytes)
        .take(height as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i32;
            for x in 0..w {
                let mut acc = [0u64; 4];
                for (ki, &kw) in k.iter().enumerate() {
                    let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                    let idx = ((sy * w + x) as usize) * 4;
                    for c in 0..4 {
                        acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                    }
                }
                let out_idx = (x as usize) * 4;
                for c in 0..4 {
                    row[out_idx + c] = q16_to_u8(acc[c]);
                }
            }
        });
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/raster/blur.rs"]
mod tests;
