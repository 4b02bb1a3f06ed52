//! Final composite: background, then shadow, then subject.

use crate::foundation::core::{FrameRGBA, Placement, RasterImage};
use crate::foundation::error::ShadowResult;
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::raster::composite::{over_at, over_in_place};
use crate::raster::resample::resample_premultiplied;
use crate::shadow::renderer::ShadowRaster;

/// Draw `background` 1:1, `shadow` over it, then `subject` resampled into `placement`.
///
/// The output is premultiplied and sized to the background. A shadow whose size differs from
/// the background is stale and skipped.
#[tracing::instrument(skip_all, fields(w = background.width(), h = background.height()))]
pub fn composite(
    background: &RasterImage,
    shadow: Option<&ShadowRaster>,
    subject: &RasterImage,
    placement: &Placement,
) -> ShadowResult<FrameRGBA> {
    let (bw, bh) = background.dimensions();
    let mut data = background.as_bytes().to_vec();
    premultiply_rgba8_in_place(&mut data);
    let mut frame = FrameRGBA {
        width: bw,
        height: bh,
        data,
        premultiplied: true,
    };

    match shadow {
        Some(s) if s.size() == (bw, bh) => {
            if !s.is_empty() {
                over_in_place(&mut frame.data, &s.frame().data, 1.0)?;
            }
        }
        Some(s) => {
            tracing::debug!(shadow = ?s.size(), "stale shadow skipped");
        }
        None => {}
    }

    if !subject.is_empty() && placement.w > 0 && placement.h > 0 {
        let src = resample_premultiplied(subject, placement.w, placement.h);
        over_at(
            &mut frame.data,
            (bw, bh),
            &src,
            placement.size(),
            (placement.x, placement.y),
        )?;
    }
    Ok(frame)
}

#[cfg(test)]
#[path = "../tests/unit/compose.rs"]
mod tests;
