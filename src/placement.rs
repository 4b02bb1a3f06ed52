use crate::foundation::core::Placement;

/// Fit the subject over the background: scale to fit (never up), bottom-anchored, centered.
///
/// Returns `None` when either raster has a zero dimension.
#[tracing::instrument]
pub fn resolve_placement(subject: (u32, u32), background: (u32, u32)) -> Option<Placement> {
    let (sw, sh) = subject;
    let (bw, bh) = background;
    if sw == 0 || sh == 0 || bw == 0 || bh == 0 {
        return None;
    }

    let scale = fit_scale(subject, background);
    let w = ((scale * f64::from(sw)).round() as u32).clamp(1, bw);
    let h = ((scale * f64::from(sh)).round() as u32).clamp(1, bh);
    let x = (f64::from(bw - w) / 2.0).round() as i32;
    let y = (bh - h) as i32;

    Some(Placement { x, y, w, h })
}

/// Uniform downscale factor that makes the subject fit inside the background.
pub fn fit_scale(subject: (u32, u32), background: (u32, u32)) -> f64 {
    let (sw, sh) = subject;
    let (bw, bh) = background;
    if sw == 0 || sh == 0 {
        return 1.0;
    }
    1.0f64
        .min(f64::from(bw) / f64::from(sw))
        .min(f64::from(bh) / f64::from(sh))
}

#[cfg(test)]
#[path = "../tests/unit/placement.rs"]
mod tests;
