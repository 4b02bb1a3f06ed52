use crate::foundation::error::{ShadowError, ShadowResult};
use crate::foundation::math::{mul_div255_u8, opacity_to_u8};

pub(crate) type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over of premultiplied pixels with an extra source opacity.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = u16::from(opacity_to_u8(opacity));
    if op == 0 || src[3] == 0 {
        return dst;
    }

    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Source-over a whole same-sized buffer onto `dst`.
pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ShadowResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ShadowError::evaluation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    if opacity_to_u8(opacity) == 0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Source-over a `src_w x src_h` buffer onto a `dst_w x dst_h` buffer at offset `(x, y)`.
///
/// Parts of the source falling outside the destination are clipped.
pub(crate) fn over_at(
    dst: &mut [u8],
    dst_size: (u32, u32),
    src: &[u8],
    src_size: (u32, u32),
    offset: (i32, i32),
) -> ShadowResult<()> {
    let (dw, dh) = dst_size;
    let (sw, sh) = src_size;
    if dst.len() != (dw as usize) * (dh as usize) * 4 || src.len() != (sw as usize) * (sh as usize) * 4
    {
        return Err(ShadowError::evaluation(
            "over_at expects buffers matching their sizes",
        ));
    }

    let (ox, oy) = (i64::from(offset.0), i64::from(offset.1));
    let x_start = ox.max(0);
    let y_start = oy.max(0);
    let x_end = (ox + i64::from(sw)).min(i64::from(dw));
    let y_end = (oy + i64::from(sh)).min(i64::from(dh));

    for y in y_start..y_end {
        let sy = (y - oy) as usize;
        for x in x_start..x_end {
            let sx = (x - ox) as usize;
            let si = (sy * (sw as usize) + sx) * 4;
            let di = ((y as usize) * (dw as usize) + (x as usize)) * 4;
            let s = [src[si], src[si + 1], src[si + 2], src[si + 3]];
            let d = [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]];
            dst[di..di + 4].copy_from_slice(&over(d, s, 1.0));
        }
    }
    Ok(())
}

/// Recolor to opaque black while keeping each pixel's coverage (a `source-in` black fill).
pub(crate) fn stencil_black_in_place(buf: &mut [u8]) {
    for px in buf.chunks_exact_mut(4) {
        px[0] = 0;
        px[1] = 0;
        px[2] = 0;
    }
}

/// Multiply every pixel by a per-pixel factor in `[0, 1]` (a `destination-in` fill).
pub(crate) fn multiply_alpha_in_place(
    buf: &mut [u8],
    width: u32,
    factor: impl Fn(u32, u32) -> f32,
) {
    if width == 0 {
        return;
    }
    for (i, px) in buf.chunks_exact_mut(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let f = u16::from(opacity_to_u8(factor(x, y)));
        if f == 255 {
            continue;
        }
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), f);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/composite.rs"]
mod tests;
