use std::sync::Arc;

use crate::foundation::core::{Affine, rgba_len};
use crate::foundation::error::{ShadowError, ShadowResult};

/// A premultiplied raster prepared as a `vello_cpu` image paint.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    paint: vello_cpu::Image,
    pub(crate) w: u32,
    pub(crate) h: u32,
}

impl ImagePaint {
    pub(crate) fn from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> ShadowResult<Self> {
        let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w: width,
            h: height,
        })
    }
}

/// Reusable `vello_cpu` drawing surface.
///
/// The render context is shared across draws, so every draw starts and ends with all drawing
/// state (blend mode, transforms) back at defaults.
#[derive(Default)]
pub(crate) struct Surface {
    ctx: Option<vello_cpu::RenderContext>,
}

impl Surface {
    pub(crate) fn new() -> Self {
        Self { ctx: None }
    }

    /// Rasterize `image` through `transform` onto a fresh transparent `width x height` target and
    /// return its premultiplied bytes.
    pub(crate) fn draw_image(
        &mut self,
        width: u32,
        height: u32,
        image: &ImagePaint,
        transform: Affine,
    ) -> ShadowResult<Vec<u8>> {
        let w16 = to_u16(width, "surface width")?;
        let h16 = to_u16(height, "surface height")?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w16 && ctx.height() == h16 => ctx,
            _ => vello_cpu::RenderContext::new(w16, h16),
        };
        ctx.reset();
        reset_state(&mut ctx);

        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(image.paint.clone());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(image.w),
            f64::from(image.h),
        ));
        ctx.flush();

        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);

        reset_state(&mut ctx);
        self.ctx = Some(ctx);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }
}

fn reset_state(ctx: &mut vello_cpu::RenderContext) {
    ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
}

fn to_u16(v: u32, what: &str) -> ShadowResult<u16> {
    v.try_into()
        .map_err(|_| ShadowError::evaluation(format!("{what} exceeds u16: {v}")))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ShadowResult<vello_cpu::Pixmap> {
    let w = to_u16(width, "pixmap width")?;
    let h = to_u16(height, "pixmap height")?;
    if bytes.len() != rgba_len(width, height)? {
        return Err(ShadowError::evaluation("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/raster/paint.rs"]
mod tests;
