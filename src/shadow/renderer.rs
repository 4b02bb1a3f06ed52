use crate::depth::layers::DepthLayers;
use crate::foundation::core::{Canvas, FrameRGBA, Placement, Revision, RevisionCounter};
use crate::foundation::error::ShadowResult;
use crate::mask::Mask;
use crate::params::ShadowParams;
use crate::raster::blur::{PixelRect, blur_region_in_place, radius_for_sigma};
use crate::raster::composite::{multiply_alpha_in_place, over_in_place, stencil_black_in_place};
use crate::raster::paint::{ImagePaint, Surface};
use crate::shadow::fade::{DirectionalFade, LocalFade};
use crate::shadow::geometry::{LayerStyle, ShadowGeometry};

const FALLBACK_BLUR_ALPHA: f32 = 0.45;
const FALLBACK_SHARP_ALPHA: f32 = 0.9;

/// Which casting path produced a shadow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowPath {
    /// Whole-silhouette cast with a local vertical fade.
    Fallback,
    /// Per-band cast with a directional fade; `drawn` counts the non-empty bands.
    Depth {
        /// Non-empty bands drawn.
        drawn: usize,
    },
}

/// Rendered shadow: black with variable alpha, sized to the background canvas.
#[derive(Clone, Debug)]
pub struct ShadowRaster {
    frame: FrameRGBA,
    revision: Revision,
    path: ShadowPath,
    placement: Placement,
}

impl ShadowRaster {
    /// Premultiplied pixels.
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Shadow version; bumps on every render.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Casting path taken.
    pub fn path(&self) -> ShadowPath {
        self.path
    }

    /// Placement the shadow was cast from.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// `(w, h)` of the shadow canvas.
    pub fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    /// Return `true` when nothing was cast onto the canvas.
    pub fn is_empty(&self) -> bool {
        self.frame.is_blank()
    }
}

/// Casts shadows from silhouettes or depth bands.
///
/// Owns a drawing surface that is reused across renders.
#[derive(Default)]
pub struct ShadowRenderer {
    surface: Surface,
    revisions: RevisionCounter,
}

impl std::fmt::Debug for ShadowRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowRenderer")
            .field("revision", &self.revisions.current())
            .finish_non_exhaustive()
    }
}

impl ShadowRenderer {
    /// Create a renderer whose first shadow gets `Revision(1)`.
    pub fn new() -> Self {
        Self {
            surface: Surface::new(),
            revisions: RevisionCounter::default(),
        }
    }

    /// Revision of the most recent shadow.
    pub fn current_revision(&self) -> Revision {
        self.revisions.current()
    }

    /// Render the shadow of `mask` placed at `placement` onto a `canvas`-sized raster.
    ///
    /// Takes the depth-aware path when `params.use_depth` is set and `layers` holds at least one
    /// band; otherwise casts the whole silhouette. Returns `Ok(None)` without bumping the
    /// revision when the canvas or placement is empty, or when the mask or layers were built for
    /// a different placement size.
    #[tracing::instrument(skip(self, mask, layers, params), fields(canvas_w = canvas.width, canvas_h = canvas.height))]
    pub fn render(
        &mut self,
        canvas: Canvas,
        placement: &Placement,
        mask: &Mask,
        layers: Option<&DepthLayers>,
        params: &ShadowParams,
    ) -> ShadowResult<Option<ShadowRaster>> {
        if canvas.is_empty() || placement.w == 0 || placement.h == 0 {
            return Ok(None);
        }
        if mask.is_stale_for(placement) {
            tracing::debug!(mask = ?mask.size(), placement = ?placement.size(), "shadow deferred: stale mask");
            return Ok(None);
        }
        let params = params.clamped();
        let layers = if params.use_depth { layers } else { None };
        if let Some(l) = layers
            && l.is_stale_for(placement)
        {
            tracing::debug!(layers = ?l.size(), placement = ?placement.size(), "shadow deferred: stale layers");
            return Ok(None);
        }

        let geometry = ShadowGeometry::new(params.light, placement);
        let mut frame = FrameRGBA::transparent(canvas.width, canvas.height)?;

        let path = match layers {
            Some(l) if !l.is_empty() => {
                let drawn = self.cast_layers(canvas, &geometry, l, &params, &mut frame.data)?;
                ShadowPath::Depth { drawn }
            }
            _ => {
                self.cast_silhouette(canvas, &geometry, mask, &mut frame.data)?;
                ShadowPath::Fallback
            }
        };

        let revision = self.revisions.bump();
        tracing::debug!(revision = revision.0, ?path, "shadow rendered");
        Ok(Some(ShadowRaster {
            frame,
            revision,
            path,
            placement: *placement,
        }))
    }

    fn cast_silhouette(
        &mut self,
        canvas: Canvas,
        geometry: &ShadowGeometry,
        mask: &Mask,
        out: &mut [u8],
    ) -> ShadowResult<()> {
        let (w, h) = mask.size();
        let paint = ImagePaint::from_premul_bytes(&mask.to_premul_bytes(), w, h)?;
        let transform = geometry.transform(geometry.k_base);

        let mut sharp = self
            .surface
            .draw_image(canvas.width, canvas.height, &paint, transform)?;
        stencil_black_in_place(&mut sharp);

        let sigma = geometry.base_blur_sigma() as f32;
        let region =
            geometry.pixel_bounds(transform, radius_for_sigma(sigma), canvas.width, canvas.height);
        let blurred = blurred_copy(&sharp, canvas, region, sigma)?;

        over_in_place(out, &blurred, FALLBACK_BLUR_ALPHA)?;
        over_in_place(out, &sharp, FALLBACK_SHARP_ALPHA)?;

        let fade = LocalFade::new(geometry, transform);
        multiply_alpha_in_place(out, canvas.width, |x, y| fade.factor(x, y));
        Ok(())
    }

    fn cast_layers(
        &mut self,
        canvas: Canvas,
        geometry: &ShadowGeometry,
        layers: &DepthLayers,
        params: &ShadowParams,
        out: &mut [u8],
    ) -> ShadowResult<usize> {
        let (w, h) = layers.size();
        let mut drawn = 0usize;

        for layer in layers.layers().iter().filter(|l| !l.is_empty()) {
            let z_mid = f64::from(layer.z_mid);
            let style = LayerStyle::for_depth(z_mid);
            let transform = geometry.transform(geometry.k_layer(params.depth_strength, z_mid));

            let paint = ImagePaint::from_premul_bytes(layer.raster().as_bytes(), w, h)?;
            let sharp = self
                .surface
                .draw_image(canvas.width, canvas.height, &paint, transform)?;

            let sigma = (geometry.base_blur_sigma() * style.blur_scale) as f32;
            let region = geometry.pixel_bounds(
                transform,
                radius_for_sigma(sigma),
                canvas.width,
                canvas.height,
            );
            let blurred = blurred_copy(&sharp, canvas, region, sigma)?;

            over_in_place(out, &blurred, style.blur_alpha)?;
            over_in_place(out, &sharp, style.sharp_alpha)?;
            drawn += 1;
        }

        let fade = DirectionalFade::new(geometry, params.depth_strength);
        multiply_alpha_in_place(out, canvas.width, |x, y| fade.factor(x, y));
        Ok(drawn)
    }
}

fn blurred_copy(
    sharp: &[u8],
    canvas: Canvas,
    region: PixelRect,
    sigma: f32,
) -> ShadowResult<Vec<u8>> {
    let mut blurred = sharp.to_vec();
    blur_region_in_place(&mut blurred, canvas.width, canvas.height, region, sigma)?;
    Ok(blurred)
}

#[cfg(test)]
#[path = "../../tests/unit/shadow/renderer.rs"]
mod tests;
