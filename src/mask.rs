use crate::foundation::core::{Placement, RasterImage, Revision, RevisionCounter};
use crate::raster::resample::resample;

/// Subject silhouette at placement size: uniform white RGB, alpha = subject opacity.
#[derive(Clone, Debug)]
pub struct Mask {
    image: RasterImage,
    revision: Revision,
}

impl Mask {
    /// The mask raster (straight alpha).
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    /// `(w, h)` of the mask.
    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Revision stamped when this mask was extracted.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Opacity at `(x, y)`; out-of-bounds reads are transparent.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        let (w, h) = self.size();
        if x >= w || y >= h {
            return 0;
        }
        self.image.as_bytes()[((y as usize) * (w as usize) + (x as usize)) * 4 + 3]
    }

    /// Per-pixel opacities, row-major.
    pub fn alphas(&self) -> impl Iterator<Item = u8> + '_ {
        self.image.as_bytes().chunks_exact(4).map(|px| px[3])
    }

    /// Return `true` when the mask no longer matches `placement` and must be treated as absent.
    pub fn is_stale_for(&self, placement: &Placement) -> bool {
        self.size() != placement.size()
    }

    /// Premultiplied copy of the mask (white scaled by opacity) for drawing.
    pub(crate) fn to_premul_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.image.as_bytes().len());
        for a in self.alphas() {
            out.extend_from_slice(&[a, a, a, a]);
        }
        out
    }
}

/// Produces subject silhouettes and numbers each one with a fresh revision.
#[derive(Debug, Default)]
pub struct MaskExtractor {
    revisions: RevisionCounter,
}

impl MaskExtractor {
    /// Create an extractor whose first mask gets `Revision(1)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision of the most recently extracted mask.
    pub fn current_revision(&self) -> Revision {
        self.revisions.current()
    }

    /// Resample `subject` to the placement size and keep only its opacity.
    ///
    /// Returns `None` for empty subjects; the revision counter only advances on success.
    #[tracing::instrument(skip(self, subject), fields(w = placement.w, h = placement.h))]
    pub fn extract(&mut self, subject: &RasterImage, placement: &Placement) -> Option<Mask> {
        if subject.is_empty() || placement.w == 0 || placement.h == 0 {
            return None;
        }
        let resampled = resample(subject, placement.w, placement.h);

        let mut pixels = resampled.as_image().clone();
        for px in pixels.pixels_mut() {
            px.0 = [255, 255, 255, px.0[3]];
        }

        let revision = self.revisions.bump();
        tracing::debug!(revision = revision.0, "mask extracted");
        Some(Mask {
            image: RasterImage::new(pixels),
            revision,
        })
    }
}

#[cfg(test)]
#[path = "../tests/unit/mask.rs"]
mod tests;
