use crate::depth::sampler::DepthBuffer;
use crate::foundation::core::{Placement, RasterImage, Revision, RevisionCounter};
use crate::mask::Mask;

/// One depth band of the silhouette.
#[derive(Clone, Debug)]
pub struct DepthLayer {
    /// Band index, 0 = farthest.
    pub index: u32,
    /// Inclusive lower bound.
    pub z0: f32,
    /// Upper bound; exclusive except for the last band.
    pub z1: f32,
    /// `(z0 + z1) / 2`.
    pub z_mid: f32,
    /// Number of subject pixels in this band.
    pub pixel_count: usize,
    raster: RasterImage,
}

impl DepthLayer {
    /// Black raster whose opacity is the mask opacity inside the band and 0 elsewhere.
    pub fn raster(&self) -> &RasterImage {
        &self.raster
    }

    /// Return `true` when no subject pixel falls in this band.
    pub fn is_empty(&self) -> bool {
        self.pixel_count == 0
    }
}

/// Ordered depth bands (far to near) built from one mask and one depth buffer.
#[derive(Clone, Debug)]
pub struct DepthLayers {
    layers: Vec<DepthLayer>,
    size: (u32, u32),
    revision: Revision,
    mask_revision: Revision,
    depth_revision: Revision,
}

impl DepthLayers {
    /// Bands in far-to-near order. Empty bands are kept so indices map to stable `z_mid`s.
    pub fn layers(&self) -> &[DepthLayer] {
        &self.layers
    }

    /// Number of bands.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Return `true` when there are no bands.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// `(w, h)` shared by every band raster.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Revision stamped when the bands were sliced.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Revisions of the mask and depth buffer the bands were sliced from.
    pub fn source_revisions(&self) -> (Revision, Revision) {
        (self.mask_revision, self.depth_revision)
    }

    /// Return `true` when the bands no longer match `placement` and must be treated as absent.
    pub fn is_stale_for(&self, placement: &Placement) -> bool {
        self.size != placement.size()
    }
}

/// Band index for `z` among `layer_count` bands: `z0 <= z < z1`, last band closed at 1.
pub fn band_index(z: f32, layer_count: u32) -> u32 {
    let n = layer_count.max(1);
    let nf = n as f32;
    let z = z.clamp(0.0, 1.0);
    let mut li = ((z * nf).floor() as i64).clamp(0, i64::from(n) - 1) as u32;
    // Settle float rounding against the exact boundary comparisons.
    while li > 0 && z < li as f32 / nf {
        li -= 1;
    }
    while li + 1 < n && z >= (li + 1) as f32 / nf {
        li += 1;
    }
    li
}

/// Slices silhouettes into depth bands and numbers each slicing with a fresh revision.
#[derive(Debug, Default)]
pub struct DepthSlicer {
    revisions: RevisionCounter,
}

impl DepthSlicer {
    /// Create a slicer whose first result gets `Revision(1)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision of the most recent slicing.
    pub fn current_revision(&self) -> Revision {
        self.revisions.current()
    }

    /// Partition the mask's subject pixels (alpha > 0) into `layer_count` depth bands.
    ///
    /// Returns `None` when the mask and depth buffer sizes disagree.
    #[tracing::instrument(skip(self, mask, depth))]
    pub fn slice(
        &mut self,
        mask: &Mask,
        depth: &DepthBuffer,
        layer_count: u32,
    ) -> Option<DepthLayers> {
        if mask.size() != depth.size() {
            tracing::debug!(mask = ?mask.size(), depth = ?depth.size(), "layer slicing deferred");
            return None;
        }
        let n = layer_count.max(1);
        let (w, h) = mask.size();

        let mut bands: Vec<image::RgbaImage> = (0..n).map(|_| image::RgbaImage::new(w, h)).collect();
        let mut counts = vec![0usize; n as usize];

        for (i, (a, &z)) in mask.alphas().zip(depth.values()).enumerate() {
            if a == 0 {
                continue;
            }
            let li = band_index(z, n) as usize;
            let x = (i % w as usize) as u32;
            let y = (i / w as usize) as u32;
            bands[li].put_pixel(x, y, image::Rgba([0, 0, 0, a]));
            counts[li] += 1;
        }

        let nf = n as f32;
        let layers = bands
            .into_iter()
            .zip(counts)
            .enumerate()
            .map(|(li, (raster, pixel_count))| {
                let z0 = li as f32 / nf;
                let z1 = (li + 1) as f32 / nf;
                DepthLayer {
                    index: li as u32,
                    z0,
                    z1,
                    z_mid: (z0 + z1) / 2.0,
                    pixel_count,
                    raster: RasterImage::new(raster),
                }
            })
            .collect();

        let revision = self.revisions.bump();
        tracing::debug!(revision = revision.0, layers = n, "depth layers sliced");
        Some(DepthLayers {
            layers,
            size: (w, h),
            revision,
            mask_revision: mask.revision(),
            depth_revision: depth.revision(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/depth/layers.rs"]
mod tests;
