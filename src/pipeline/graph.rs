use crate::compose::composite;
use crate::depth::layers::{DepthLayers, DepthSlicer};
use crate::depth::sampler::{DepthBuffer, DepthSampler};
use crate::foundation::core::{
    Canvas, FrameRGBA, Placement, RasterImage, Revision, RevisionCounter,
};
use crate::foundation::error::ShadowResult;
use crate::mask::{Mask, MaskExtractor};
use crate::params::ShadowParams;
use crate::pipeline::cancel::{CommitOutcome, DecodeTicket, InputSlot, SlotTokens};
use crate::pipeline::fingerprint::{ParamsFingerprint, fingerprint_calibration, fingerprint_cast};
use crate::placement::resolve_placement;
use crate::shadow::renderer::{ShadowRaster, ShadowRenderer};

/// A derived node of the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Subject rectangle on the background.
    Placement,
    /// Subject silhouette.
    Mask,
    /// Calibrated depth buffer.
    Depth,
    /// Depth bands.
    Layers,
    /// Shadow raster.
    Shadow,
    /// Background + shadow + subject.
    Composite,
}

/// A stage that failed during a refresh. Its previous output is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFailure {
    /// The failing stage.
    pub stage: Stage,
    /// Rendered error.
    pub message: String,
}

/// Nodes rebuilt by one [`ShadowPipeline::refresh`], in rebuild order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Rebuilt stages.
    pub rebuilt: Vec<Stage>,
    /// Stages that failed; downstream stages still ran.
    pub failed: Vec<StageFailure>,
}

impl RefreshReport {
    /// Return `true` when `stage` was rebuilt.
    pub fn contains(&self, stage: Stage) -> bool {
        self.rebuilt.contains(&stage)
    }

    /// Return `true` when `stage` failed.
    pub fn has_failed(&self, stage: Stage) -> bool {
        self.failed.iter().any(|f| f.stage == stage)
    }

    /// Return `true` when nothing was rebuilt.
    pub fn is_empty(&self) -> bool {
        self.rebuilt.is_empty()
    }
}

#[derive(Clone, Debug)]
struct Input {
    image: RasterImage,
    revision: Revision,
}

/// A derived value and the key it was built from.
#[derive(Clone, Debug)]
struct Built<T, K> {
    value: T,
    key: K,
}

impl<T, K: PartialEq> Built<T, K> {
    fn is_built_from(&self, key: &K) -> bool {
        self.key == *key
    }
}

fn up_to_date<T, K: PartialEq>(node: &Option<Built<T, K>>, key: &K) -> bool {
    node.as_ref().is_some_and(|n| n.is_built_from(key))
}

fn fresh_mask(node: &Option<Built<Mask, MaskKey>>, placement: Placement) -> Option<&Mask> {
    node.as_ref()
        .map(|m| &m.value)
        .filter(|m| !m.is_stale_for(&placement))
}

fn fresh_depth(node: &Option<Built<DepthBuffer, DepthKey>>, placement: Placement) -> Option<&DepthBuffer> {
    node.as_ref()
        .map(|d| &d.value)
        .filter(|d| !d.is_stale_for(&placement))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PlacementKey {
    subject: Revision,
    background: Revision,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MaskKey {
    subject: Revision,
    size: (u32, u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DepthKey {
    source: Revision,
    size: (u32, u32),
    calibration: ParamsFingerprint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LayersKey {
    mask: Revision,
    depth: Revision,
    layer_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ShadowKey {
    canvas: Canvas,
    placement: Placement,
    mask: Revision,
    layers: Option<Revision>,
    cast: ParamsFingerprint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CompositeKey {
    background: Revision,
    subject: Revision,
    placement: Placement,
    shadow: Option<Revision>,
}

/// Explicit dependency graph from raster inputs and parameters to the final composite.
///
/// Every derived node remembers the revisions and parameter fingerprints it was built from and is
/// rebuilt by [`refresh`](Self::refresh) only when those change. A stage that cannot run (missing
/// input, deferred render) leaves its previous output in place.
pub struct ShadowPipeline {
    subject: Option<Input>,
    background: Option<Input>,
    depth_source: Option<Input>,
    params: ShadowParams,
    input_revisions: RevisionCounter,
    tokens: SlotTokens,

    placement: Option<Built<Placement, PlacementKey>>,
    mask_extractor: MaskExtractor,
    mask: Option<Built<Mask, MaskKey>>,
    depth_sampler: DepthSampler,
    depth: Option<Built<DepthBuffer, DepthKey>>,
    slicer: DepthSlicer,
    layers: Option<Built<DepthLayers, LayersKey>>,
    renderer: ShadowRenderer,
    shadow: Option<Built<ShadowRaster, ShadowKey>>,
    composite: Option<Built<FrameRGBA, CompositeKey>>,
}

impl std::fmt::Debug for ShadowPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowPipeline")
            .field("params", &self.params)
            .field("placement", &self.placement())
            .field("mask", &self.mask.as_ref().map(|m| m.value.revision()))
            .field("depth", &self.depth.as_ref().map(|d| d.value.revision()))
            .field("layers", &self.layers.as_ref().map(|l| l.value.revision()))
            .field("shadow", &self.shadow_revision())
            .finish_non_exhaustive()
    }
}

impl Default for ShadowPipeline {
    fn default() -> Self {
        Self::new(ShadowParams::default())
    }
}

impl ShadowPipeline {
    /// Empty pipeline with `params`. Parameters are clamped on use, not here.
    pub fn new(params: ShadowParams) -> Self {
        Self {
            subject: None,
            background: None,
            depth_source: None,
            params,
            input_revisions: RevisionCounter::default(),
            tokens: SlotTokens::default(),
            placement: None,
            mask_extractor: MaskExtractor::new(),
            mask: None,
            depth_sampler: DepthSampler::new(),
            depth: None,
            slicer: DepthSlicer::new(),
            layers: None,
            renderer: ShadowRenderer::new(),
            shadow: None,
            composite: None,
        }
    }

    /// Current parameters as set.
    pub fn params(&self) -> &ShadowParams {
        &self.params
    }

    /// Replace the parameters after validating them.
    pub fn set_params(&mut self, params: ShadowParams) -> ShadowResult<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Set the subject directly, superseding any in-flight subject decode.
    pub fn set_subject(&mut self, image: RasterImage) {
        self.tokens.supersede(InputSlot::Subject);
        self.apply_input(InputSlot::Subject, Some(image));
    }

    /// Set the background directly, superseding any in-flight background decode.
    pub fn set_background(&mut self, image: RasterImage) {
        self.tokens.supersede(InputSlot::Background);
        self.apply_input(InputSlot::Background, Some(image));
    }

    /// Set the depth source directly, superseding any in-flight depth decode.
    pub fn set_depth_source(&mut self, image: RasterImage) {
        self.tokens.supersede(InputSlot::DepthSource);
        self.apply_input(InputSlot::DepthSource, Some(image));
    }

    /// Remove the depth source; the next refresh falls back to the whole-silhouette cast.
    pub fn clear_depth_source(&mut self) {
        self.tokens.supersede(InputSlot::DepthSource);
        self.apply_input(InputSlot::DepthSource, None);
    }

    /// Start a decode for `slot`, cancelling the previous in-flight decode for that slot.
    pub fn begin_decode(&mut self, slot: InputSlot) -> DecodeTicket {
        self.tokens.issue(slot)
    }

    /// Hand a finished decode back to the pipeline.
    ///
    /// A superseded ticket discards its result, errors included. A decode error on a current
    /// ticket is returned to the caller and leaves the slot's previous input in place.
    pub fn commit_decoded(
        &mut self,
        ticket: DecodeTicket,
        decoded: ShadowResult<RasterImage>,
    ) -> ShadowResult<CommitOutcome> {
        if !self.tokens.is_current(&ticket) {
            tracing::debug!(slot = ?ticket.slot(), generation = ticket.generation(), "superseded decode discarded");
            return Ok(CommitOutcome::Superseded);
        }
        self.tokens.retire(&ticket);
        let image = decoded?;
        self.apply_input(ticket.slot(), Some(image));
        Ok(CommitOutcome::Applied)
    }

    fn apply_input(&mut self, slot: InputSlot, image: Option<RasterImage>) {
        let input = image.map(|image| Input {
            image,
            revision: self.input_revisions.bump(),
        });
        match slot {
            InputSlot::Subject => {
                self.subject = input;
                self.placement = None;
            }
            InputSlot::Background => {
                self.background = input;
                self.placement = None;
            }
            InputSlot::DepthSource => self.depth_source = input,
        }
    }

    /// Rebuild every node whose inputs changed since it was last built.
    ///
    /// A failing shadow stage is recorded in [`RefreshReport::failed`] and the composite is
    /// still built, without a shadow unless an earlier one still matches. Composite errors are
    /// returned.
    #[tracing::instrument(skip(self))]
    pub fn refresh(&mut self) -> ShadowResult<RefreshReport> {
        let params = self.params.clamped();
        let mut report = RefreshReport::default();

        self.refresh_placement(&mut report);
        let Some(placement) = self.placement() else {
            tracing::debug!("no placement; derived outputs left as they were");
            return Ok(report);
        };

        self.refresh_mask(placement, &mut report);
        self.refresh_depth(placement, &params, &mut report);
        self.refresh_layers(placement, &params, &mut report);
        if let Err(err) = self.refresh_shadow(placement, &params, &mut report) {
            tracing::warn!(error = %err, "shadow stage failed; keeping the previous shadow");
            report.failed.push(StageFailure {
                stage: Stage::Shadow,
                message: err.to_string(),
            });
        }
        self.refresh_composite(placement, &mut report)?;

        tracing::debug!(rebuilt = ?report.rebuilt, "pipeline refreshed");
        Ok(report)
    }

    fn refresh_placement(&mut self, report: &mut RefreshReport) {
        let (Some(subject), Some(background)) = (&self.subject, &self.background) else {
            self.placement = None;
            return;
        };
        let key = PlacementKey {
            subject: subject.revision,
            background: background.revision,
        };
        if up_to_date(&self.placement, &key) {
            return;
        }
        self.placement = resolve_placement(subject.image.dimensions(), background.image.dimensions())
            .map(|value| Built { value, key });
        if self.placement.is_some() {
            report.rebuilt.push(Stage::Placement);
        }
    }

    fn refresh_mask(&mut self, placement: Placement, report: &mut RefreshReport) {
        let Some(subject) = &self.subject else {
            return;
        };
        let key = MaskKey {
            subject: subject.revision,
            size: placement.size(),
        };
        if up_to_date(&self.mask, &key) {
            return;
        }
        if let Some(value) = self.mask_extractor.extract(&subject.image, &placement) {
            self.mask = Some(Built { value, key });
            report.rebuilt.push(Stage::Mask);
        }
    }

    fn refresh_depth(
        &mut self,
        placement: Placement,
        params: &ShadowParams,
        report: &mut RefreshReport,
    ) {
        let Some(source) = &self.depth_source else {
            self.depth = None;
            self.layers = None;
            return;
        };
        let key = DepthKey {
            source: source.revision,
            size: placement.size(),
            calibration: fingerprint_calibration(&params.calibration),
        };
        if up_to_date(&self.depth, &key) {
            return;
        }
        if let Some(value) =
            self.depth_sampler
                .sample(&source.image, placement.size(), params.calibration)
        {
            self.depth = Some(Built { value, key });
            report.rebuilt.push(Stage::Depth);
        }
    }

    fn refresh_layers(
        &mut self,
        placement: Placement,
        params: &ShadowParams,
        report: &mut RefreshReport,
    ) {
        if !params.use_depth {
            return;
        }
        let (Some(mask), Some(depth)) = (fresh_mask(&self.mask, placement), fresh_depth(&self.depth, placement))
        else {
            return;
        };
        let key = LayersKey {
            mask: mask.revision(),
            depth: depth.revision(),
            layer_count: params.layer_count,
        };
        if up_to_date(&self.layers, &key) {
            return;
        }
        if let Some(value) = self.slicer.slice(mask, depth, params.layer_count) {
            self.layers = Some(Built { value, key });
            report.rebuilt.push(Stage::Layers);
        }
    }

    fn refresh_shadow(
        &mut self,
        placement: Placement,
        params: &ShadowParams,
        report: &mut RefreshReport,
    ) -> ShadowResult<()> {
        let Some(canvas) = self.canvas() else {
            return Ok(());
        };
        let Some(mask) = fresh_mask(&self.mask, placement) else {
            return Ok(());
        };
        let layers = if params.use_depth && self.depth.is_some() {
            self.layers.as_ref().map(|l| &l.value)
        } else {
            None
        };
        let key = ShadowKey {
            canvas,
            placement,
            mask: mask.revision(),
            layers: layers.map(DepthLayers::revision),
            cast: fingerprint_cast(params),
        };
        if up_to_date(&self.shadow, &key) {
            return Ok(());
        }
        if let Some(value) = self
            .renderer
            .render(canvas, &placement, mask, layers, params)?
        {
            self.shadow = Some(Built { value, key });
            report.rebuilt.push(Stage::Shadow);
        }
        Ok(())
    }

    fn refresh_composite(
        &mut self,
        placement: Placement,
        report: &mut RefreshReport,
    ) -> ShadowResult<()> {
        let (Some(subject), Some(background)) = (&self.subject, &self.background) else {
            return Ok(());
        };
        let shadow = self
            .shadow
            .as_ref()
            .map(|s| &s.value)
            .filter(|s| s.placement() == placement && s.size() == background.image.dimensions());
        let key = CompositeKey {
            background: background.revision,
            subject: subject.revision,
            placement,
            shadow: shadow.map(ShadowRaster::revision),
        };
        if up_to_date(&self.composite, &key) {
            return Ok(());
        }
        let value = composite(&background.image, shadow, &subject.image, &placement)?;
        self.composite = Some(Built { value, key });
        report.rebuilt.push(Stage::Composite);
        Ok(())
    }

    /// Background canvas size, once a background is set.
    pub fn canvas(&self) -> Option<Canvas> {
        self.background.as_ref().map(|b| Canvas {
            width: b.image.width(),
            height: b.image.height(),
        })
    }

    /// Current placement; `None` until both rasters are set and refreshed.
    pub fn placement(&self) -> Option<Placement> {
        self.placement.as_ref().map(|p| p.value)
    }

    /// Current subject raster.
    pub fn subject(&self) -> Option<&RasterImage> {
        self.subject.as_ref().map(|i| &i.image)
    }

    /// Current background raster.
    pub fn background(&self) -> Option<&RasterImage> {
        self.background.as_ref().map(|i| &i.image)
    }

    /// Current depth source raster.
    pub fn depth_source(&self) -> Option<&RasterImage> {
        self.depth_source.as_ref().map(|i| &i.image)
    }

    /// Latest mask (possibly from an earlier placement).
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref().map(|m| &m.value)
    }

    /// Latest depth buffer.
    pub fn depth(&self) -> Option<&DepthBuffer> {
        self.depth.as_ref().map(|d| &d.value)
    }

    /// Latest depth bands.
    pub fn layers(&self) -> Option<&DepthLayers> {
        self.layers.as_ref().map(|l| &l.value)
    }

    /// Latest shadow raster.
    pub fn shadow(&self) -> Option<&ShadowRaster> {
        self.shadow.as_ref().map(|s| &s.value)
    }

    /// Revision of the latest shadow.
    pub fn shadow_revision(&self) -> Option<Revision> {
        self.shadow().map(ShadowRaster::revision)
    }

    /// Latest composite (premultiplied).
    pub fn composite(&self) -> Option<&FrameRGBA> {
        self.composite.as_ref().map(|c| &c.value)
    }

    /// Processed depth as opaque grayscale.
    pub fn depth_visualization(&self) -> Option<RasterImage> {
        self.depth().map(DepthBuffer::to_grayscale)
    }

    /// Processed depth as grayscale clipped by the subject silhouette.
    pub fn masked_depth_visualization(&self) -> Option<RasterImage> {
        let depth = self.depth()?;
        depth.to_masked_grayscale(self.mask()?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/graph.rs"]
mod tests;
