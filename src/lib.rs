//! shadowcast composites a cutout subject onto a background and synthesizes its drop shadow.
//!
//! The shadow is projected from the subject silhouette along a single directional light. When a
//! depth map is supplied, the silhouette is sliced into depth bands and parts nearer the camera
//! cast longer, blurrier, fainter shadows.
//!
//! The stages can be driven one by one:
//!
//! - [`resolve_placement`] fits the subject over the background
//! - [`MaskExtractor`] keeps the subject's opacity at placement size
//! - [`DepthSampler`] turns a depth map into calibrated per-pixel depth
//! - [`DepthSlicer`] partitions the silhouette into depth bands
//! - [`ShadowRenderer`] casts the shadow
//! - [`composite`] layers background, shadow and subject
//!
//! or through [`ShadowPipeline`], which rebuilds only what its inputs invalidate and discards
//! superseded decodes.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod assets;
mod foundation;

pub mod compose;
pub mod depth;
/// Subject silhouette extraction.
pub mod mask;
pub mod params;
pub mod pipeline;
/// Subject placement.
pub mod placement;
pub(crate) mod raster;
pub mod shadow;

pub use crate::foundation::core::{
    Affine, Canvas, FrameRGBA, Placement, Point, RasterImage, Rect, Revision, RevisionCounter,
    Vec2,
};
pub use crate::foundation::error::{ShadowError, ShadowResult};

pub use crate::assets::{decode_image, decode_image_path};
pub use crate::compose::composite;
pub use crate::depth::{DepthBuffer, DepthLayer, DepthLayers, DepthSampler, DepthSlicer};
pub use crate::mask::{Mask, MaskExtractor};
pub use crate::params::{DepthCalibration, Light, ShadowParams};
pub use crate::pipeline::{
    CancelToken, CommitOutcome, DecodeTicket, InputSlot, RefreshReport, ShadowPipeline, Stage,
    StageFailure,
};
pub use crate::placement::resolve_placement;
pub use crate::raster::blur_rgba8_premul;
pub use crate::shadow::{ShadowGeometry, ShadowPath, ShadowRaster, ShadowRenderer};
