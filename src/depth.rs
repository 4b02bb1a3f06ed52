//! Depth sampling and depth-band slicing.
//!
//! Depth values live in `[0, 1]`. After calibration, larger values cast longer, softer and
//! fainter shadows.

/// Depth-band slicing.
pub mod layers;
/// Depth sampling and visualization.
pub mod sampler;

pub use layers::{DepthLayer, DepthLayers, DepthSlicer};
pub use sampler::{DepthBuffer, DepthSampler};
