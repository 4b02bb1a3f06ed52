//! Shadow casting.
//!
//! The silhouette (or each depth band of it) is projected onto the ground plane through a
//! shear/scale transform anchored at the bottom-center of the placement, drawn once blurred and
//! once sharp, then faded.

pub(crate) mod fade;
/// Projection frame and per-band styling.
pub mod geometry;
/// Fallback and depth-aware casting.
pub mod renderer;

pub use geometry::{LayerStyle, ShadowGeometry};
pub use renderer::{ShadowPath, ShadowRaster, ShadowRenderer};
