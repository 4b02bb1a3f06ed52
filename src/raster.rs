//! Pixel-level building blocks shared by the pipeline stages.

pub(crate) mod blur;
pub(crate) mod composite;
pub(crate) mod paint;
pub(crate) mod resample;

pub use blur::blur_rgba8_premul;
