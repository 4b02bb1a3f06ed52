//! Dependency graph over the stages, with revisions and decode cancellation.

/// Cancellation tokens and decode tickets.
pub mod cancel;
pub(crate) mod fingerprint;
/// The stage graph.
pub mod graph;

pub use cancel::{CancelToken, CommitOutcome, DecodeTicket, InputSlot};
pub use fingerprint::ParamsFingerprint;
pub use graph::{RefreshReport, ShadowPipeline, Stage, StageFailure};
