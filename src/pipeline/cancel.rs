use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that supersedes an in-flight decode.
///
/// Cloned into the decode task; the pipeline cancels it when the slot's input changes again.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every clone of this token as cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Return `true` once any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Raster inputs that arrive through an external decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSlot {
    /// Foreground cutout.
    Subject,
    /// Background the subject is placed on.
    Background,
    /// Depth map of the subject.
    DepthSource,
}

/// Permission to commit one decode result into one input slot.
#[derive(Clone, Debug)]
pub struct DecodeTicket {
    slot: InputSlot,
    generation: u64,
    token: CancelToken,
}

impl DecodeTicket {
    /// Slot the decode will fill.
    pub fn slot(&self) -> InputSlot {
        self.slot
    }

    /// Per-slot sequence number of this ticket.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token a decode task can poll to stop early.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Return `true` once a later input change superseded this ticket.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of handing a decoded raster back to the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The raster became the slot's current input.
    Applied,
    /// A newer input change superseded the decode; the raster was discarded.
    Superseded,
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    active: Option<CancelToken>,
}

impl SlotState {
    fn cancel_active(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
        }
    }
}

/// Latest ticket per input slot.
#[derive(Debug, Default)]
pub(crate) struct SlotTokens {
    subject: SlotState,
    background: SlotState,
    depth_source: SlotState,
}

impl SlotTokens {
    fn state_mut(&mut self, slot: InputSlot) -> &mut SlotState {
        match slot {
            InputSlot::Subject => &mut self.subject,
            InputSlot::Background => &mut self.background,
            InputSlot::DepthSource => &mut self.depth_source,
        }
    }

    fn state(&self, slot: InputSlot) -> &SlotState {
        match slot {
            InputSlot::Subject => &self.subject,
            InputSlot::Background => &self.background,
            InputSlot::DepthSource => &self.depth_source,
        }
    }

    /// Cancel the slot's in-flight ticket and issue a new one.
    pub(crate) fn issue(&mut self, slot: InputSlot) -> DecodeTicket {
        let state = self.state_mut(slot);
        state.cancel_active();
        state.generation += 1;
        let token = CancelToken::new();
        state.active = Some(token.clone());
        DecodeTicket {
            slot,
            generation: state.generation,
            token,
        }
    }

    /// Cancel the slot's in-flight ticket without issuing a new one.
    pub(crate) fn supersede(&mut self, slot: InputSlot) {
        let state = self.state_mut(slot);
        state.cancel_active();
        state.generation += 1;
    }

    pub(crate) fn is_current(&self, ticket: &DecodeTicket) -> bool {
        !ticket.is_cancelled() && self.state(ticket.slot).generation == ticket.generation
    }

    /// Drop the slot's active token if it belongs to `ticket`.
    pub(crate) fn retire(&mut self, ticket: &DecodeTicket) {
        let state = self.state_mut(ticket.slot);
        if state.generation == ticket.generation {
            state.active = None;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/cancel.rs"]
mod tests;
