//! Single-slot backpressure gate
//!
//! Recognition must always run on the most recent view of the meter, so a
//! frame arriving while another is still being processed is dropped, not
//! queued. The slot is released through an RAII permit so that it is freed
//! exactly once even when processing unwinds.

use std::sync::atomic::{AtomicBool, Ordering};

/// One-frame-in-flight gate.
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. Returns `None` while a frame is already in flight.
    pub fn try_acquire(&self) -> Option<FramePermit<'_>> {
        if self.busy.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(FramePermit { gate: self })
        }
    }

    /// Whether a frame is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of an acquired slot; releases it on drop.
#[derive(Debug)]
pub struct FramePermit<'a> {
    gate: &'a FrameGate,
}

impl Drop for FramePermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
