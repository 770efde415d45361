//! Per-Frame Detection Layer
//!
//! Turns one raw inference tensor into a stabilized digit reading:
//! decode -> cleanup -> arrangement check -> short-window vote. A single-slot
//! gate drops frames that arrive while one is still in flight, so recognition
//! always works on the most recent view of the meter.

pub mod cleanup;
pub mod decode;
pub mod gate;
pub mod geometry;
pub mod labels;
pub mod validate;

use std::sync::Arc;
use std::time::{Duration, Instant};

use ndarray::ArrayView2;
use tracing::{debug, info};

pub use gate::{FrameGate, FramePermit};
pub use labels::LabelTable;

use crate::config::DetectionSettings;
use crate::consensus::VoteWindow;
use crate::frame::FrameReading;

/// Result of processing one frame.
///
/// This is the synchronous surface of the detector: a frame either gets
/// dropped by backpressure, yields no digits, or yields a stabilized reading
/// with the time spent producing it.
#[derive(Debug)]
pub enum DetectOutcome {
    /// A frame was already in flight; this one was discarded unprocessed
    Dropped,
    /// The frame produced no trustworthy digits
    NoDigits {
        /// Processing time for this frame
        elapsed: Duration,
    },
    /// The frame produced a stabilized reading
    Digits {
        /// Short-window stabilized reading
        reading: FrameReading,
        /// Processing time for this frame
        elapsed: Duration,
    },
}

/// Per-frame digit detector with a short jitter-damping history.
pub struct DigitDetector {
    labels: LabelTable,
    settings: DetectionSettings,
    /// Short rolling window that smooths single-frame noise
    history: VoteWindow,
    gate: Arc<FrameGate>,
}

impl DigitDetector {
    /// Create a detector. An empty label table is accepted and leaves the
    /// detector in a degraded mode that always reports no digits.
    pub fn new(labels: LabelTable, settings: DetectionSettings) -> Self {
        if labels.is_empty() {
            info!("Detector starting with zero classes; every frame will report no digits");
        }
        let history = VoteWindow::new(settings.history_frames.max(1));
        Self {
            labels,
            settings,
            history,
            gate: Arc::new(FrameGate::new()),
        }
    }

    /// Backpressure gate, for capture loops that want to skip inference
    /// entirely while a frame is in flight.
    pub fn gate(&self) -> Arc<FrameGate> {
        Arc::clone(&self.gate)
    }

    /// Run the full per-frame pipeline on one raw prediction tensor.
    pub fn process_frame(&mut self, preds: ArrayView2<'_, f32>) -> DetectOutcome {
        let gate = Arc::clone(&self.gate);
        let Some(_permit) = gate.try_acquire() else {
            debug!("Frame dropped: previous frame still in flight");
            return DetectOutcome::Dropped;
        };
        let start = Instant::now();

        let candidates =
            decode::decode_detections(preds, &self.labels, self.settings.confidence_threshold);
        let mut reading = cleanup::clean_frame(candidates, &self.settings);

        if !validate::is_plausible_row(&reading.boxes) {
            reading = FrameReading::empty();
        }

        self.history.push(reading);

        let stabilized = self
            .history
            .consensus()
            .filter(|c| !c.value.is_empty())
            .map(|c| FrameReading::from_boxes(c.boxes));

        let elapsed = start.elapsed();
        match stabilized {
            Some(reading) => {
                debug!("Frame stabilized to \"{}\" in {:?}", reading.value, elapsed);
                DetectOutcome::Digits { reading, elapsed }
            }
            None => DetectOutcome::NoDigits { elapsed },
        }
    }

    /// Forget the short history, e.g. when a new scanning session starts.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
