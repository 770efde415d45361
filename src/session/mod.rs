//! Scanning Session Layer
//!
//! Accumulates stabilized per-frame readings in a long rolling buffer and
//! commits to a final reading once it is statistically stable. One
//! `ScanSession` exists per scanning attempt; all mutation goes through
//! `&mut self`, so admission of frame results is single-writer by
//! construction.

use tracing::{debug, info};

use crate::config::ConsensusSettings;
use crate::consensus::{Consensus, VoteWindow};
use crate::frame::FrameReading;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Still gathering evidence
    Accumulating,
    /// A consensus reading was just committed; the buffer has been cleared
    /// and the session is ready to accumulate again
    Stable,
}

/// What the session reports after admitting one frame result.
#[derive(Debug)]
pub struct SessionUpdate {
    pub state: SessionState,
    /// Buffer fill fraction, `min(1.0, buffered / window_frames)`
    pub progress: f32,
    /// Winning reading's share of the buffer; 0.0 until enough evidence
    pub stability: f32,
    /// The committed reading, present exactly once per buffer generation
    pub consensus: Option<Consensus>,
}

/// Long-window consensus over successive frame readings.
pub struct ScanSession {
    buffer: VoteWindow,
    settings: ConsensusSettings,
    no_detection_streak: usize,
    stability: f32,
    paused: bool,
}

impl ScanSession {
    pub fn new(settings: ConsensusSettings) -> Self {
        let buffer = VoteWindow::new(settings.window_frames.max(1));
        Self {
            buffer,
            settings,
            no_detection_streak: 0,
            stability: 0.0,
            paused: false,
        }
    }

    /// Admit one frame's stabilized reading.
    ///
    /// Empty readings feed the no-detection streak; hitting the configured
    /// streak length clears the buffer. Non-empty readings join the buffer,
    /// and once the minimum fill is reached the buffer votes. Crossing the
    /// stability threshold commits the reading, clears the buffer, and
    /// reports full progress.
    pub fn observe(&mut self, reading: &FrameReading) -> SessionUpdate {
        if self.paused {
            return self.update(SessionState::Accumulating, None);
        }

        if reading.is_empty() {
            self.no_detection_streak += 1;
            if self.no_detection_streak >= self.settings.no_detection_reset {
                debug!(
                    "No detections for {} frames, clearing session buffer",
                    self.no_detection_streak
                );
                self.buffer.clear();
                self.stability = 0.0;
                self.no_detection_streak = 0;
            }
            return self.update(SessionState::Accumulating, None);
        }

        self.no_detection_streak = 0;
        self.buffer.push(reading.clone());

        if self.buffer.len() < self.settings.min_frames {
            return self.update(SessionState::Accumulating, None);
        }

        let Some(consensus) = self.buffer.consensus() else {
            return self.update(SessionState::Accumulating, None);
        };
        self.stability = consensus.stability;

        if consensus.stability >= self.settings.stability_threshold && !consensus.value.is_empty() {
            info!(
                "Reading \"{}\" committed at stability {:.2} over {} frames",
                consensus.value,
                consensus.stability,
                self.buffer.len()
            );
            self.buffer.clear();
            self.no_detection_streak = 0;
            // The next buffer generation starts from zero evidence
            self.stability = 0.0;
            return SessionUpdate {
                state: SessionState::Stable,
                progress: 1.0,
                stability: consensus.stability,
                consensus: Some(consensus),
            };
        }

        self.update(SessionState::Accumulating, None)
    }

    /// Suspend admission without losing buffered evidence.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume admission.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Discard all buffered evidence and start over.
    pub fn retry(&mut self) {
        self.buffer.clear();
        self.no_detection_streak = 0;
        self.stability = 0.0;
    }

    /// Buffer fill fraction, always reported, independent of stability.
    pub fn progress(&self) -> f32 {
        (self.buffer.len() as f32 / self.buffer.capacity() as f32).min(1.0)
    }

    /// Number of readings currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn update(&self, state: SessionState, consensus: Option<Consensus>) -> SessionUpdate {
        SessionUpdate {
            state,
            progress: self.progress(),
            stability: self.stability,
            consensus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{DigitBox, FrameReading};

    fn reading(value: &str) -> FrameReading {
        let boxes = value
            .chars()
            .enumerate()
            .map(|(i, d)| DigitBox::from_center(0.2 + 0.1 * i as f32, 0.5, 0.08, 0.2, 0.9, d).unwrap())
            .collect();
        FrameReading::from_boxes(boxes)
    }

    fn session() -> ScanSession {
        ScanSession::new(ConsensusSettings::default())
    }

    #[test]
    fn test_unanimous_buffer_commits_at_min_fill() {
        let mut s = session();
        let r = reading("4521");
        for i in 0..19 {
            let update = s.observe(&r);
            assert!(update.consensus.is_none(), "no consensus at frame {}", i + 1);
        }
        let update = s.observe(&r);
        assert_eq!(update.state, SessionState::Stable);
        assert!((update.stability - 1.0).abs() < 1e-6);
        assert!((update.progress - 1.0).abs() < 1e-6);
        let consensus = update.consensus.unwrap();
        assert_eq!(consensus.value, "4521");
        // Buffer generation ended; the session is accumulating again
        assert_eq!(s.buffered(), 0);
    }

    #[test]
    fn test_no_consensus_below_min_frames() {
        let mut s = session();
        let r = reading("4521");
        for _ in 0..19 {
            let update = s.observe(&r);
            assert!(update.consensus.is_none());
            assert_eq!(update.state, SessionState::Accumulating);
        }
        assert_eq!(s.buffered(), 19);
    }

    #[test]
    fn test_split_buffer_reports_stability_without_committing() {
        let mut s = session();
        // Below the 0.7 threshold: 18 vs 12 in a full buffer of 30
        let mut last_stability = 0.0;
        for i in 0..30 {
            let r = if i % 5 < 3 { reading("1234") } else { reading("1235") };
            let update = s.observe(&r);
            assert!(update.consensus.is_none());
            last_stability = update.stability;
        }
        assert!((last_stability - 0.6).abs() < 1e-6);
        assert_eq!(s.buffered(), 30);
    }

    #[test]
    fn test_silence_streak_clears_buffer() {
        let mut s = session();
        let r = reading("4521");
        for _ in 0..10 {
            s.observe(&r);
        }
        let empty = FrameReading::empty();
        for i in 0..19 {
            let update = s.observe(&empty);
            assert!(update.progress > 0.0, "buffer kept through empty frame {}", i + 1);
        }
        let update = s.observe(&empty);
        assert_eq!(s.buffered(), 0);
        assert!((update.progress - 0.0).abs() < 1e-6);
        assert!((update.stability - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_streak_interrupted_by_detection() {
        let mut s = session();
        let empty = FrameReading::empty();
        for _ in 0..19 {
            s.observe(&empty);
        }
        // One detection resets the streak; 19 more empties must not clear
        s.observe(&reading("4521"));
        for _ in 0..19 {
            s.observe(&empty);
        }
        assert_eq!(s.buffered(), 1);
    }

    #[test]
    fn test_pause_keeps_buffer_and_blocks_admission() {
        let mut s = session();
        let r = reading("4521");
        for _ in 0..5 {
            s.observe(&r);
        }
        s.pause();
        for _ in 0..10 {
            s.observe(&r);
        }
        assert_eq!(s.buffered(), 5);
        s.resume();
        s.observe(&r);
        assert_eq!(s.buffered(), 6);
    }

    #[test]
    fn test_pause_blocks_streak_reset() {
        let mut s = session();
        let r = reading("4521");
        for _ in 0..5 {
            s.observe(&r);
        }
        s.pause();
        let empty = FrameReading::empty();
        for _ in 0..40 {
            s.observe(&empty);
        }
        // Paused frames neither admit nor count toward the streak
        assert_eq!(s.buffered(), 5);
    }

    #[test]
    fn test_commit_resets_stability_for_next_generation() {
        let mut s = session();
        let r = reading("4521");
        for _ in 0..19 {
            s.observe(&r);
        }
        let committed = s.observe(&r);
        assert_eq!(committed.state, SessionState::Stable);
        assert!((committed.stability - 1.0).abs() < 1e-6);

        // The first frame of the next generation must not inherit the
        // committed generation's stability
        let next = s.observe(&r);
        assert_eq!(s.buffered(), 1);
        assert!((next.stability - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_retry_discards_everything() {
        let mut s = session();
        let r = reading("4521");
        for _ in 0..15 {
            s.observe(&r);
        }
        s.retry();
        assert_eq!(s.buffered(), 0);
        assert!((s.progress() - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_progress_reported_while_accumulating() {
        let mut s = session();
        let r = reading("4521");
        let update = s.observe(&r);
        assert!((update.progress - 1.0 / 30.0).abs() < 1e-6);
        for _ in 0..14 {
            s.observe(&r);
        }
        assert!((s.progress() - 0.5).abs() < 1e-6);
    }
}
