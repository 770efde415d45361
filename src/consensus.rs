//! Frequency consensus over a bounded window of readings
//!
//! The same mechanism damps jitter at two scales: a short window inside the
//! detector and the long session buffer. Each window holds the last N frame
//! readings and votes by whole reading string; stability is the winning
//! string's share of the window.

use std::collections::VecDeque;

use crate::frame::{DigitBox, FrameReading};

/// Outcome of a window vote.
#[derive(Debug, Clone)]
pub struct Consensus {
    /// The most frequent reading string in the window
    pub value: String,
    /// Boxes from the most recent frame that produced `value`
    pub boxes: Vec<DigitBox>,
    /// Winning string's share of the window (0.0 - 1.0)
    pub stability: f32,
}

/// Bounded FIFO of frame readings with whole-string frequency voting.
#[derive(Debug)]
pub struct VoteWindow {
    entries: VecDeque<FrameReading>,
    capacity: usize,
}

impl VoteWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest once past capacity.
    pub fn push(&mut self, reading: FrameReading) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(reading);
    }

    /// Number of readings currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard all readings.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Vote across the window.
    ///
    /// Returns `None` for an empty window. Ties go to the string whose latest
    /// occurrence is most recent, which keeps the result deterministic and
    /// biased toward fresh evidence. The representative boxes come from the
    /// last frame that produced the winning string.
    pub fn consensus(&self) -> Option<Consensus> {
        if self.entries.is_empty() {
            return None;
        }

        let mut best: Option<(&FrameReading, usize)> = None;
        for (i, candidate) in self.entries.iter().enumerate() {
            // Only score each string at its last occurrence
            if self.entries.iter().skip(i + 1).any(|r| r.value == candidate.value) {
                continue;
            }
            let count = self.entries.iter().filter(|r| r.value == candidate.value).count();
            let better = match best {
                Some((_, best_count)) => count >= best_count,
                None => true,
            };
            if better {
                best = Some((candidate, count));
            }
        }

        best.map(|(winner, count)| Consensus {
            value: winner.value.clone(),
            boxes: winner.boxes.clone(),
            stability: count as f32 / self.entries.len() as f32,
        })
    }
}
