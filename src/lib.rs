//! meterscan - utility meter digit recognition
//!
//! Turns the noisy per-frame output of a digit-detection model into a single
//! trustworthy numeric reading. Each frame's raw prediction tensor is decoded
//! into candidate boxes, cleaned (non-maximum suppression, geometric outlier
//! rejection, duplicate collapse), checked for a plausible digit arrangement,
//! and smoothed over a short history. A longer session buffer then votes
//! across frames and commits a reading once it is statistically stable.
//!
//! The detection model itself, the camera pipeline, rendering, and storage of
//! accepted readings are external collaborators; this crate starts at the raw
//! `[channels, elements]` tensor and ends at the committed reading.

pub mod config;
pub mod consensus;
pub mod detect;
pub mod frame;
pub mod session;

pub use config::{ConsensusSettings, DetectionSettings, RecognitionConfig};
pub use consensus::{Consensus, VoteWindow};
pub use detect::{DetectOutcome, DigitDetector, FrameGate, LabelTable};
pub use frame::{DigitBox, FrameReading};
pub use session::{ScanSession, SessionState, SessionUpdate};
