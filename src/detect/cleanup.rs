//! Per-frame cleanup pipeline
//!
//! Three ordered passes turn the decoder's raw candidates into one clean,
//! left-to-right digit sequence: non-maximum suppression, geometric outlier
//! rejection, and sequential duplicate collapse. Given identical input the
//! output is reproducible; ties fall back to input order via stable sorts.

use tracing::debug;

use super::geometry::{iou, overlap_smaller};
use crate::config::DetectionSettings;
use crate::frame::{DigitBox, FrameReading};

/// Overlap ratio (relative to the smaller box) above which two adjacent boxes
/// are treated as the same physical digit.
const DUPLICATE_OVERLAP: f32 = 0.5;

/// Run all three passes and produce an ordered reading.
pub fn clean_frame(boxes: Vec<DigitBox>, settings: &DetectionSettings) -> FrameReading {
    let after_nms = nms(boxes, settings.iou_threshold);
    let after_outliers = reject_outliers(after_nms, settings);
    let collapsed = collapse_duplicates(after_outliers);
    FrameReading::from_boxes(collapsed)
}

/// Non-maximum suppression: keep the highest-confidence box of each
/// overlapping cluster, dropping boxes whose IoU with a kept box reaches the
/// threshold.
pub fn nms(mut boxes: Vec<DigitBox>, iou_threshold: f32) -> Vec<DigitBox> {
    // Stable sort keeps input order for equal confidences
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<DigitBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        if kept.iter().all(|k| iou(k, &candidate) < iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Drop boxes that stray from the digit row vertically, then boxes separated
/// from their left neighbor by an implausible horizontal gap.
///
/// A box whose confidence exceeds the high-confidence threshold survives the
/// gap check regardless of spacing; leading/trailing digits of a wide meter
/// often sit past the median gap.
pub fn reject_outliers(boxes: Vec<DigitBox>, settings: &DetectionSettings) -> Vec<DigitBox> {
    if boxes.len() < 2 {
        return boxes;
    }

    let n = boxes.len() as f32;
    let mean_cy: f32 = boxes.iter().map(|b| b.cy).sum::<f32>() / n;
    let mean_h: f32 = boxes.iter().map(|b| b.h).sum::<f32>() / n;

    let mut row: Vec<DigitBox> = boxes
        .into_iter()
        .filter(|b| (b.cy - mean_cy).abs() <= mean_h * settings.y_tolerance)
        .collect();

    if row.len() < 2 {
        return row;
    }

    row.sort_by(|a, b| a.cx.partial_cmp(&b.cx).unwrap_or(std::cmp::Ordering::Equal));

    let gaps: Vec<f32> = row.windows(2).map(|pair| pair[1].cx - pair[0].cx).collect();
    let median_gap = median(&gaps);
    if median_gap <= 0.0 {
        return row;
    }
    let max_gap = median_gap * settings.x_tolerance;

    let mut kept: Vec<DigitBox> = Vec::with_capacity(row.len());
    for b in row {
        if let Some(prev) = kept.last() {
            let gap = b.cx - prev.cx;
            if gap > max_gap && b.confidence <= settings.high_confidence_threshold {
                debug!(
                    "Dropping spaced-out digit '{}' (gap {:.3} > {:.3}, confidence {:.2})",
                    b.digit, gap, max_gap, b.confidence
                );
                continue;
            }
        }
        kept.push(b);
    }
    kept
}

/// Collapse adjacent boxes that cover the same physical digit.
///
/// Walking left to right, a box overlapping the previously kept box by more
/// than half the smaller area replaces it when it is more confident, and is
/// discarded otherwise.
pub fn collapse_duplicates(mut boxes: Vec<DigitBox>) -> Vec<DigitBox> {
    boxes.sort_by(|a, b| a.cx.partial_cmp(&b.cx).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<DigitBox> = Vec::with_capacity(boxes.len());
    for b in boxes {
        match kept.last_mut() {
            Some(prev) if overlap_smaller(prev, &b) > DUPLICATE_OVERLAP => {
                if b.confidence > prev.confidence {
                    *prev = b;
                }
            }
            _ => kept.push(b),
        }
    }
    kept
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
