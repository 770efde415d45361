//! Raw inference output decoding
//!
//! The detection model emits a flat `[num_channels, num_elements]` tensor:
//! channels 0-3 hold center x/y and width/height (normalized), the remaining
//! channels hold per-class scores. Decoding scans each anchor for its best
//! class and keeps it when the score clears the confidence threshold.

use ndarray::ArrayView2;

use super::labels::LabelTable;
use crate::frame::DigitBox;

/// Channels preceding the per-class score block
const BOX_CHANNELS: usize = 4;

/// Decode one frame's raw predictions into unordered digit candidates.
///
/// Empty tensors, tensors without score channels, and empty label tables all
/// yield an empty list, never an error. Anchors whose derived corners fall
/// outside `[0, 1]` are dropped as malformed geometry.
pub fn decode_detections(
    preds: ArrayView2<'_, f32>,
    labels: &LabelTable,
    confidence_threshold: f32,
) -> Vec<DigitBox> {
    let (channels, elements) = preds.dim();
    if channels <= BOX_CHANNELS || elements == 0 || labels.is_empty() {
        return Vec::new();
    }

    let classes = (channels - BOX_CHANNELS).min(labels.len());
    let mut boxes = Vec::new();

    for e in 0..elements {
        let mut best_class = 0;
        let mut best_score = f32::MIN;
        for c in 0..classes {
            let score = preds[[BOX_CHANNELS + c, e]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_score <= confidence_threshold {
            continue;
        }
        let Some(digit) = labels.glyph(best_class) else {
            continue;
        };

        let cx = preds[[0, e]];
        let cy = preds[[1, e]];
        let w = preds[[2, e]];
        let h = preds[[3, e]];

        if let Some(b) = DigitBox::from_center(cx, cy, w, h, best_score, digit) {
            boxes.push(b);
        }
    }

    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Build a predictions tensor from (cx, cy, w, h, class, score) anchors,
    /// with ten score channels.
    fn preds_from(anchors: &[(f32, f32, f32, f32, usize, f32)]) -> Array2<f32> {
        let mut preds = Array2::<f32>::zeros((BOX_CHANNELS + 10, anchors.len()));
        for (e, &(cx, cy, w, h, class, score)) in anchors.iter().enumerate() {
            preds[[0, e]] = cx;
            preds[[1, e]] = cy;
            preds[[2, e]] = w;
            preds[[3, e]] = h;
            preds[[BOX_CHANNELS + class, e]] = score;
        }
        preds
    }

    #[test]
    fn test_decode_keeps_confident_anchor() {
        let preds = preds_from(&[(0.5, 0.5, 0.1, 0.2, 7, 0.9)]);
        let boxes = decode_detections(preds.view(), &LabelTable::digits(), 0.5);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].digit, '7');
        assert!((boxes[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_drops_low_confidence() {
        let preds = preds_from(&[(0.5, 0.5, 0.1, 0.2, 3, 0.4)]);
        let boxes = decode_detections(preds.view(), &LabelTable::digits(), 0.5);
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_decode_picks_best_class() {
        let mut preds = preds_from(&[(0.5, 0.5, 0.1, 0.2, 2, 0.6)]);
        preds[[BOX_CHANNELS + 8, 0]] = 0.85;
        let boxes = decode_detections(preds.view(), &LabelTable::digits(), 0.5);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].digit, '8');
    }

    #[test]
    fn test_decode_drops_out_of_bounds_geometry() {
        // Center near the right edge, box spills past 1.0
        let preds = preds_from(&[(0.98, 0.5, 0.1, 0.2, 1, 0.9)]);
        let boxes = decode_detections(preds.view(), &LabelTable::digits(), 0.5);
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_decode_empty_inputs() {
        let empty = Array2::<f32>::zeros((14, 0));
        assert!(decode_detections(empty.view(), &LabelTable::digits(), 0.5).is_empty());

        let preds = preds_from(&[(0.5, 0.5, 0.1, 0.2, 7, 0.9)]);
        assert!(decode_detections(preds.view(), &LabelTable::empty(), 0.5).is_empty());

        let no_scores = Array2::<f32>::zeros((4, 8));
        assert!(decode_detections(no_scores.view(), &LabelTable::digits(), 0.5).is_empty());
    }

    #[test]
    fn test_decode_caps_classes_at_label_table() {
        // Score lives in a class channel the label table does not cover
        let preds = preds_from(&[(0.5, 0.5, 0.1, 0.2, 9, 0.9)]);
        let table = LabelTable::parse("0\n1\n2\n").unwrap();
        assert!(decode_detections(preds.view(), &table, 0.5).is_empty());
    }
}
