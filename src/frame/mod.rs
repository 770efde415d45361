//! Frame data structures for per-frame digit detections

use serde::{Deserialize, Serialize};

/// One detected digit candidate within a single frame.
///
/// All coordinates are normalized to `[0, 1]` in the model's input space.
/// Boxes are created by the frame decoder and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitBox {
    /// Left edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
    /// Right edge
    pub x2: f32,
    /// Bottom edge
    pub y2: f32,
    /// Horizontal center
    pub cx: f32,
    /// Vertical center
    pub cy: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Digit glyph ('0' - '9')
    pub digit: char,
}

impl DigitBox {
    /// Build a box from center/size form, as emitted by the detection model.
    ///
    /// Returns `None` when the derived corners fall outside normalized bounds
    /// or the size is non-positive. Malformed geometry is expected noise from
    /// the model and is dropped rather than surfaced as an error.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32, confidence: f32, digit: char) -> Option<Self> {
        if w <= 0.0 || h <= 0.0 {
            return None;
        }

        let x1 = cx - w / 2.0;
        let y1 = cy - h / 2.0;
        let x2 = cx + w / 2.0;
        let y2 = cy + h / 2.0;

        if !(0.0..=1.0).contains(&x1)
            || !(0.0..=1.0).contains(&y1)
            || !(0.0..=1.0).contains(&x2)
            || !(0.0..=1.0).contains(&y2)
        {
            return None;
        }

        Some(Self {
            x1,
            y1,
            x2,
            y2,
            cx,
            cy,
            w,
            h,
            confidence,
            digit,
        })
    }

    /// Box area in normalized units
    pub fn area(&self) -> f32 {
        self.w * self.h
    }
}

/// One frame's cleaned, ordered sequence of digit boxes.
///
/// Boxes are sorted ascending by `cx`; `value` is the concatenation of their
/// digit glyphs. An empty reading is the "no detection" outcome, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameReading {
    /// Surviving boxes, left to right
    pub boxes: Vec<DigitBox>,
    /// Concatenated digit string
    pub value: String,
}

impl FrameReading {
    /// Build a reading from boxes, sorting them left to right.
    pub fn from_boxes(mut boxes: Vec<DigitBox>) -> Self {
        boxes.sort_by(|a, b| a.cx.partial_cmp(&b.cx).unwrap_or(std::cmp::Ordering::Equal));
        let value = boxes.iter().map(|b| b.digit).collect();
        Self { boxes, value }
    }

    /// An empty reading (no digits detected)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of digits in the reading
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the frame yielded no digits
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
