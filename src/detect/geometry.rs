//! Box overlap measures
//!
//! Pure functions over axis-aligned boxes, used by non-maximum suppression
//! and duplicate collapse.

use crate::frame::DigitBox;

/// Intersection area of two boxes, 0.0 when they do not overlap.
fn intersection(a: &DigitBox, b: &DigitBox) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    ix * iy
}

/// Intersection-over-union of two boxes.
///
/// Symmetric, bounded to `[0, 1]`, and 1.0 for a box against itself.
pub fn iou(a: &DigitBox, b: &DigitBox) -> f32 {
    let inter = intersection(a, b);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

/// Overlap ratio relative to the smaller of the two boxes.
///
/// A high value means the smaller box is mostly contained in the larger one,
/// even when IoU is modest (the containment case NMS can miss).
pub fn overlap_smaller(a: &DigitBox, b: &DigitBox) -> f32 {
    let smaller = a.area().min(b.area());
    if smaller <= 0.0 {
        return 0.0;
    }
    intersection(a, b) / smaller
}
