//! Digit arrangement validation
//!
//! Before a frame's reading may count toward session consensus, its boxes
//! must look like one row of a meter: vertically aligned and roughly evenly
//! spaced. Invalid frames are demoted to an empty reading, never an error.

use tracing::debug;

use crate::frame::DigitBox;

/// Vertical deviation allowed from the mean row center, in mean heights
const Y_ALIGNMENT: f32 = 0.3;
/// Plausible consecutive-gap range, in mean digit widths
const MIN_GAP_WIDTHS: f32 = 0.5;
const MAX_GAP_WIDTHS: f32 = 3.0;

/// Whether the boxes form a plausible single-row digit arrangement.
///
/// Fewer than two boxes are trivially valid.
pub fn is_plausible_row(boxes: &[DigitBox]) -> bool {
    if boxes.len() < 2 {
        return true;
    }

    let n = boxes.len() as f32;
    let mean_cy: f32 = boxes.iter().map(|b| b.cy).sum::<f32>() / n;
    let mean_h: f32 = boxes.iter().map(|b| b.h).sum::<f32>() / n;
    let mean_w: f32 = boxes.iter().map(|b| b.w).sum::<f32>() / n;

    let aligned = boxes
        .iter()
        .all(|b| (b.cy - mean_cy).abs() <= Y_ALIGNMENT * mean_h);
    if !aligned {
        debug!("Arrangement rejected: digits not vertically aligned");
        return false;
    }

    let mut sorted: Vec<&DigitBox> = boxes.iter().collect();
    sorted.sort_by(|a, b| a.cx.partial_cmp(&b.cx).unwrap_or(std::cmp::Ordering::Equal));

    let spaced = sorted.windows(2).all(|pair| {
        let gap = pair[1].cx - pair[0].cx;
        gap >= MIN_GAP_WIDTHS * mean_w && gap <= MAX_GAP_WIDTHS * mean_w
    });
    if !spaced {
        debug!("Arrangement rejected: implausible digit spacing");
    }
    spaced
}
