//! Pure calculation functions for aspect-ratio normalization.
//!
//! All functions here are pure and testable without any I/O or images.

/// Narrowest accepted width/height ratio (inclusive).
pub const MIN_ACCEPTED_RATIO: f64 = 0.8;
/// Widest accepted width/height ratio (inclusive).
pub const MAX_ACCEPTED_RATIO: f64 = 1.9;
/// Canvas ratio used when the source is too tall.
pub const PORTRAIT_TARGET_RATIO: f64 = 0.9;
/// Canvas ratio used when the source is too wide.
pub const LANDSCAPE_TARGET_RATIO: f64 = 1.8;

/// Whether an image can be published as-is or must be padded onto a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectDecision {
    Accepted,
    Resize { width: u32, height: u32 },
}

/// Width divided by height.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    width as f64 / height as f64
}

/// Classify `(width, height)` and compute the padded canvas when needed.
///
/// `height` must be non-zero.
///
/// # Examples
/// ```
/// # use feedpost::imaging::{AspectDecision, decide_aspect};
/// assert_eq!(decide_aspect(400, 300), AspectDecision::Accepted);
/// assert_eq!(
///     decide_aspect(300, 500),
///     AspectDecision::Resize { width: 450, height: 500 }
/// );
/// ```
pub fn decide_aspect(width: u32, height: u32) -> AspectDecision {
    let ratio = aspect_ratio(width, height);
    let target = if ratio < MIN_ACCEPTED_RATIO {
        PORTRAIT_TARGET_RATIO
    } else if ratio > MAX_ACCEPTED_RATIO {
        LANDSCAPE_TARGET_RATIO
    } else {
        return AspectDecision::Accepted;
    };
    let (width, height) = calculate_canvas((width, height), target);
    AspectDecision::Resize { width, height }
}

/// Grow the shorter side until the canvas has `target_ratio`.
///
/// The longer side is held fixed, so the canvas always contains the source
/// without cropping. Results are rounded to whole pixels.
pub fn calculate_canvas(original: (u32, u32), target_ratio: f64) -> (u32, u32) {
    let (w, h) = original;
    if w < h {
        ((h as f64 * target_ratio).round() as u32, h)
    } else {
        (w, (w as f64 / target_ratio).round() as u32)
    }
}

/// Top-left offset that centers `original` inside `canvas`.
///
/// Odd padding rounds half up: the image sits one pixel right of (or below)
/// the exact center.
pub fn centering_offset(canvas: (u32, u32), original: (u32, u32)) -> (u32, u32) {
    let half = |c: u32, o: u32| (c.saturating_sub(o) as f64 / 2.0).round() as u32;
    (half(canvas.0, original.0), half(canvas.1, original.1))
}
