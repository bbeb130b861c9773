#![forbid(unsafe_code)]

//! Size-dependent metrics for the lab's text face.

const TRACKING_A: f64 = -0.0223;
const TRACKING_B: f64 = 0.185;
const TRACKING_C: f64 = -0.1745;

const LINE_HEIGHT_FACTOR: f64 = 1.4;

/// Tracking (letter spacing, in em) for a font size in px.
///
/// `a + b * e^(c * size)`: loose at caption sizes, slightly tight at display
/// sizes.
#[must_use]
pub fn dynamic_tracking(size: f64) -> f64 {
    TRACKING_A + TRACKING_B * (TRACKING_C * size).exp()
}

/// Line height in px for a font size in px.
#[must_use]
pub fn dynamic_line_height(size: f64) -> f64 {
    // Halves round toward positive infinity.
    (size * LINE_HEIGHT_FACTOR + 0.5).floor()
}
