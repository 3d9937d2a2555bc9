//! Face bounding box geometry on scaled integer coordinates

use std::fmt;

/// Axis-aligned face box, coordinates scaled by 1000
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Frame {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i64 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i64 {
        self.bottom.saturating_sub(self.top)
    }

    /// Midpoint using flooring integer halves
    ///
    /// Identity matching compares these exact integers, so the rounding must not
    /// change. Inverted boxes (negative width or height) are not rejected;
    /// sizes and centers saturate at the `i64` bounds.
    pub fn center(&self) -> (i64, i64) {
        (
            self.left.saturating_add(self.width().div_euclid(2)),
            self.top.saturating_add(self.height().div_euclid(2)),
        )
    }

    /// Euclidean distance from the center to `point`
    pub fn distance_to(&self, point: (i64, i64)) -> f64 {
        let (x, y) = self.center();
        (point.0 as f64 - x as f64).hypot(point.1 as f64 - y as f64)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}
