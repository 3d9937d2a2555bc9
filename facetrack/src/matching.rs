//! Identity resolution strategies
//!
//! A matcher decides which existing track, if any, a new face box belongs to.
//! The tracker only sees the [`IdentityMatcher`] interface, so the heuristic can
//! be replaced without touching ingestion.

use crate::frame::Frame;
use crate::track::Track;
use std::fmt;

/// Common interface for identity matching
pub trait IdentityMatcher: Send + Sync + fmt::Debug {
    /// Index into `tracks` of the track `frame` belongs to
    ///
    /// # Arguments
    /// * `tracks` - Existing tracks in creation order
    /// * `frame` - Face box of the incoming observation
    fn find_match(&self, tracks: &[Track], frame: &Frame) -> Option<usize>;
}

/// Fixed-threshold center proximity, first match in creation order wins
///
/// An earlier track inside the thresholds is chosen even when a later one is
/// closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityMatcher {
    /// Exclusive bound on horizontal center offset, scaled units
    pub max_dx: i64,
    /// Exclusive bound on vertical center offset, scaled units
    pub max_dy: i64,
}

impl Default for ProximityMatcher {
    fn default() -> Self {
        Self {
            max_dx: 80,
            max_dy: 30,
        }
    }
}

impl ProximityMatcher {
    pub fn new(max_dx: i64, max_dy: i64) -> Self {
        Self { max_dx, max_dy }
    }

    pub fn is_close(&self, a: &Frame, b: &Frame) -> bool {
        let (ax, ay) = a.center();
        let (bx, by) = b.center();
        within(ax.abs_diff(bx), self.max_dx) && within(ay.abs_diff(by), self.max_dy)
    }
}

/// `offset < bound`, for offsets that may not fit in `i64`
fn within(offset: u64, bound: i64) -> bool {
    i64::try_from(offset).map_or(false, |offset| offset < bound)
}

impl IdentityMatcher for ProximityMatcher {
    fn find_match(&self, tracks: &[Track], frame: &Frame) -> Option<usize> {
        tracks
            .iter()
            .position(|track| self.is_close(track.last_frame(), frame))
    }
}

/// Same thresholds as [`ProximityMatcher`], but picks the closest candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestMatcher {
    pub proximity: ProximityMatcher,
}

impl IdentityMatcher for NearestMatcher {
    fn find_match(&self, tracks: &[Track], frame: &Frame) -> Option<usize> {
        let center = frame.center();
        let mut best: Option<(usize, f64)> = None;

        for (idx, track) in tracks.iter().enumerate() {
            if !self.proximity.is_close(track.last_frame(), frame) {
                continue;
            }
            let distance = track.last_frame().distance_to(center);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((idx, distance));
            }
        }

        best.map(|(idx, _)| idx)
    }
}
