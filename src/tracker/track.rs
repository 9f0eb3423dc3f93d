//! Persistent track identity for one physical object instance.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Point2;

use crate::tracker::hand::HandSide;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Global track ID counter for unique ID generation.
static TRACK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Reset the global track ID counter (useful for testing).
pub fn reset_track_id_counter() {
    TRACK_ID_COUNTER.store(0, Ordering::SeqCst);
}

/// Get the next unique track ID.
fn next_track_id() -> u64 {
    TRACK_ID_COUNTER.fetch_add(1, Ordering::SeqCst) + 1
}

/// One timestamped position sample in a track's trajectory history.
#[derive(Debug, Clone, Copy)]
pub struct TrackPoint {
    pub position: Point2<f32>,
    pub timestamp: f64,
}

/// Persistent identity for one tracked object.
///
/// The id is assigned once at creation and never changes across
/// bind/release transitions; ids are never reused within a process.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub id: u64,
    /// Current binding state
    pub state: TrackState,
    /// Current centroid position
    pub centroid: Point2<f32>,
    /// Consecutive frames with no matching detection (unbound only)
    pub disappeared: u32,
    /// Most recent detection box, kept for classification crops
    pub last_rect: Rect,
    /// Detector class of the object
    pub class_id: u32,
    /// Recent trajectory, oldest first, bounded at the configured capacity
    history: VecDeque<TrackPoint>,
    history_capacity: usize,
}

impl Track {
    /// Create a new unbound track from an unmatched detection.
    pub fn new(rect: Rect, class_id: u32, timestamp: f64, history_capacity: usize) -> Self {
        let centroid = rect.center();
        let mut track = Self {
            id: next_track_id(),
            state: TrackState::Unbound,
            centroid,
            disappeared: 0,
            last_rect: rect,
            class_id,
            history: VecDeque::with_capacity(history_capacity),
            history_capacity,
        };
        track.push_sample(centroid, timestamp);
        track
    }

    /// The hand this track is bound to, if any.
    #[inline]
    pub fn bound_hand(&self) -> Option<HandSide> {
        match self.state {
            TrackState::Bound(side) => Some(side),
            TrackState::Unbound => None,
        }
    }

    /// Move the track to a new observed position and record the sample.
    pub fn observe(&mut self, position: Point2<f32>, timestamp: f64) {
        self.centroid = position;
        self.push_sample(position, timestamp);
    }

    /// Record a matched detection: position, box and aging all refresh.
    pub fn observe_detection(&mut self, rect: Rect, timestamp: f64) {
        self.last_rect = rect;
        self.disappeared = 0;
        self.observe(rect.center(), timestamp);
    }

    /// Re-anchor the track on a detection without recording a history
    /// sample; the next associator match records it instead.
    pub fn re_anchor(&mut self, rect: Rect) {
        self.centroid = rect.center();
        self.last_rect = rect;
        self.disappeared = 0;
    }

    pub fn history(&self) -> &VecDeque<TrackPoint> {
        &self.history
    }

    /// The last `n` history samples, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<TrackPoint> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).copied().collect()
    }

    fn push_sample(&mut self, position: Point2<f32>, timestamp: f64) {
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TrackPoint {
            position,
            timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_monotonic() {
        reset_track_id_counter();
        let a = Track::new(Rect::new(0.0, 0.0, 10.0, 10.0), 0, 0.0, 8);
        let b = Track::new(Rect::new(50.0, 50.0, 10.0, 10.0), 0, 0.0, 8);
        assert!(b.id > a.id);
    }

    #[test]
    fn test_history_bounded() {
        let mut track = Track::new(Rect::new(0.0, 0.0, 10.0, 10.0), 0, 0.0, 4);
        for i in 1..10 {
            track.observe(Point2::new(i as f32, 0.0), i as f64);
        }
        assert_eq!(track.history().len(), 4);
        // Oldest samples evicted, newest kept
        assert_eq!(track.history().back().unwrap().position.x, 9.0);
        assert_eq!(track.history().front().unwrap().position.x, 6.0);
    }

    #[test]
    fn test_recent_history_shorter_than_window() {
        let track = Track::new(Rect::new(0.0, 0.0, 10.0, 10.0), 0, 0.0, 8);
        assert_eq!(track.recent_history(5).len(), 1);
    }
}
