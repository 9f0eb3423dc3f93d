use crate::tracker::hand::HandSide;

/// Binding state of a track.
///
/// Eviction is not a state: an evicted track is simply removed from the
/// registry. A bound track carries the side of the hand holding it, so a
/// track can never be bound without a hand nor exist in two collections at
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Tracked purely from detector output, independent of any hand.
    #[default]
    Unbound,
    /// Position driven by the landmark of the occupying hand.
    Bound(HandSide),
}

impl TrackState {
    #[inline]
    pub fn is_bound(&self) -> bool {
        matches!(self, TrackState::Bound(_))
    }
}
