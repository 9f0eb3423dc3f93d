//! Bound-State Tracker: follows hand landmarks and detects release.

use std::collections::{HashMap, HashSet};

use log::{info, warn};
use nalgebra::{Point2, distance};

use crate::tracker::hand::{Hand, HandSide};
use crate::tracker::matching::Detection;
use crate::tracker::track::Track;
use crate::tracker::track_state::TrackState;

/// Per-binding bookkeeping that does not belong on the track itself.
#[derive(Debug, Default)]
struct BoundAux {
    /// Consecutive frames the occupying hand has been invisible.
    hand_lost: u32,
    /// Previous frame's separation between the nearest detection and the
    /// hand, for the rapid-separation release test.
    prev_sep: Option<f32>,
}

/// Holds the bound tracks, one per hand at most.
///
/// While bound, a track's position is driven by the hand landmark; the
/// detector only corroborates. Exclusivity falls out of the `HandSide`
/// keying. Bound tracks never age out by disappearance; they leave only
/// through release.
pub struct BoundTracker {
    bound: HashMap<HandSide, Track>,
    aux: HashMap<HandSide, BoundAux>,
    binding_dist: f32,
    assoc_dist: f32,
    release_speed: f32,
    hand_grace: u32,
}

impl BoundTracker {
    pub fn new(binding_dist: f32, assoc_dist: f32, release_speed: f32, hand_grace: u32) -> Self {
        Self {
            bound: HashMap::new(),
            aux: HashMap::new(),
            binding_dist,
            assoc_dist,
            release_speed,
            hand_grace,
        }
    }

    /// Take ownership of a confirmed track. The caller guarantees the hand
    /// is unoccupied.
    pub fn bind(&mut self, mut track: Track, side: HandSide) {
        debug_assert!(!self.bound.contains_key(&side));
        track.state = TrackState::Bound(side);
        track.disappeared = 0;
        info!("track {} bound to {} hand", track.id, side.label());
        self.bound.insert(side, track);
        self.aux.insert(side, BoundAux::default());
    }

    /// Advance every bound track by one frame.
    ///
    /// Returns the tracks released this frame, already flipped back to
    /// unbound and anchored at their release position; the caller re-admits
    /// them to the registry so identity survives the transition.
    pub fn advance(
        &mut self,
        hands: &[Hand],
        detections: &[Detection],
        timestamp: f64,
    ) -> Vec<Track> {
        let mut released = Vec::new();

        for side in [HandSide::Left, HandSide::Right] {
            if !self.bound.contains_key(&side) {
                continue;
            }
            let hand = hands.iter().find(|h| h.side == side && h.visible);
            let release = match hand {
                Some(hand) => self.advance_held(side, hand, detections, timestamp),
                None => self.advance_hand_lost(side, detections),
            };
            if let Some(anchor) = release {
                let mut track = self.bound.remove(&side).expect("side is bound");
                self.aux.remove(&side);
                track.state = TrackState::Unbound;
                track.disappeared = 0;
                match anchor {
                    ReleaseAnchor::Detection(det) => track.re_anchor(det.bbox),
                    ReleaseAnchor::LastKnown => {}
                }
                released.push(track);
            }
        }

        released
    }

    /// One frame with the occupying hand visible.
    fn advance_held(
        &mut self,
        side: HandSide,
        hand: &Hand,
        detections: &[Detection],
        timestamp: f64,
    ) -> Option<ReleaseAnchor> {
        let track = self.bound.get_mut(&side).expect("side is bound");
        track.observe(hand.position, timestamp);
        let aux = self.aux.get_mut(&side).expect("side is bound");
        aux.hand_lost = 0;

        let nearest = nearest_detection(detections, hand.position);
        let sep = nearest.as_ref().map(|(_, d)| *d);
        let prev_sep = std::mem::replace(&mut aux.prev_sep, sep);

        // Release (a): the object re-detects hugging the hand and then
        // pulls away faster than anything still being held could. The
        // candidate must have started within the binding distance; a
        // detection that was never near the hand is some other object and
        // can never strip the binding.
        if let (Some((idx, sep)), Some(prev)) = (nearest, prev_sep) {
            if prev <= self.binding_dist
                && sep > self.binding_dist
                && sep - prev > self.release_speed
            {
                let track_id = self.bound[&side].id;
                info!(
                    "track {track_id} released from {} hand ({:.1}px/frame separation)",
                    side.label(),
                    sep - prev
                );
                return Some(ReleaseAnchor::Detection(detections[idx].clone()));
            }
        }
        None
    }

    /// One frame with the occupying hand invisible.
    fn advance_hand_lost(&mut self, side: HandSide, detections: &[Detection]) -> Option<ReleaseAnchor> {
        let aux = self.aux.get_mut(&side).expect("side is bound");
        aux.hand_lost += 1;
        aux.prev_sep = None;
        let track = &self.bound[&side];

        if aux.hand_lost <= self.hand_grace {
            // Release (b): the object reappears as an independent detection
            // that has escaped the hand but is still close enough to the
            // last known position to plausibly be the held object. Anything
            // outside the association radius is another object; a one-frame
            // pose flicker must not strip the binding.
            if let Some((idx, sep)) = nearest_detection(detections, track.centroid) {
                if sep > self.binding_dist && sep <= self.assoc_dist {
                    info!(
                        "track {} released: hand lost, object re-detected {sep:.1}px away",
                        track.id
                    );
                    return Some(ReleaseAnchor::Detection(detections[idx].clone()));
                }
            }
            None
        } else {
            // Hand gone past the grace window with no corroborating
            // re-detection: force release at the last known position rather
            // than track a hand-less ghost.
            warn!(
                "track {} force-released: {} hand lost for {} frames",
                track.id,
                side.label(),
                aux.hand_lost
            );
            Some(ReleaseAnchor::LastKnown)
        }
    }

    pub fn tracks(&self) -> &HashMap<HandSide, Track> {
        &self.bound
    }

    pub fn occupied(&self) -> HashSet<HandSide> {
        self.bound.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

enum ReleaseAnchor {
    Detection(Detection),
    LastKnown,
}

fn nearest_detection(detections: &[Detection], point: Point2<f32>) -> Option<(usize, f32)> {
    detections
        .iter()
        .enumerate()
        .map(|(i, d)| (i, distance(&d.centroid(), &point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::rect::Rect;
    use crate::tracker::track::reset_track_id_counter;

    fn det(x: f32, y: f32) -> Detection {
        Detection::from_rect(Rect::centered_at(Point2::new(x, y), 10.0, 10.0), 0.9, 0)
    }

    fn bound_tracker_with_track() -> (BoundTracker, u64) {
        reset_track_id_counter();
        let track = Track::new(Rect::centered_at(Point2::new(100.0, 100.0), 10.0, 10.0), 0, 0.0, 8);
        let id = track.id;
        let mut tracker = BoundTracker::new(25.0, 50.0, 18.0, 8);
        tracker.bind(track, HandSide::Right);
        (tracker, id)
    }

    #[test]
    fn test_bound_track_follows_hand() {
        let (mut tracker, id) = bound_tracker_with_track();
        let hands = [Hand::new(HandSide::Right, 150.0, 90.0)];

        let released = tracker.advance(&hands, &[], 1.0);
        assert!(released.is_empty());
        let track = &tracker.tracks()[&HandSide::Right];
        assert_eq!(track.id, id);
        assert_eq!(track.centroid, Point2::new(150.0, 90.0));
        assert_eq!(track.state, TrackState::Bound(HandSide::Right));
    }

    #[test]
    fn test_rapid_separation_releases() {
        let (mut tracker, id) = bound_tracker_with_track();
        let hands = [Hand::new(HandSide::Right, 100.0, 100.0)];

        // Detection hugging the hand, then jumping far away next frame
        tracker.advance(&hands, &[det(103.0, 100.0)], 1.0);
        let released = tracker.advance(&hands, &[det(160.0, 100.0)], 2.0);

        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, id);
        assert_eq!(released[0].state, TrackState::Unbound);
        assert_eq!(released[0].centroid, Point2::new(160.0, 100.0));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_slow_drift_does_not_release() {
        let (mut tracker, _) = bound_tracker_with_track();
        let hands = [Hand::new(HandSide::Right, 100.0, 100.0)];

        // Detection drifts a few px/frame: corroboration noise, still held
        for i in 0..10 {
            let released = tracker.advance(&hands, &[det(103.0 + i as f32 * 3.0, 100.0)], i as f64);
            assert!(released.is_empty());
        }
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_force_release_after_grace() {
        let (mut tracker, id) = bound_tracker_with_track();

        // Hand invisible; grace is 8 frames, so frame 9 force-releases
        let hidden = [Hand::hidden(HandSide::Right)];
        for frame in 1..=8 {
            let released = tracker.advance(&hidden, &[], frame as f64);
            assert!(released.is_empty(), "released during grace at frame {frame}");
        }
        let released = tracker.advance(&hidden, &[], 9.0);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, id);
        // Force release anchors at the last known (bind-time) position
        assert_eq!(released[0].centroid, Point2::new(100.0, 100.0));
    }

    #[test]
    fn test_hand_lost_but_object_redetected_nearby() {
        let (mut tracker, id) = bound_tracker_with_track();

        // Escaped the hand (past binding distance) but still within the
        // association radius of the last known position: this is the ball
        let hidden = [Hand::hidden(HandSide::Right)];
        let released = tracker.advance(&hidden, &[det(140.0, 100.0)], 1.0);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, id);
        assert_eq!(released[0].centroid, Point2::new(140.0, 100.0));
    }

    #[test]
    fn test_unrelated_detection_never_releases_held_track() {
        let (mut tracker, _) = bound_tracker_with_track();
        let hands = [Hand::new(HandSide::Right, 100.0, 100.0)];

        // Held ball occluded; a second ball flies across the frame at
        // 30px/frame, far from the hand, and is the only detection
        for (i, x) in [300.0, 330.0, 360.0].into_iter().enumerate() {
            let released = tracker.advance(&hands, &[det(x, 100.0)], i as f64);
            assert!(released.is_empty(), "unrelated ball stripped the binding");
        }
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_hand_flicker_with_other_ball_stays_bound() {
        let (mut tracker, id) = bound_tracker_with_track();

        // One-frame pose flicker while another ball sits far away
        let hidden = [Hand::hidden(HandSide::Right)];
        let released = tracker.advance(&hidden, &[det(300.0, 100.0)], 1.0);
        assert!(released.is_empty());

        let visible = [Hand::new(HandSide::Right, 102.0, 100.0)];
        let released = tracker.advance(&visible, &[det(300.0, 100.0)], 2.0);
        assert!(released.is_empty());
        assert_eq!(tracker.tracks()[&HandSide::Right].id, id);
    }

    #[test]
    fn test_nearby_detection_during_hand_loss_does_not_release() {
        let (mut tracker, _) = bound_tracker_with_track();

        // Within binding distance of the last hand position: still held
        let hidden = [Hand::hidden(HandSide::Right)];
        let released = tracker.advance(&hidden, &[det(110.0, 100.0)], 1.0);
        assert!(released.is_empty());
        assert_eq!(tracker.len(), 1);
    }
}
