//! Track Registry: the authoritative set of unbound tracks.

use std::collections::HashMap;

use log::{debug, info};
use nalgebra::Point2;

use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::track::Track;

/// Owns every live unbound track and runs centroid association per frame.
///
/// Bound tracks live in the [`BoundTracker`](crate::tracker::BoundTracker);
/// a track is always in exactly one of the two.
pub struct TrackRegistry {
    tracks: HashMap<u64, Track>,
    max_association_dist: f32,
    max_disappeared: u32,
    history_capacity: usize,
}

impl TrackRegistry {
    pub fn new(max_association_dist: f32, max_disappeared: u32, history_capacity: usize) -> Self {
        Self {
            tracks: HashMap::new(),
            max_association_dist,
            max_disappeared,
            history_capacity,
        }
    }

    /// Associate this frame's detections with the live tracks.
    ///
    /// Matched tracks follow their detection; unmatched tracks age and are
    /// evicted past the disappearance limit; unmatched detections spawn new
    /// tracks. Ids are never reused.
    pub fn update(&mut self, detections: &[Detection], timestamp: f64) -> &HashMap<u64, Track> {
        // Stable iteration order so greedy tie-breaks are deterministic.
        let mut ids: Vec<u64> = self.tracks.keys().copied().collect();
        ids.sort_unstable();

        let track_centroids: Vec<Point2<f32>> =
            ids.iter().map(|id| self.tracks[id].centroid).collect();
        let det_centroids: Vec<Point2<f32>> = detections.iter().map(|d| d.centroid()).collect();

        let dists = matching::distance_matrix(&track_centroids, &det_centroids);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::greedy_assignment(&dists, self.max_association_dist);

        for (itrack, idet) in matches {
            let track = self
                .tracks
                .get_mut(&ids[itrack])
                .expect("matched id is live");
            track.observe_detection(detections[idet].bbox, timestamp);
        }

        for itrack in unmatched_tracks {
            let id = ids[itrack];
            let track = self.tracks.get_mut(&id).expect("unmatched id is live");
            track.disappeared += 1;
            if track.disappeared > self.max_disappeared {
                self.tracks.remove(&id);
                info!("track {id} evicted after sustained disappearance");
            }
        }

        for idet in unmatched_detections {
            let det = &detections[idet];
            let track = Track::new(det.bbox, det.class_id, timestamp, self.history_capacity);
            debug!(
                "track {} spawned at ({:.1}, {:.1})",
                track.id,
                track.centroid.x,
                track.centroid.y
            );
            self.tracks.insert(track.id, track);
        }

        &self.tracks
    }

    /// Re-admit a released track, keeping its id and history.
    ///
    /// Its current centroid is the association anchor for the next frame.
    pub fn insert(&mut self, track: Track) {
        self.tracks.insert(track.id, track);
    }

    /// Remove a track from the registry, handing ownership to the caller
    /// (used when a binding is confirmed).
    pub fn remove(&mut self, id: u64) -> Option<Track> {
        self.tracks.remove(&id)
    }

    pub fn tracks(&self) -> &HashMap<u64, Track> {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::rect::Rect;
    use crate::tracker::track::reset_track_id_counter;

    fn det(x: f32, y: f32) -> Detection {
        Detection::from_rect(Rect::centered_at(Point2::new(x, y), 10.0, 10.0), 0.9, 0)
    }

    #[test]
    fn test_spawn_and_follow() {
        reset_track_id_counter();
        let mut registry = TrackRegistry::new(50.0, 3, 8);

        registry.update(&[det(100.0, 100.0)], 0.0);
        assert_eq!(registry.len(), 1);
        let id = *registry.tracks().keys().next().unwrap();

        registry.update(&[det(105.0, 102.0)], 1.0);
        assert_eq!(registry.len(), 1);
        let track = &registry.tracks()[&id];
        assert_eq!(track.id, id);
        assert_eq!(track.disappeared, 0);
        assert!((track.centroid.x - 105.0).abs() < 1e-4);
    }

    #[test]
    fn test_idempotent_update() {
        reset_track_id_counter();
        let mut registry = TrackRegistry::new(50.0, 3, 8);

        for frame in 0..5 {
            registry.update(&[det(100.0, 100.0)], frame as f64);
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.tracks().values().next().unwrap().disappeared, 0);
    }

    #[test]
    fn test_aging_and_eviction() {
        reset_track_id_counter();
        let mut registry = TrackRegistry::new(50.0, 2, 8);

        registry.update(&[det(100.0, 100.0)], 0.0);
        registry.update(&[], 1.0); // disappeared = 1
        registry.update(&[], 2.0); // disappeared = 2
        assert_eq!(registry.len(), 1);
        registry.update(&[], 3.0); // disappeared = 3 > 2, evicted
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_far_detection_spawns_instead_of_matching() {
        reset_track_id_counter();
        let mut registry = TrackRegistry::new(50.0, 3, 8);

        registry.update(&[det(100.0, 100.0)], 0.0);
        registry.update(&[det(400.0, 400.0)], 1.0);
        // Original track aged, new track spawned
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_no_id_reuse_across_churn() {
        reset_track_id_counter();
        let mut registry = TrackRegistry::new(50.0, 0, 8);
        let mut seen = std::collections::HashSet::new();

        for frame in 0..10 {
            // Alternate presence so tracks churn every other frame
            let dets = if frame % 2 == 0 {
                vec![det(100.0, 100.0)]
            } else {
                vec![]
            };
            registry.update(&dets, frame as f64);
            for id in registry.tracks().keys() {
                seen.insert(*id);
            }
        }
        // Five distinct spawns, five distinct ids
        assert_eq!(seen.len(), 5);
    }
}
