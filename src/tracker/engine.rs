//! BindingEngine: per-frame orchestration of registry, binding and release.

use log::debug;
use thiserror::Error;

use crate::tracker::binding::BindingResolver;
use crate::tracker::bound::BoundTracker;
use crate::tracker::hand::Hand;
use crate::tracker::matching::Detection;
use crate::tracker::registry::TrackRegistry;
use crate::tracker::track::Track;

/// Tunable thresholds for the engine.
///
/// The values are qualitative knobs with sensible defaults, not calibrated
/// constants; the ordering that matters is binding distance < association
/// radius and grace period < disappearance horizon.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum centroid distance (px) for detection-to-track association.
    pub max_association_dist: f32,
    /// Consecutive undetected frames before an unbound track is evicted.
    pub max_disappeared: u32,
    /// Maximum track-to-landmark distance (px) for a binding proposal.
    pub binding_dist: f32,
    /// Consecutive qualifying frames required to confirm a binding.
    pub binding_frames: u32,
    /// Detection-from-hand separation growth (px/frame) that signals a throw.
    pub release_speed: f32,
    /// Invisible-hand frames tolerated before a bound track force-releases.
    pub hand_grace: u32,
    /// Trajectory history samples kept per track.
    pub history_capacity: usize,
    /// Minimum classifier confidence for a pattern event to be emitted.
    pub min_pattern_confidence: f32,
    /// Trajectory samples per classification input.
    pub trajectory_len: usize,
    /// Pixels added around the last detection box for classification crops.
    pub crop_margin: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_association_dist: 50.0,
            max_disappeared: 15,
            binding_dist: 25.0,
            binding_frames: 3,
            release_speed: 18.0,
            hand_grace: 8,
            history_capacity: 32,
            min_pattern_confidence: 0.5,
            trajectory_len: 8,
            crop_margin: 12.0,
        }
    }
}

/// A malformed frame from a collaborator. Aborts that frame only; the
/// engine state is untouched and the next frame proceeds normally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed detection box at index {0}: non-finite or negative-size")]
    MalformedDetection(usize),
    #[error("malformed {0} hand landmark: non-finite position")]
    MalformedLandmark(&'static str),
}

/// Stable per-frame view of every live track, unbound and bound, for
/// read-only consumers (rendering, classification).
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame_id: u64,
    pub tracks: Vec<Track>,
}

/// The tracking and binding-state engine.
///
/// Single-threaded and frame-sequential: one `update` call fully processes
/// one frame. Constructed at session start, dropped at session end; no
/// ambient state beyond the track id counter.
pub struct BindingEngine {
    registry: TrackRegistry,
    resolver: BindingResolver,
    bound: BoundTracker,
    frame_id: u64,
    config: EngineConfig,
}

impl BindingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: TrackRegistry::new(
                config.max_association_dist,
                config.max_disappeared,
                config.history_capacity,
            ),
            resolver: BindingResolver::new(config.binding_dist, config.binding_frames),
            bound: BoundTracker::new(
                config.binding_dist,
                config.max_association_dist,
                config.release_speed,
                config.hand_grace,
            ),
            frame_id: 0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one frame of detections and hand landmarks.
    ///
    /// Empty detections and invisible hands are valid steady states, never
    /// errors. Input is validated before any mutation, so a malformed frame
    /// leaves every track exactly as it was.
    pub fn update(
        &mut self,
        detections: &[Detection],
        hands: &[Hand],
        timestamp: f64,
    ) -> Result<FrameSnapshot, EngineError> {
        validate(detections, hands)?;
        self.frame_id += 1;

        // Bound tracks follow hands first; any released this frame re-enter
        // the registry anchored at their release position, same id and
        // history, so the releasing detection matches them instead of
        // spawning a duplicate identity.
        for track in self.bound.advance(hands, detections, timestamp) {
            self.registry.insert(track);
        }

        // Detections still hugging a held object corroborate the binding;
        // they must not spawn phantom unbound tracks.
        let unclaimed = self.unclaimed(detections);

        // Unbound tracks follow detections.
        self.registry.update(&unclaimed, timestamp);

        // Confirmed bindings move tracks from the registry to the hand.
        let occupied = self.bound.occupied();
        let confirmed = self
            .resolver
            .resolve(self.registry.tracks(), hands, &occupied);
        for (id, side) in confirmed {
            if let Some(track) = self.registry.remove(id) {
                self.bound.bind(track, side);
            }
        }

        debug!(
            "frame {}: {} unbound, {} bound",
            self.frame_id,
            self.registry.len(),
            self.bound.len()
        );

        let mut tracks: Vec<Track> = self
            .registry
            .tracks()
            .values()
            .chain(self.bound.tracks().values())
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.id);

        Ok(FrameSnapshot {
            frame_id: self.frame_id,
            tracks,
        })
    }

    fn unclaimed(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|d| {
                self.bound
                    .tracks()
                    .values()
                    .all(|t| nalgebra::distance(&d.centroid(), &t.centroid) > self.config.binding_dist)
            })
            .cloned()
            .collect()
    }

    /// Live track count, unbound plus bound.
    pub fn live_tracks(&self) -> usize {
        self.registry.len() + self.bound.len()
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }
}

fn validate(detections: &[Detection], hands: &[Hand]) -> Result<(), EngineError> {
    for (i, det) in detections.iter().enumerate() {
        if !det.bbox.is_well_formed() || !det.score.is_finite() {
            return Err(EngineError::MalformedDetection(i));
        }
    }
    for hand in hands {
        if hand.visible && (!hand.position.x.is_finite() || !hand.position.y.is_finite()) {
            return Err(EngineError::MalformedLandmark(hand.side.label()));
        }
    }
    Ok(())
}
