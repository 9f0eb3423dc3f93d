//! Pattern Classifier Adapter and the session pattern log.

use log::debug;
use nalgebra::Point2;

use crate::tracker::{Rect, Track};

use super::sources::PatternModel;

/// Fixed-size classifier input assembled from one track.
#[derive(Debug, Clone)]
pub struct TrajectorySample {
    pub track_id: u64,
    /// Exactly `trajectory_len` recent positions, oldest first.
    pub trajectory: Vec<Point2<f32>>,
    /// Image region to crop for the visual patch.
    pub crop: Rect,
}

/// A classified, timestamped motion label for one track.
///
/// Immutable once created; accumulated in the session [`PatternLog`].
#[derive(Debug, Clone)]
pub struct PatternEvent {
    pub track_id: u64,
    pub label: String,
    pub confidence: f32,
    pub timestamp: f64,
}

/// Append-only, ordered log of pattern events: the session's persisted
/// artifact.
#[derive(Debug, Default)]
pub struct PatternLog {
    events: Vec<PatternEvent>,
}

impl PatternLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: PatternEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PatternEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Builds classifier samples from track history and gates the output.
///
/// Stateless between calls apart from its thresholds: tracks are
/// classified independently, and a skipped frame is never retried.
pub struct PatternClassifier {
    min_confidence: f32,
    trajectory_len: usize,
    crop_margin: f32,
}

impl PatternClassifier {
    pub fn new(min_confidence: f32, trajectory_len: usize, crop_margin: f32) -> Self {
        Self {
            min_confidence,
            trajectory_len,
            crop_margin,
        }
    }

    /// Classify one track for this frame.
    ///
    /// Returns `None` when the sample is withheld: history still too short,
    /// classifier unavailable, or confidence under the threshold. A low
    /// score is withheld, never replaced by a default label.
    pub fn classify<M: PatternModel>(
        &self,
        model: &mut M,
        track: &Track,
        timestamp: f64,
    ) -> Option<PatternEvent> {
        let sample = self.sample(track)?;

        let prediction = match model.infer(&sample) {
            Ok(p) => p,
            Err(_) => {
                debug!("classifier unavailable for track {}, skipped", track.id);
                return None;
            }
        };

        if prediction.confidence < self.min_confidence {
            debug!(
                "pattern '{}' withheld for track {} ({:.2} < {:.2})",
                prediction.label, track.id, prediction.confidence, self.min_confidence
            );
            return None;
        }

        Some(PatternEvent {
            track_id: track.id,
            label: prediction.label,
            confidence: prediction.confidence,
            timestamp,
        })
    }

    /// Assemble the fixed-size sample, or `None` if the track's history
    /// cannot fill it yet.
    pub fn sample(&self, track: &Track) -> Option<TrajectorySample> {
        if track.history().len() < self.trajectory_len {
            return None;
        }
        let trajectory = track
            .recent_history(self.trajectory_len)
            .iter()
            .map(|p| p.position)
            .collect();
        Some(TrajectorySample {
            track_id: track.id,
            trajectory,
            crop: track.last_rect.expanded(self.crop_margin),
        })
    }
}
