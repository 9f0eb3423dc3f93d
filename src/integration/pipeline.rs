//! TrackerPipeline: wires the collaborators to the engine per frame.

use thiserror::Error;

use crate::tracker::{BindingEngine, EngineConfig, EngineError, FrameSnapshot, Hand};

use super::classifier::{PatternClassifier, PatternLog};
use super::sources::{DetectionSource, PatternModel, PoseSource};

/// A frame that could not be processed. Collaborator failures and rejected
/// input abort the current frame only; the engine state is unchanged and
/// the next frame proceeds.
#[derive(Debug, Error)]
pub enum PipelineError<DE, PE> {
    #[error("object detector failed")]
    Detector(DE),
    #[error("pose estimator failed")]
    Pose(PE),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// End-to-end per-frame pipeline: detect, estimate pose, track, classify.
///
/// Single-threaded and frame-sequential; each call to
/// [`process_frame`](Self::process_frame) fully processes one frame before
/// the next is admitted. Abort a session between frames by dropping the
/// pipeline. Classifier failures never fail a frame: that track is simply
/// skipped.
pub struct TrackerPipeline<D, P, M>
where
    D: DetectionSource,
    P: PoseSource,
    M: PatternModel,
{
    detector: D,
    pose: P,
    model: M,
    engine: BindingEngine,
    classifier: PatternClassifier,
    log: PatternLog,
    last_hands: Vec<Hand>,
}

impl<D, P, M> TrackerPipeline<D, P, M>
where
    D: DetectionSource,
    P: PoseSource,
    M: PatternModel,
{
    /// Create a new pipeline with the given collaborators and config.
    pub fn new(detector: D, pose: P, model: M, config: EngineConfig) -> Self {
        let classifier = PatternClassifier::new(
            config.min_pattern_confidence,
            config.trajectory_len,
            config.crop_margin,
        );
        Self {
            detector,
            pose,
            model,
            engine: BindingEngine::new(config),
            classifier,
            log: PatternLog::new(),
            last_hands: Vec::new(),
        }
    }

    /// Create a new pipeline with the default engine configuration.
    pub fn with_default_config(detector: D, pose: P, model: M) -> Self {
        Self::new(detector, pose, model, EngineConfig::default())
    }

    /// Process a single frame: detection and pose inference, engine update,
    /// then per-track classification into the session pattern log.
    ///
    /// Returns the frame's track snapshot for rendering overlays.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        timestamp: f64,
    ) -> Result<FrameSnapshot, PipelineError<D::Error, P::Error>> {
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detector)?;
        let hands = self
            .pose
            .estimate(input, width, height)
            .map_err(PipelineError::Pose)?;

        let snapshot = self.engine.update(&detections, &hands, timestamp)?;

        for track in &snapshot.tracks {
            if let Some(event) = self.classifier.classify(&mut self.model, track, timestamp) {
                self.log.push(event);
            }
        }

        self.last_hands = hands;
        Ok(snapshot)
    }

    /// The accumulated session pattern log.
    pub fn pattern_log(&self) -> &PatternLog {
        &self.log
    }

    /// Hand landmarks from the most recent frame, for overlay drawing.
    pub fn last_hands(&self) -> &[Hand] {
        &self.last_hands
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &BindingEngine {
        &self.engine
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }
}
