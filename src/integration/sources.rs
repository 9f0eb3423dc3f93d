//! Traits for the external inference collaborators.

use crate::tracker::{Detection, Hand};

use super::classifier::TrajectorySample;

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the engine.
///
/// # Example
///
/// ```ignore
/// use balltrack_rs::{DetectionSource, Detection};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, input: &[u8], width: u32, height: u32) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data and return detections.
    ///
    /// An empty vector means "no objects visible this frame", which the
    /// engine treats as a valid steady state, not a failure.
    fn detect(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, Self::Error>;
}

/// Trait for pose estimation backends producing hand landmarks.
///
/// A frame with no visible hands (empty vector, or hands flagged
/// invisible) is a valid steady state.
pub trait PoseSource {
    /// Error type for pose estimation failures.
    type Error;

    /// Estimate hand landmark positions for the frame.
    fn estimate(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Hand>, Self::Error>;
}

/// Raw classifier output before confidence gating.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Trait for the external motion-pattern classifier.
///
/// Callable per-track, per-frame; the core carries no classifier state
/// across calls. An `Err` means the classifier was unavailable for this
/// sample; the adapter skips that track for the frame and never retries.
pub trait PatternModel {
    /// Error type for classifier failures.
    type Error;

    /// Classify one trajectory sample.
    fn infer(&mut self, sample: &TrajectorySample) -> Result<Prediction, Self::Error>;
}
