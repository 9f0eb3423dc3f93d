//! Integration module: the seams between the core engine and its external
//! collaborators (object detector, pose estimator, pattern classifier).
//!
//! Any inference backend (native library, remote service, in-process model)
//! can satisfy these traits without touching core logic.

mod builder;
mod classifier;
mod pipeline;
mod sources;

pub use builder::DetectionBuilder;
pub use classifier::{PatternClassifier, PatternEvent, PatternLog, TrajectorySample};
pub use pipeline::{PipelineError, TrackerPipeline};
pub use sources::{DetectionSource, PatternModel, PoseSource, Prediction};
