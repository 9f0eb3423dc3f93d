//! balltrack-rs: a frame-sequential tracking and binding-state engine.
//!
//! Turns per-frame object detections and hand-landmark positions into
//! temporally stable track identities, decides when a tracked object is
//! grabbed by ("bound to") or released from a hand, and feeds stabilized
//! trajectories to an external pattern classifier.
//!
//! Model inference, video capture and rendering stay outside the crate,
//! reachable only through the traits in [`integration`].

pub mod integration;
pub mod tracker;

pub use integration::{
    DetectionBuilder, DetectionSource, PatternClassifier, PatternEvent, PatternLog, PatternModel,
    PipelineError, PoseSource, Prediction, TrackerPipeline, TrajectorySample,
};
pub use tracker::{
    BindingEngine, Detection, EngineConfig, EngineError, FrameSnapshot, Hand, HandSide, Rect,
    Track, TrackState,
};
