mod binding;
mod bound;
mod engine;
mod hand;
mod matching;
mod rect;
mod registry;
mod track;
mod track_state;

pub use binding::BindingResolver;
pub use bound::BoundTracker;
pub use engine::{BindingEngine, EngineConfig, EngineError, FrameSnapshot};
pub use hand::{Hand, HandSide};
pub use matching::Detection;
pub use rect::Rect;
pub use registry::TrackRegistry;
pub use track::{Track, TrackPoint, reset_track_id_counter};
pub use track_state::TrackState;
