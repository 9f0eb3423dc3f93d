//! Per-frame hand landmark observations from the external pose estimator.

use nalgebra::Point2;

/// Which hand a landmark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub fn label(&self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

/// One hand as seen in the current frame.
///
/// Recomputed every frame from pose-estimator output; never owned by a
/// track. An invisible hand is a valid steady state, not an error.
#[derive(Debug, Clone, Copy)]
pub struct Hand {
    pub side: HandSide,
    /// Palm landmark position in frame coordinates.
    pub position: Point2<f32>,
    /// False when the pose estimator lost this hand for the frame.
    pub visible: bool,
}

impl Hand {
    pub fn new(side: HandSide, x: f32, y: f32) -> Self {
        Self {
            side,
            position: Point2::new(x, y),
            visible: true,
        }
    }

    /// A hand the pose estimator could not see this frame.
    pub fn hidden(side: HandSide) -> Self {
        Self {
            side,
            position: Point2::origin(),
            visible: false,
        }
    }
}
