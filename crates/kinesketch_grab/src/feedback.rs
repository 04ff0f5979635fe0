//! Visual feedback for grab candidates

use kinesketch_core::Vec3;

/// How far along the grab a feedback line is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeedbackState {
    /// A candidate is in range, grip not yet past the grab threshold
    Candidate,
    /// Grip is past the grab threshold
    Ready,
    /// The body is held
    Grabbed,
}

impl FeedbackState {
    /// End color for the line (linear RGBA)
    pub fn rgba(self) -> [f32; 4] {
        match self {
            FeedbackState::Candidate => [1.0, 0.92, 0.016, 1.0],
            FeedbackState::Ready | FeedbackState::Grabbed => [0.0, 1.0, 0.0, 1.0],
        }
    }
}

/// Line from the grab point to a candidate or held body, for the renderer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackLine {
    /// Grab point
    pub start: Vec3,
    /// Body position
    pub end: Vec3,
    /// Stage
    pub state: FeedbackState,
}

impl FeedbackLine {
    /// Start color, shared by every stage
    pub const START_RGBA: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    /// Line length
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}
