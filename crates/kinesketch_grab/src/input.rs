//! Controller input
//!
//! [`InputSource`] is the boundary to the XR runtime. Analog values are
//! normalized: grip and trigger in `[0, 1]`, thumbstick axes in `[-1, 1]`.

use crate::error::InputError;
use kinesketch_core::{Pose, Vec2};

/// Input channel identifiers, used in errors and validation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputChannel {
    /// Grip squeeze
    Grip,
    /// Index trigger
    Trigger,
    /// Primary thumbstick
    Thumbstick,
    /// Controller pose
    Pose,
}

/// Per-frame controller input
pub trait InputSource {
    /// Grip value in `[0, 1]`
    fn grip(&self) -> Result<f32, InputError>;

    /// Trigger value in `[0, 1]`
    fn trigger(&self) -> Result<f32, InputError>;

    /// Thumbstick axes in `[-1, 1]`
    fn thumbstick(&self) -> Result<Vec2, InputError>;

    /// World pose of the grab point
    fn pose(&self) -> Result<Pose, InputError>;
}

/// One frame of input captured up front
///
/// Missing channels read as [`InputError::Unavailable`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    /// Grip value
    pub grip: Option<f32>,
    /// Trigger value
    pub trigger: Option<f32>,
    /// Thumbstick axes
    pub thumbstick: Option<Vec2>,
    /// Grab point pose
    pub pose: Option<Pose>,
}

impl InputSnapshot {
    /// Snapshot with pose and grip only
    pub fn new(pose: Pose, grip: f32) -> Self {
        Self {
            grip: Some(grip),
            pose: Some(pose),
            ..Self::default()
        }
    }

    /// Set the trigger value
    pub fn with_trigger(mut self, trigger: f32) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Set the thumbstick axes
    pub fn with_thumbstick(mut self, x: f32, y: f32) -> Self {
        self.thumbstick = Some(Vec2::new(x, y));
        self
    }
}

impl InputSource for InputSnapshot {
    fn grip(&self) -> Result<f32, InputError> {
        self.grip
            .map(|v| v.clamp(0.0, 1.0))
            .ok_or(InputError::Unavailable(InputChannel::Grip))
    }

    fn trigger(&self) -> Result<f32, InputError> {
        self.trigger
            .map(|v| v.clamp(0.0, 1.0))
            .ok_or(InputError::Unavailable(InputChannel::Trigger))
    }

    fn thumbstick(&self) -> Result<Vec2, InputError> {
        self.thumbstick
            .map(|v| Vec2::new(v.x.clamp(-1.0, 1.0), v.y.clamp(-1.0, 1.0)))
            .ok_or(InputError::Unavailable(InputChannel::Thumbstick))
    }

    fn pose(&self) -> Result<Pose, InputError> {
        self.pose.ok_or(InputError::Unavailable(InputChannel::Pose))
    }
}

/// Unwrap an analog read, logging failures and substituting zero
pub fn read_or_zero<T: Default>(result: Result<T, InputError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("Input read failed, using zero: {}", err);
            T::default()
        }
    }
}

/// Zero inside `deadzone`, unchanged outside
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Edge reported by [`GripLatch::update`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GripEdge {
    /// Grip rose above the grab threshold
    Pressed,
    /// Grip fell below the release threshold
    Released,
}

/// Two-threshold grip latch
///
/// Sets when grip exceeds the grab threshold and clears only when it drops
/// below the release threshold. Values in between keep the current state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GripLatch {
    held: bool,
}

impl GripLatch {
    /// Whether the latch is set
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Feed one grip sample
    pub fn update(&mut self, grip: f32, grab_threshold: f32, release_threshold: f32) -> Option<GripEdge> {
        if !self.held && grip > grab_threshold {
            self.held = true;
            Some(GripEdge::Pressed)
        } else if self.held && grip < release_threshold {
            self.held = false;
            Some(GripEdge::Released)
        } else {
            None
        }
    }

    /// Clear without reporting an edge
    pub fn reset(&mut self) {
        self.held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_hysteresis() {
        let mut latch = GripLatch::default();
        let edges: Vec<_> = [0.0, 0.6, 0.4, 0.2]
            .into_iter()
            .map(|grip| latch.update(grip, 0.5, 0.3))
            .collect();
        assert_eq!(edges, vec![None, Some(GripEdge::Pressed), None, Some(GripEdge::Released)]);
    }

    #[test]
    fn test_latch_ignores_values_between_thresholds() {
        let mut latch = GripLatch::default();
        assert_eq!(latch.update(0.4, 0.5, 0.3), None);
        assert!(!latch.is_held());
        assert_eq!(latch.update(0.5, 0.5, 0.3), None);
        assert_eq!(latch.update(0.51, 0.5, 0.3), Some(GripEdge::Pressed));
        assert_eq!(latch.update(0.3, 0.5, 0.3), None);
        assert!(latch.is_held());
    }

    #[test]
    fn test_deadzone() {
        assert_eq!(apply_deadzone(0.05, 0.1), 0.0);
        assert_eq!(apply_deadzone(-0.05, 0.1), 0.0);
        assert_eq!(apply_deadzone(0.5, 0.1), 0.5);
        assert_eq!(apply_deadzone(-0.1, 0.1), -0.1);
    }

    #[test]
    fn test_snapshot_missing_channel() {
        let snapshot = InputSnapshot::new(Pose::IDENTITY, 0.7);
        assert_eq!(snapshot.grip(), Ok(0.7));
        assert_eq!(
            snapshot.trigger(),
            Err(InputError::Unavailable(InputChannel::Trigger))
        );
        assert_eq!(read_or_zero(snapshot.trigger()), 0.0);
        assert_eq!(read_or_zero(snapshot.thumbstick()), Vec2::ZERO);
    }
}
