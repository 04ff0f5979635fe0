//! Rigid poses (position + orientation)

use crate::{Quat, Vec3};

/// World or local rigid transform without scale
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// Translation
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
}

impl Pose {
    /// Pose at the origin with no rotation
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a new pose
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with no rotation
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Map a point from this pose's local space to the parent/world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Map a direction from local space to world space (ignores translation)
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }

    /// Map a world point into this pose's local space
    pub fn inverse_transform_point(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position)
    }

    /// Rigid motion that takes `self` onto `to`, expressed as a world-space
    /// rotation about `self.position` followed by a translation.
    pub fn delta_to(&self, to: &Pose) -> (Vec3, Quat) {
        (
            to.position - self.position,
            to.rotation * self.rotation.inverse(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_point_round_trip() {
        let pose = Pose::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(Vec3::UP, FRAC_PI_2),
        );
        let local = Vec3::new(0.5, 0.0, -1.0);
        let world = pose.transform_point(local);
        let back = pose.inverse_transform_point(world);

        assert!((back - local).length() < 1e-5);
    }

    #[test]
    fn test_delta_to() {
        let a = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));
        let b = Pose::new(
            Vec3::new(1.0, 1.0, 0.0),
            Quat::from_axis_angle(Vec3::FORWARD, 0.3),
        );
        let (translation, rotation) = a.delta_to(&b);

        assert!((translation - Vec3::UP).length() < 1e-6);
        assert!((rotation.z - b.rotation.z).abs() < 1e-6);
        assert!((rotation.w - b.rotation.w).abs() < 1e-6);
    }
}
