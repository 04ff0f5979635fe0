//! Proxy handle driving a hinge
//!
//! A free-floating proxy (for example a dial the user twists) steers a
//! revolute joint: the joint's target is the proxy's signed rotation since
//! [`ProxyHinge::init`] about the hinge axis.

use kinesketch_core::{Quat, Vec3};
use kinesketch_physics::{ArticulationBackend, BodyHandle, DriveAxis, Result};

/// Maps a proxy's rotation onto a revolute joint's X-drive target
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProxyHinge {
    target: BodyHandle,
    /// Hinge axis in the target body's local space
    axis: Vec3,
    initial_rotation: Option<Quat>,
}

impl ProxyHinge {
    /// Drive `target` about its local +Y axis
    pub fn new(target: BodyHandle) -> Self {
        Self {
            target,
            axis: Vec3::UP,
            initial_rotation: None,
        }
    }

    /// Use a different local hinge axis
    pub fn with_axis(mut self, axis: Vec3) -> Self {
        self.axis = axis.normalize();
        self
    }

    /// Driven body
    pub fn target(&self) -> BodyHandle {
        self.target
    }

    /// Remember the proxy's rest rotation
    pub fn init(&mut self, proxy_rotation: Quat) {
        self.initial_rotation = Some(proxy_rotation);
    }

    /// Whether [`ProxyHinge::init`] has been called
    pub fn is_initialized(&self) -> bool {
        self.initial_rotation.is_some()
    }

    /// Write the proxy's current angle as the joint's target
    ///
    /// Returns the clamped target in radians, `None` before `init` or when
    /// the target body is unavailable.
    pub fn update(&self, backend: &mut dyn ArticulationBackend, proxy_rotation: Quat) -> Option<f32> {
        let initial = self.initial_rotation?;
        match self.apply(backend, initial, proxy_rotation) {
            Ok(target) => Some(target),
            Err(err) => {
                tracing::warn!("ProxyHinge {:?}: update failed: {}", self.target, err);
                None
            }
        }
    }

    fn apply(&self, backend: &mut dyn ArticulationBackend, initial: Quat, proxy_rotation: Quat) -> Result<f32> {
        let axis = backend.pose(self.target)?.rotation * self.axis;
        let base_forward = initial * Vec3::FORWARD;
        let current_forward = proxy_rotation * Vec3::FORWARD;
        let angle = base_forward.signed_angle(current_forward, axis);

        let drive = backend
            .drive(self.target, DriveAxis::X)?
            .with_clamped_target(angle);
        backend.set_drive(self.target, DriveAxis::X, drive)?;
        Ok(drive.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesketch_physics::{ArticulationBody, ArticulationDrive, MemoryBackend, Pose};
    use std::f32::consts::FRAC_PI_2;

    fn door(limits: (f32, f32)) -> (MemoryBackend, BodyHandle) {
        let mut backend = MemoryBackend::new();
        let frame = backend
            .add_body(ArticulationBody::root(Pose::IDENTITY).immovable())
            .unwrap();
        let door = backend
            .add_body(
                ArticulationBody::revolute(frame, Pose::IDENTITY)
                    .with_x_drive(ArticulationDrive::target(0.0).with_limits(limits.0, limits.1)),
            )
            .unwrap();
        (backend, door)
    }

    #[test]
    fn test_requires_init() {
        let (mut backend, door) = door((0.0, 0.0));
        let proxy = ProxyHinge::new(door);
        assert_eq!(proxy.update(&mut backend, Quat::IDENTITY), None);
    }

    #[test]
    fn test_quarter_turn() {
        let (mut backend, door) = door((0.0, 0.0));
        let mut proxy = ProxyHinge::new(door);
        proxy.init(Quat::IDENTITY);

        // +90° about +Y carries +Z to +X; +Z × +X = +Y so the angle is positive
        let turned = Quat::from_axis_angle(Vec3::UP, FRAC_PI_2);
        let target = proxy.update(&mut backend, turned).unwrap();
        assert!((target - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(backend.drive(door, DriveAxis::X).unwrap().target, target);
    }

    #[test]
    fn test_clamped() {
        let (mut backend, door) = door((-0.5, 0.5));
        let mut proxy = ProxyHinge::new(door);
        proxy.init(Quat::IDENTITY);

        let target = proxy
            .update(&mut backend, Quat::from_axis_angle(Vec3::UP, -FRAC_PI_2))
            .unwrap();
        assert_eq!(target, -0.5);
    }

    #[test]
    fn test_missing_target() {
        let (mut backend, door) = door((0.0, 0.0));
        let mut proxy = ProxyHinge::new(door);
        proxy.init(Quat::IDENTITY);
        backend.remove_body(door);
        assert_eq!(proxy.update(&mut backend, Quat::IDENTITY), None);
    }
}
