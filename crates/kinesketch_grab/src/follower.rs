//! Joint-aware pose following
//!
//! A grabbed body chases a target pose in one of two ways:
//!
//! - **Revolute, constraints respected**: the target position is projected
//!   onto the hinge plane and the signed angle between the body's current
//!   direction and the target direction is added to the joint's X-drive
//!   target. The solver does the rest.
//! - **Everything else**: the body (or its chain root) is teleported toward
//!   the target, instantly or with exponential-style smoothing.

use kinesketch_core::{Pose, Vec3};
use kinesketch_physics::{ArticulationBackend, BodyHandle, DriveAxis, JointType, Result};
use serde::{Deserialize, Serialize};

/// Projections shorter than this are too close to the hinge axis to define
/// a direction.
pub const DEGENERATE_EPSILON: f32 = 1e-3;

/// Smoothing speed used by [`FollowMode::smooth`]
pub const DEFAULT_FOLLOW_SPEED: f32 = 10.0;

/// How a teleported body approaches its target
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FollowMode {
    /// Jump straight to the target
    Instant,
    /// Move a fraction `speed * dt` of the way each tick
    Smooth {
        /// Blend rate per second
        speed: f32,
    },
}

impl Default for FollowMode {
    fn default() -> Self {
        Self::Instant
    }
}

impl FollowMode {
    /// Smooth following at the default speed
    pub fn smooth() -> Self {
        Self::Smooth {
            speed: DEFAULT_FOLLOW_SPEED,
        }
    }

    /// Next pose on the way from `current` to `target`
    pub fn step(&self, current: &Pose, target: &Pose, dt: f32) -> Pose {
        match *self {
            FollowMode::Instant => *target,
            FollowMode::Smooth { speed } => {
                let t = (speed * dt).clamp(0.0, 1.0);
                Pose::new(
                    current.position.lerp(target.position, t),
                    current.rotation.slerp(target.rotation, t).normalize(),
                )
            }
        }
    }
}

/// Why a follow step did nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Current or target point lies on the hinge axis
    DegenerateGeometry,
}

/// What a follow step did
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FollowOutcome {
    /// `body` was teleported to `pose`
    Teleported {
        /// Body actually moved (the chain root when moving the whole chain)
        body: BodyHandle,
        /// Its new pose
        pose: Pose,
    },
    /// The X-drive target was set to `angle` (radians, after clamping)
    DriveTarget {
        /// New target
        angle: f32,
    },
    /// Nothing was written
    Skipped(SkipReason),
}

/// Signed hinge rotation (radians) that carries `current` toward `target`
/// about `axis` through `pivot`.
///
/// Returns `None` when either point projects to (almost) nothing on the
/// hinge plane.
pub fn revolute_delta(axis: Vec3, pivot: Vec3, current: Vec3, target: Vec3) -> Option<f32> {
    let current_dir = (current - pivot).normalize().project_on_plane(axis);
    let target_dir = (target - pivot).normalize().project_on_plane(axis);

    if current_dir.length() < DEGENERATE_EPSILON || target_dir.length() < DEGENERATE_EPSILON {
        return None;
    }
    Some(current_dir.signed_angle(target_dir, axis))
}

/// Follow settings for one grabbed body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointFollower {
    /// Teleport strategy
    pub mode: FollowMode,
    /// Follow revolute joints through their hinge
    pub respect_constraints: bool,
    /// Teleport the chain root instead of the body
    pub move_whole_chain: bool,
}

impl Default for JointFollower {
    fn default() -> Self {
        Self {
            mode: FollowMode::Instant,
            respect_constraints: true,
            move_whole_chain: false,
        }
    }
}

impl JointFollower {
    /// Create a follower
    pub fn new(mode: FollowMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set whether revolute constraints are respected
    pub fn with_respect_constraints(mut self, respect: bool) -> Self {
        self.respect_constraints = respect;
        self
    }

    /// Set whether the whole chain moves
    pub fn with_move_whole_chain(mut self, whole_chain: bool) -> Self {
        self.move_whole_chain = whole_chain;
        self
    }

    /// Move `body` one step toward `target`
    pub fn follow(
        &self,
        backend: &mut dyn ArticulationBackend,
        body: BodyHandle,
        target: &Pose,
        dt: f32,
    ) -> Result<FollowOutcome> {
        let joint_type = backend.joint_type(body)?;
        if self.respect_constraints && joint_type == JointType::Revolute {
            return self.follow_hinge(backend, body, target.position);
        }

        let current = backend.pose(body)?;
        let mut next = self.mode.step(&current, target, dt);
        if self.respect_constraints && joint_type == JointType::Other {
            next.rotation = current.rotation;
        }

        if self.move_whole_chain {
            let root = backend.root(body)?;
            if root != body {
                let root_pose = backend.pose(root)?;
                let (_, rotation) = current.delta_to(&next);
                let moved = Pose::new(
                    next.position + rotation * (root_pose.position - current.position),
                    (rotation * root_pose.rotation).normalize(),
                );
                backend.teleport(root, moved)?;
                return Ok(FollowOutcome::Teleported {
                    body: root,
                    pose: moved,
                });
            }
        }

        backend.teleport(body, next)?;
        Ok(FollowOutcome::Teleported { body, pose: next })
    }

    fn follow_hinge(
        &self,
        backend: &mut dyn ArticulationBackend,
        body: BodyHandle,
        target: Vec3,
    ) -> Result<FollowOutcome> {
        let axis = backend.joint_axis(body)?;
        let pivot = backend.joint_pivot(body)?;
        let current = backend.pose(body)?.position;

        let Some(delta) = revolute_delta(axis, pivot, current, target) else {
            tracing::trace!("Hinge follow skipped for {:?}: degenerate geometry", body);
            return Ok(FollowOutcome::Skipped(SkipReason::DegenerateGeometry));
        };

        let angle = backend.joint_position(body)? + delta;
        let drive = backend.drive(body, DriveAxis::X)?.with_clamped_target(angle);
        backend.set_drive(body, DriveAxis::X, drive)?;
        Ok(FollowOutcome::DriveTarget {
            angle: drive.target,
        })
    }
}

/// Advance a revolute joint's X-drive target by `input * speed_deg * dt`
/// degrees, clamped to the drive limits.
///
/// Returns the new target in radians, or `None` when the joint isn't revolute.
pub fn move_joint(
    backend: &mut dyn ArticulationBackend,
    body: BodyHandle,
    input: f32,
    speed_deg: f32,
    dt: f32,
) -> Result<Option<f32>> {
    if backend.joint_type(body)? != JointType::Revolute {
        return Ok(None);
    }
    let angle = backend.joint_position(body)? + (input * speed_deg * dt).to_radians();
    let drive = backend.drive(body, DriveAxis::X)?.with_clamped_target(angle);
    backend.set_drive(body, DriveAxis::X, drive)?;
    Ok(Some(drive.target))
}

/// Set a revolute joint's X-drive target directly (radians, clamped)
pub fn set_joint_angle(
    backend: &mut dyn ArticulationBackend,
    body: BodyHandle,
    angle: f32,
) -> Result<Option<f32>> {
    if backend.joint_type(body)? != JointType::Revolute {
        return Ok(None);
    }
    let drive = backend.drive(body, DriveAxis::X)?.with_clamped_target(angle);
    backend.set_drive(body, DriveAxis::X, drive)?;
    Ok(Some(drive.target))
}

/// Current joint angle in radians, `None` when the joint isn't revolute
pub fn joint_angle(backend: &dyn ArticulationBackend, body: BodyHandle) -> Result<Option<f32>> {
    if backend.joint_type(body)? != JointType::Revolute {
        return Ok(None);
    }
    backend.joint_position(body).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesketch_core::Quat;
    use kinesketch_physics::{
        ArticulationBody, ArticulationDrive, DofLock, DofLocks, JointAnchor, MemoryBackend,
    };
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn hinge(limits: (f32, f32)) -> (MemoryBackend, BodyHandle, BodyHandle) {
        let mut backend = MemoryBackend::new();
        let base = backend
            .add_body(ArticulationBody::root(Pose::IDENTITY).immovable())
            .unwrap();
        let arm = backend
            .add_body(
                ArticulationBody::revolute(base, Pose::from_position(Vec3::new(1.0, 0.0, 0.0)))
                    .with_anchor(JointAnchor::linked(Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO))
                    .with_locks(DofLocks::swing_y(DofLock::Limited))
                    .with_x_drive(ArticulationDrive::target(0.0).with_limits(limits.0, limits.1)),
            )
            .unwrap();
        (backend, base, arm)
    }

    #[test]
    fn test_revolute_delta_sign() {
        let delta = revolute_delta(
            Vec3::UP,
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert!((delta + FRAC_PI_2).abs() < 1e-5);

        let delta = revolute_delta(
            Vec3::UP,
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
        )
        .unwrap();
        assert!((delta - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_revolute_delta_degenerate() {
        // target straight along the hinge axis
        assert!(revolute_delta(Vec3::UP, Vec3::ZERO, Vec3::RIGHT, Vec3::new(0.0, 2.0, 0.0)).is_none());
        // body sitting on the pivot
        assert!(revolute_delta(Vec3::UP, Vec3::ZERO, Vec3::ZERO, Vec3::RIGHT).is_none());
    }

    #[test]
    fn test_hinge_follow_writes_drive_target() {
        let (mut backend, _, arm) = hinge((0.0, 0.0));
        let follower = JointFollower::default();

        let outcome = follower
            .follow(&mut backend, arm, &Pose::from_position(Vec3::new(0.0, 0.0, 1.0)), 0.016)
            .unwrap();
        let FollowOutcome::DriveTarget { angle } = outcome else {
            panic!("expected drive target, got {:?}", outcome);
        };
        assert!((angle + FRAC_PI_2).abs() < 1e-5);
        assert_eq!(backend.drive(arm, DriveAxis::X).unwrap().target, angle);
        assert_eq!(backend.teleport_count(), 0);
    }

    #[test]
    fn test_hinge_follow_clamps() {
        let (mut backend, _, arm) = hinge((-FRAC_PI_4, FRAC_PI_4));
        let follower = JointFollower::default();

        let outcome = follower
            .follow(&mut backend, arm, &Pose::from_position(Vec3::new(0.0, 0.0, 1.0)), 0.016)
            .unwrap();
        assert_eq!(outcome, FollowOutcome::DriveTarget { angle: -FRAC_PI_4 });
    }

    #[test]
    fn test_hinge_follow_degenerate_leaves_drive_alone() {
        let (mut backend, _, arm) = hinge((0.0, 0.0));
        let before = backend.drive(arm, DriveAxis::X).unwrap();

        let outcome = JointFollower::default()
            .follow(&mut backend, arm, &Pose::from_position(Vec3::new(0.0, 3.0, 0.0)), 0.016)
            .unwrap();
        assert_eq!(outcome, FollowOutcome::Skipped(SkipReason::DegenerateGeometry));
        assert_eq!(backend.drive(arm, DriveAxis::X).unwrap(), before);
    }

    #[test]
    fn test_instant_teleport_when_constraints_ignored() {
        let (mut backend, _, arm) = hinge((0.0, 0.0));
        let follower = JointFollower::default().with_respect_constraints(false);
        let target = Pose::new(Vec3::new(0.0, 1.0, 2.0), Quat::from_axis_angle(Vec3::UP, 0.3));

        let outcome = follower.follow(&mut backend, arm, &target, 0.016).unwrap();
        assert_eq!(outcome, FollowOutcome::Teleported { body: arm, pose: target });
        assert_eq!(backend.pose(arm).unwrap(), target);
    }

    #[test]
    fn test_smooth_step() {
        let mode = FollowMode::Smooth { speed: 10.0 };
        let current = Pose::IDENTITY;
        let target = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));

        let next = mode.step(&current, &target, 0.05);
        assert!((next.position.x - 0.5).abs() < 1e-6);

        // t saturates at 1
        let next = mode.step(&current, &target, 1.0);
        assert!((next.position.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_other_joint_keeps_rotation() {
        let mut backend = MemoryBackend::new();
        let body = backend
            .add_body(ArticulationBody::root(Pose::IDENTITY).with_joint_type(JointType::Other))
            .unwrap();
        let target = Pose::new(Vec3::new(0.0, 0.0, 1.0), Quat::from_axis_angle(Vec3::UP, 1.0));

        JointFollower::default()
            .follow(&mut backend, body, &target, 0.016)
            .unwrap();
        let pose = backend.pose(body).unwrap();
        assert_eq!(pose.position, target.position);
        assert_eq!(pose.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_move_whole_chain_moves_root() {
        let mut backend = MemoryBackend::new();
        let base = backend.add_body(ArticulationBody::root(Pose::IDENTITY)).unwrap();
        let tip = backend
            .add_body(ArticulationBody::fixed(base, Pose::from_position(Vec3::new(0.0, 1.0, 0.0))))
            .unwrap();
        let follower = JointFollower::default().with_move_whole_chain(true);

        let outcome = follower
            .follow(&mut backend, tip, &Pose::from_position(Vec3::new(2.0, 1.0, 0.0)), 0.016)
            .unwrap();
        assert!(matches!(outcome, FollowOutcome::Teleported { body, .. } if body == base));
        assert!((backend.pose(base).unwrap().position - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
        assert!((backend.pose(tip).unwrap().position - Vec3::new(2.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_move_joint() {
        let (mut backend, _, arm) = hinge((0.0, 0.0));
        let target = move_joint(&mut backend, arm, 1.0, 90.0, 1.0).unwrap().unwrap();
        assert!((target - FRAC_PI_2).abs() < 1e-5);

        let (mut backend, _, arm) = hinge((-0.1, 0.1));
        let target = move_joint(&mut backend, arm, -1.0, 90.0, 1.0).unwrap().unwrap();
        assert!((target + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_move_joint_ignores_fixed() {
        let mut backend = MemoryBackend::new();
        let body = backend.add_body(ArticulationBody::root(Pose::IDENTITY)).unwrap();
        assert_eq!(move_joint(&mut backend, body, 1.0, 90.0, 1.0).unwrap(), None);
        assert_eq!(joint_angle(&backend, body).unwrap(), None);
    }
}
