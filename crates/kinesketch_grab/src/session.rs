//! Grabbable bodies and their grab sessions

use crate::config::{GrabConfig, GrabDriveMode};
use crate::events::{GrabEvent, GrabEventKind, GrabListeners, GrabberId};
use crate::follower::{self, FollowOutcome, JointFollower};
use crate::joint_state::JointState;
use kinesketch_core::{Pose, Quat, Vec3};
use kinesketch_physics::{
    ArticulationBackend, ArticulationDrive, BodyHandle, DriveAxis, DriveType, JointType, Result,
};

/// State of one grab, from start to release
///
/// The position offset is kept in the grabber's local frame so that turning
/// the hand swings the body around it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrabSession {
    grabber: GrabberId,
    position_offset: Vec3,
    rotation_offset: Quat,
    snapshot: JointState,
}

impl GrabSession {
    /// Start a session from the current grabber and body poses
    pub fn begin(grabber: GrabberId, grabber_pose: &Pose, body_pose: &Pose, snapshot: JointState) -> Self {
        let inverse = grabber_pose.rotation.inverse();
        Self {
            grabber,
            position_offset: inverse * (body_pose.position - grabber_pose.position),
            rotation_offset: (inverse * body_pose.rotation).normalize(),
            snapshot,
        }
    }

    /// Controller holding the body
    pub fn grabber(&self) -> GrabberId {
        self.grabber
    }

    /// Drive state captured when the grab began
    pub fn snapshot(&self) -> &JointState {
        &self.snapshot
    }

    /// Where the body should be for a given grabber pose
    pub fn target_pose(&self, grabber_pose: &Pose) -> Pose {
        Pose::new(
            grabber_pose.position + grabber_pose.rotation * self.position_offset,
            (grabber_pose.rotation * self.rotation_offset).normalize(),
        )
    }
}

/// Grab behavior attached to one articulated body
///
/// Holds at most one [`GrabSession`]. A body missing from the backend at
/// construction leaves the interactable permanently disabled.
#[derive(Debug)]
pub struct GrabInteractable {
    body: BodyHandle,
    config: GrabConfig,
    follower: JointFollower,
    original_joint_type: JointType,
    session: Option<GrabSession>,
    free_movement: Option<JointState>,
    listeners: GrabListeners,
    enabled: bool,
}

impl GrabInteractable {
    /// Attach grab behavior to `body`
    pub fn new(backend: &dyn ArticulationBackend, body: BodyHandle, config: GrabConfig) -> Self {
        let follower = JointFollower::new(config.follow_mode)
            .with_respect_constraints(config.respect_constraints)
            .with_move_whole_chain(config.move_whole_chain);

        let (original_joint_type, enabled) = match backend.joint_type(body) {
            Ok(joint_type) => (joint_type, true),
            Err(err) => {
                tracing::error!("GrabInteractable: body {:?} unavailable, disabling: {}", body, err);
                (JointType::Fixed, false)
            }
        };

        Self {
            body,
            config,
            follower,
            original_joint_type,
            session: None,
            free_movement: None,
            listeners: GrabListeners::new(),
            enabled,
        }
    }

    /// The body this interactable drives
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Configuration
    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Joint type at construction
    pub fn joint_type(&self) -> JointType {
        self.original_joint_type
    }

    /// Whether the interactable accepts grabs
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a session is active
    pub fn is_grabbed(&self) -> bool {
        self.session.is_some()
    }

    /// Active session
    pub fn session(&self) -> Option<&GrabSession> {
        self.session.as_ref()
    }

    /// Whether revolute joints are followed through their hinge
    pub fn respect_constraints(&self) -> bool {
        self.follower.respect_constraints
    }

    /// Toggle hinge following; takes effect on the next update
    pub fn set_respect_constraints(&mut self, respect: bool) {
        self.follower.respect_constraints = respect;
    }

    /// Grab start/end subscribers
    pub fn listeners_mut(&mut self) -> &mut GrabListeners {
        &mut self.listeners
    }

    /// Begin a grab. Returns false (and changes nothing) when disabled,
    /// already held, or the backend rejects the setup.
    pub fn start_grab(
        &mut self,
        backend: &mut dyn ArticulationBackend,
        grabber: GrabberId,
        grabber_pose: &Pose,
    ) -> bool {
        if !self.enabled {
            tracing::debug!("GrabInteractable {:?}: disabled, ignoring grab", self.body);
            return false;
        }
        if let Some(session) = &self.session {
            tracing::debug!(
                "GrabInteractable {:?}: already held by {:?}",
                self.body,
                session.grabber()
            );
            return false;
        }

        let snapshot = match JointState::capture(backend, self.body) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("GrabInteractable {:?}: grab failed: {}", self.body, err);
                return false;
            }
        };

        let body = self.body;
        let body_pose = self
            .install_grab_drives(backend)
            .and_then(|()| backend.pose(body));
        let body_pose = match body_pose {
            Ok(pose) => pose,
            Err(err) => {
                tracing::warn!("GrabInteractable {:?}: grab failed: {}", self.body, err);
                if let Err(err) = snapshot.restore(backend, self.body) {
                    tracing::warn!("GrabInteractable {:?}: rollback failed: {}", self.body, err);
                }
                return false;
            }
        };

        self.session = Some(GrabSession::begin(grabber, grabber_pose, &body_pose, snapshot));
        tracing::debug!("GrabInteractable {:?}: grabbed by {:?}", self.body, grabber);
        self.listeners.emit(&GrabEvent {
            kind: GrabEventKind::Started,
            body: self.body,
            grabber,
        });
        true
    }

    fn install_grab_drives(&self, backend: &mut dyn ArticulationBackend) -> Result<()> {
        match self.config.grab_drive {
            GrabDriveMode::Kinematic => {
                let drive = backend
                    .drive(self.body, DriveAxis::X)?
                    .with_drive_type(DriveType::Velocity);
                backend.set_drive(self.body, DriveAxis::X, drive)
            }
            GrabDriveMode::Force { stiffness, damping } => {
                if backend.joint_type(self.body)? != JointType::Fixed {
                    return Ok(());
                }
                let drive = ArticulationDrive::grab_force(stiffness, damping);
                for axis in DriveAxis::ALL {
                    backend.set_drive(self.body, axis, drive)?;
                }
                Ok(())
            }
        }
    }

    /// End the grab. Returns false when nothing was held.
    pub fn stop_grab(&mut self, backend: &mut dyn ArticulationBackend) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        if self.config.preserve_settings {
            if let Err(err) = session.snapshot().restore(backend, self.body) {
                tracing::warn!("GrabInteractable {:?}: restore failed: {}", self.body, err);
            }
        }

        tracing::debug!("GrabInteractable {:?}: released by {:?}", self.body, session.grabber());
        self.listeners.emit(&GrabEvent {
            kind: GrabEventKind::Ended,
            body: self.body,
            grabber: session.grabber(),
        });
        true
    }

    /// Chase the grabber for one tick
    pub fn update(
        &mut self,
        backend: &mut dyn ArticulationBackend,
        grabber_pose: &Pose,
        dt: f32,
    ) -> Option<FollowOutcome> {
        let target = self.session.as_ref()?.target_pose(grabber_pose);
        match self.follower.follow(backend, self.body, &target, dt) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::warn!("GrabInteractable {:?}: follow failed: {}", self.body, err);
                None
            }
        }
    }

    /// Actuate the held joint from an analog input in `[-1, 1]`
    ///
    /// Returns the new drive target in radians.
    pub fn move_joint_with_input(
        &mut self,
        backend: &mut dyn ArticulationBackend,
        input: f32,
        dt: f32,
    ) -> Option<f32> {
        if !self.is_grabbed() || !self.config.allow_joint_movement || input == 0.0 {
            return None;
        }
        follower::move_joint(backend, self.body, input, self.config.joint_move_speed, dt)
            .unwrap_or_else(|err| {
                tracing::warn!("GrabInteractable {:?}: joint move failed: {}", self.body, err);
                None
            })
    }

    /// Set the joint's drive target in degrees (revolute only)
    ///
    /// Returns the clamped target in degrees.
    pub fn set_joint_angle(&mut self, backend: &mut dyn ArticulationBackend, degrees: f32) -> Option<f32> {
        follower::set_joint_angle(backend, self.body, degrees.to_radians())
            .map(|target| target.map(f32::to_degrees))
            .unwrap_or_else(|err| {
                tracing::warn!("GrabInteractable {:?}: set angle failed: {}", self.body, err);
                None
            })
    }

    /// Current joint angle in degrees, zero for non-revolute joints
    pub fn joint_angle(&self, backend: &dyn ArticulationBackend) -> f32 {
        match follower::joint_angle(backend, self.body) {
            Ok(angle) => angle.map(f32::to_degrees).unwrap_or(0.0),
            Err(err) => {
                tracing::warn!("GrabInteractable {:?}: angle read failed: {}", self.body, err);
                0.0
            }
        }
    }

    /// Pin the body on a fixed joint so only teleports move it, or put the
    /// original joint back
    ///
    /// Ignored while a grab is active.
    pub fn set_free_movement(&mut self, backend: &mut dyn ArticulationBackend, enabled: bool) {
        let result = if enabled {
            self.enter_free_movement(backend)
        } else {
            self.leave_free_movement(backend)
        };
        if let Err(err) = result {
            tracing::warn!("GrabInteractable {:?}: free movement toggle failed: {}", self.body, err);
        }
    }

    /// Whether free movement is on
    pub fn is_free_movement(&self) -> bool {
        self.free_movement.is_some()
    }

    fn enter_free_movement(&mut self, backend: &mut dyn ArticulationBackend) -> Result<()> {
        if self.free_movement.is_some() {
            return Ok(());
        }
        if let Some(session) = &self.session {
            tracing::warn!(
                "GrabInteractable {:?}: held by {:?}, not entering free movement",
                self.body,
                session.grabber()
            );
            return Ok(());
        }
        let state = JointState::capture(backend, self.body)?;
        backend.set_joint_type(self.body, JointType::Fixed)?;
        backend.set_immovable(self.body, true)?;
        self.free_movement = Some(state);
        Ok(())
    }

    fn leave_free_movement(&mut self, backend: &mut dyn ArticulationBackend) -> Result<()> {
        let Some(state) = self.free_movement.take() else {
            return Ok(());
        };
        backend.set_joint_type(self.body, self.original_joint_type)?;
        state.restore(backend, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follower::FollowMode;
    use kinesketch_physics::{ArticulationBody, DofLock, DofLocks, JointAnchor, MemoryBackend};
    use std::f32::consts::FRAC_PI_2;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn hinge() -> (MemoryBackend, BodyHandle) {
        let mut backend = MemoryBackend::new();
        let base = backend
            .add_body(ArticulationBody::root(Pose::IDENTITY).immovable())
            .unwrap();
        let arm = backend
            .add_body(
                ArticulationBody::revolute(base, Pose::from_position(Vec3::new(1.0, 0.0, 0.0)))
                    .with_anchor(JointAnchor::linked(Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO))
                    .with_locks(DofLocks::swing_y(DofLock::Free))
                    .with_x_drive(ArticulationDrive::target(0.2).with_spring(300.0, 5.0)),
            )
            .unwrap();
        (backend, arm)
    }

    #[test]
    fn test_offset_in_grabber_space() {
        let grabber = Pose::new(Vec3::ZERO, Quat::from_axis_angle(Vec3::UP, FRAC_PI_2));
        let body = Pose::from_position(Vec3::new(0.0, 0.0, -1.0));
        let snapshot = {
            let (backend, arm) = hinge();
            JointState::capture(&backend, arm).unwrap()
        };
        let session = GrabSession::begin(GrabberId(0), &grabber, &body, snapshot);

        // unchanged grabber reproduces the body pose
        let target = session.target_pose(&grabber);
        assert!((target.position - body.position).length() < 1e-5);

        // turning the hand back by 90° swings the body with it
        let target = session.target_pose(&Pose::IDENTITY);
        assert!((target.position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_single_session() {
        let (mut backend, arm) = hinge();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        assert!(interactable.start_grab(&mut backend, GrabberId(1), &Pose::IDENTITY));
        assert!(!interactable.start_grab(&mut backend, GrabberId(2), &Pose::IDENTITY));
        assert_eq!(interactable.session().unwrap().grabber(), GrabberId(1));

        assert!(interactable.stop_grab(&mut backend));
        assert!(!interactable.stop_grab(&mut backend));
    }

    #[test]
    fn test_kinematic_grab_restores_drives() {
        let (mut backend, arm) = hinge();
        let before = JointState::capture(&backend, arm).unwrap();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY);
        assert_eq!(
            backend.drive(arm, DriveAxis::X).unwrap().drive_type,
            DriveType::Velocity
        );

        interactable.update(&mut backend, &Pose::from_position(Vec3::new(0.0, 0.0, 1.0)), 0.016);
        interactable.stop_grab(&mut backend);
        assert_eq!(JointState::capture(&backend, arm).unwrap(), before);
    }

    #[test]
    fn test_no_restore_when_not_preserving() {
        let (mut backend, arm) = hinge();
        let config = GrabConfig::default().with_preserve_settings(false);
        let mut interactable = GrabInteractable::new(&backend, arm, config);

        interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY);
        interactable.stop_grab(&mut backend);
        assert_eq!(
            backend.drive(arm, DriveAxis::X).unwrap().drive_type,
            DriveType::Velocity
        );
    }

    #[test]
    fn test_force_grab_on_fixed_joint() {
        let mut backend = MemoryBackend::new();
        let cup = backend
            .add_body(ArticulationBody::root(Pose::IDENTITY).immovable())
            .unwrap();
        let config = GrabConfig::default().with_grab_drive(GrabDriveMode::force());
        let mut interactable = GrabInteractable::new(&backend, cup, config);

        interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY);
        for axis in DriveAxis::ALL {
            let drive = backend.drive(cup, axis).unwrap();
            assert_eq!(drive.stiffness, 1000.0);
            assert_eq!(drive.damping, 50.0);
            assert_eq!(drive.force_limit, f32::MAX);
        }

        backend.set_immovable(cup, false).unwrap();
        interactable.stop_grab(&mut backend);
        assert!(backend.immovable(cup).unwrap());
        assert_eq!(backend.drive(cup, DriveAxis::Y).unwrap().stiffness, 0.0);
    }

    #[test]
    fn test_revolute_follow_through_interactable() {
        let (mut backend, arm) = hinge();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        // grab right at the body so the offset is zero
        let hand = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));
        interactable.start_grab(&mut backend, GrabberId(0), &hand);

        let outcome = interactable.update(&mut backend, &Pose::from_position(Vec3::new(0.0, 0.0, 1.0)), 0.016);
        let Some(FollowOutcome::DriveTarget { angle }) = outcome else {
            panic!("expected drive target, got {:?}", outcome);
        };
        assert!((angle + FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_smooth_follow_when_constraints_disabled() {
        let (mut backend, arm) = hinge();
        let config = GrabConfig::default().with_follow_mode(FollowMode::Smooth { speed: 10.0 });
        let mut interactable = GrabInteractable::new(&backend, arm, config);
        interactable.set_respect_constraints(false);

        let hand = Pose::from_position(Vec3::new(1.0, 0.0, 0.0));
        interactable.start_grab(&mut backend, GrabberId(0), &hand);
        interactable.update(&mut backend, &Pose::from_position(Vec3::new(2.0, 0.0, 0.0)), 0.05);

        let pos = backend.pose(arm).unwrap().position;
        assert!((pos - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_events_fire_once() {
        let (mut backend, arm) = hinge();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());
        let started = Arc::new(AtomicUsize::new(0));
        let ended = Arc::new(AtomicUsize::new(0));

        let s = started.clone();
        interactable.listeners_mut().on_started(move |event| {
            assert_eq!(event.grabber, GrabberId(7));
            s.fetch_add(1, Ordering::SeqCst);
        });
        let e = ended.clone();
        interactable.listeners_mut().on_ended(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });

        interactable.start_grab(&mut backend, GrabberId(7), &Pose::IDENTITY);
        interactable.start_grab(&mut backend, GrabberId(8), &Pose::IDENTITY);
        interactable.stop_grab(&mut backend);
        interactable.stop_grab(&mut backend);

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_body_disables() {
        let (mut backend, arm) = hinge();
        backend.remove_body(arm);
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        assert!(!interactable.is_enabled());
        assert!(!interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY));
    }

    #[test]
    fn test_move_joint_with_input() {
        let (mut backend, arm) = hinge();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        // not held yet
        assert_eq!(interactable.move_joint_with_input(&mut backend, 1.0, 0.5), None);

        interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY);
        let target = interactable.move_joint_with_input(&mut backend, 1.0, 0.5).unwrap();
        assert!((target - 45f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn test_set_and_read_joint_angle() {
        let (mut backend, arm) = hinge();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        let target = interactable.set_joint_angle(&mut backend, 30.0).unwrap();
        assert!((target - 30.0).abs() < 1e-4);

        backend.settle();
        assert!((interactable.joint_angle(&backend) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_free_movement_round_trip() {
        let (mut backend, arm) = hinge();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        interactable.set_free_movement(&mut backend, true);
        assert!(interactable.is_free_movement());
        assert_eq!(backend.joint_type(arm).unwrap(), JointType::Fixed);
        assert!(backend.immovable(arm).unwrap());

        interactable.set_free_movement(&mut backend, false);
        assert!(!interactable.is_free_movement());
        assert_eq!(backend.joint_type(arm).unwrap(), JointType::Revolute);
        assert!(!backend.immovable(arm).unwrap());
        assert_eq!(backend.drive(arm, DriveAxis::X).unwrap().target, 0.2);
    }

    #[test]
    fn test_free_movement_refused_while_grabbed() {
        let (mut backend, arm) = hinge();
        let before = JointState::capture(&backend, arm).unwrap();
        let mut interactable = GrabInteractable::new(&backend, arm, GrabConfig::default());

        interactable.start_grab(&mut backend, GrabberId(0), &Pose::IDENTITY);
        interactable.set_free_movement(&mut backend, true);
        assert!(!interactable.is_free_movement());
        assert_eq!(backend.joint_type(arm).unwrap(), JointType::Revolute);

        interactable.stop_grab(&mut backend);
        interactable.set_free_movement(&mut backend, false);
        assert_eq!(JointState::capture(&backend, arm).unwrap(), before);
        assert_eq!(
            backend.drive(arm, DriveAxis::X).unwrap().drive_type,
            DriveType::Target
        );
    }
}
