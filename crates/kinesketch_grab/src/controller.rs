//! Per-hand grab controller
//!
//! Each tick the controller:
//!
//! 1. Polls grip and the grab point pose
//! 2. Runs the grip latch: a rising edge starts searching, a falling edge
//!    releases
//! 3. While searching, grabs the nearest free interactable in range
//! 4. While grabbing, drives the held body toward the hand and forwards
//!    joint actuation input
//! 5. Reports a feedback line for the renderer

use crate::config::{ControllerConfig, JointControlInput};
use crate::error::{ConfigError, GrabError, InputError, Result};
use crate::events::GrabberId;
use crate::feedback::{FeedbackLine, FeedbackState};
use crate::follower::FollowOutcome;
use crate::input::{apply_deadzone, read_or_zero, GripEdge, GripLatch, InputChannel, InputSource};
use crate::registry::Interactables;
use kinesketch_core::{Pose, Vec3};
use kinesketch_physics::{ArticulationBackend, BodyHandle};
use smallvec::SmallVec;

/// Controller state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// Grip released
    #[default]
    Idle,
    /// Grip pressed, search not yet run (no pose this tick)
    Searching,
    /// Holding a body
    Grabbing(BodyHandle),
}

/// Grab start or end caused by a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrabTransition {
    /// Grab began
    Started(BodyHandle),
    /// Grab ended
    Ended(BodyHandle),
}

/// Nearest grabbable body found by a search
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrabCandidate {
    /// Body
    pub body: BodyHandle,
    /// Body position
    pub position: Vec3,
    /// Distance from the grab point
    pub distance: f32,
}

/// World access for one controller update
pub struct GrabUpdateContext<'a> {
    /// Delta time in seconds
    pub dt: f32,
    /// Articulation engine
    pub backend: &'a mut dyn ArticulationBackend,
    /// Grabbable bodies
    pub interactables: &'a mut Interactables,
}

/// What one tick did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrabTick {
    /// Grab started or ended this tick
    pub transition: Option<GrabTransition>,
    /// Follow step applied to the held body
    pub follow: Option<FollowOutcome>,
    /// New joint drive target from actuation input (radians)
    pub joint_target: Option<f32>,
    /// Feedback line to draw
    pub feedback: Option<FeedbackLine>,
}

/// Grab controller for one hand
#[derive(Clone, Debug)]
pub struct GrabController {
    id: GrabberId,
    config: ControllerConfig,
    state: ControllerState,
    latch: GripLatch,
    enabled: bool,
    /// Constraint setting to put back on the held body at release
    restore_constraints: Option<bool>,
}

impl GrabController {
    /// Create a controller
    pub fn new(id: GrabberId, config: ControllerConfig) -> Self {
        Self {
            id,
            config,
            state: ControllerState::Idle,
            latch: GripLatch::default(),
            enabled: true,
            restore_constraints: None,
        }
    }

    /// Create a controller after validating its configuration
    pub fn try_new(id: GrabberId, config: ControllerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(id, config))
    }

    /// Controller id
    pub fn id(&self) -> GrabberId {
        self.id
    }

    /// Configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Held body
    pub fn grabbed(&self) -> Option<BodyHandle> {
        match self.state {
            ControllerState::Grabbing(body) => Some(body),
            _ => None,
        }
    }

    /// Whether a body is held
    pub fn is_grabbing(&self) -> bool {
        self.grabbed().is_some()
    }

    /// Whether the controller is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable; disabling releases whatever is held
    pub fn set_enabled(&mut self, ctx: &mut GrabUpdateContext<'_>, enabled: bool) -> Option<GrabTransition> {
        self.enabled = enabled;
        if enabled {
            return None;
        }
        let transition = self.release(ctx);
        self.state = ControllerState::Idle;
        self.latch.reset();
        transition
    }

    /// Check that every channel this configuration reads is available
    pub fn validate_input(&self, input: &dyn InputSource) -> Result<()> {
        let mut checks: SmallVec<[(InputChannel, std::result::Result<(), InputError>); 4]> = SmallVec::new();
        checks.push((InputChannel::Grip, input.grip().map(drop)));
        checks.push((InputChannel::Pose, input.pose().map(drop)));
        match self.config.joint_control {
            JointControlInput::TriggerMinusGrip => {
                checks.push((InputChannel::Trigger, input.trigger().map(drop)))
            }
            JointControlInput::ThumbstickY => {
                checks.push((InputChannel::Thumbstick, input.thumbstick().map(drop)))
            }
            JointControlInput::Disabled => {}
        }

        let mut missing = Vec::new();
        for (channel, result) in checks {
            if let Err(err) = result {
                tracing::error!("GrabController {:?}: {}", self.id, err);
                missing.push(channel);
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GrabError::MissingInputs(missing))
        }
    }

    /// Run one tick
    pub fn update(&mut self, ctx: &mut GrabUpdateContext<'_>, input: &dyn InputSource) -> GrabTick {
        let mut tick = GrabTick::default();
        if !self.enabled {
            return tick;
        }

        let grip = read_or_zero(input.grip());
        let pose = match input.pose() {
            Ok(pose) => Some(pose),
            Err(err) => {
                tracing::warn!("GrabController {:?}: pose unavailable, skipping: {}", self.id, err);
                None
            }
        };

        self.drop_stale_grab(ctx);

        match self
            .latch
            .update(grip, self.config.grab_threshold, self.config.release_threshold)
        {
            Some(GripEdge::Pressed) if self.state == ControllerState::Idle => {
                self.state = ControllerState::Searching;
            }
            Some(GripEdge::Released) => {
                tick.transition = self.release(ctx);
                self.state = ControllerState::Idle;
            }
            _ => {}
        }

        if self.state == ControllerState::Searching {
            if let Some(pose) = &pose {
                match self.try_grab(ctx, pose) {
                    Some(body) => tick.transition = Some(GrabTransition::Started(body)),
                    None => {
                        tracing::debug!("GrabController {:?}: nothing to grab", self.id);
                        self.state = ControllerState::Idle;
                    }
                }
            }
        }

        if let ControllerState::Grabbing(body) = self.state {
            if let Some(interactable) = ctx.interactables.get_mut(body) {
                if let Some(pose) = &pose {
                    tick.follow = interactable.update(ctx.backend, pose, ctx.dt);
                }
                let value = self.joint_input(input, grip);
                if value != 0.0 {
                    tick.joint_target = interactable.move_joint_with_input(ctx.backend, value, ctx.dt);
                }
            }
        }

        tick.feedback = pose.and_then(|pose| self.feedback(ctx, grip, &pose));
        tick
    }

    /// Release the held body, if any
    pub fn release(&mut self, ctx: &mut GrabUpdateContext<'_>) -> Option<GrabTransition> {
        let ControllerState::Grabbing(body) = self.state else {
            return None;
        };
        self.state = ControllerState::Idle;
        let restore = self.restore_constraints.take();

        if let Some(interactable) = ctx.interactables.get_mut(body) {
            if interactable.session().map(|s| s.grabber()) == Some(self.id) {
                interactable.stop_grab(ctx.backend);
            }
            if let Some(respect) = restore {
                interactable.set_respect_constraints(respect);
            }
        }
        tracing::debug!("GrabController {:?}: released {:?}", self.id, body);
        Some(GrabTransition::Ended(body))
    }

    /// Nearest enabled, free interactable within the capture radius of `point`
    ///
    /// Ties keep the first hit in backend order.
    pub fn find_candidate(
        &self,
        backend: &dyn ArticulationBackend,
        interactables: &Interactables,
        point: Vec3,
    ) -> Option<GrabCandidate> {
        let mut best: Option<GrabCandidate> = None;
        for hit in backend.overlap_sphere(point, self.config.capture_radius) {
            let Some(interactable) = interactables.get(hit.body) else {
                continue;
            };
            if !interactable.is_enabled() || interactable.is_grabbed() {
                continue;
            }
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(GrabCandidate {
                    body: hit.body,
                    position: hit.position,
                    distance: hit.distance,
                });
            }
        }
        best
    }

    fn try_grab(&mut self, ctx: &mut GrabUpdateContext<'_>, pose: &Pose) -> Option<BodyHandle> {
        let candidate = self.find_candidate(&*ctx.backend, &*ctx.interactables, pose.position)?;
        let interactable = ctx.interactables.get_mut(candidate.body)?;

        let previous = interactable.respect_constraints();
        if self.config.allow_free_rotation {
            interactable.set_respect_constraints(false);
        }
        if !interactable.start_grab(ctx.backend, self.id, pose) {
            interactable.set_respect_constraints(previous);
            return None;
        }

        if self.config.allow_free_rotation {
            self.restore_constraints = Some(previous);
        }
        self.state = ControllerState::Grabbing(candidate.body);
        tracing::debug!(
            "GrabController {:?}: grabbed {:?} at distance {:.3}",
            self.id,
            candidate.body,
            candidate.distance
        );
        Some(candidate.body)
    }

    fn drop_stale_grab(&mut self, ctx: &GrabUpdateContext<'_>) {
        let ControllerState::Grabbing(body) = self.state else {
            return;
        };
        let held = ctx
            .interactables
            .get(body)
            .and_then(|i| i.session())
            .map_or(false, |s| s.grabber() == self.id);
        if !held {
            tracing::warn!("GrabController {:?}: held body {:?} is gone, dropping it", self.id, body);
            self.state = ControllerState::Idle;
            self.restore_constraints = None;
        }
    }

    fn joint_input(&self, input: &dyn InputSource, grip: f32) -> f32 {
        let raw = match self.config.joint_control {
            JointControlInput::TriggerMinusGrip => read_or_zero(input.trigger()) - grip,
            JointControlInput::ThumbstickY => read_or_zero(input.thumbstick()).y,
            JointControlInput::Disabled => return 0.0,
        };
        apply_deadzone(raw, self.config.deadzone) * self.config.sensitivity
    }

    fn feedback(&self, ctx: &GrabUpdateContext<'_>, grip: f32, pose: &Pose) -> Option<FeedbackLine> {
        let start = pose.position;
        if let ControllerState::Grabbing(body) = self.state {
            let end = ctx.backend.pose(body).ok()?.position;
            return Some(FeedbackLine {
                start,
                end,
                state: FeedbackState::Grabbed,
            });
        }
        if grip <= self.config.feedback_threshold {
            return None;
        }

        let candidate = self.find_candidate(&*ctx.backend, &*ctx.interactables, start)?;
        let state = if grip > self.config.grab_threshold {
            FeedbackState::Ready
        } else {
            FeedbackState::Candidate
        };
        Some(FeedbackLine {
            start,
            end: candidate.position,
            state,
        })
    }
}
