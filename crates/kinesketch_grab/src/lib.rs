//! Kinesketch Grab
//!
//! Lets a VR hand controller pick up a link of an articulated chain and move
//! it while the chain's joints stay in charge of the motion.
//!
//! # Architecture
//!
//! - [`GrabController`] - per-hand state machine: grip latch, candidate
//!   search, follow, joint actuation input and feedback
//! - [`GrabInteractable`] - grab behavior of one body, owning at most one
//!   [`GrabSession`] and restoring the body's drives when it ends
//! - [`JointFollower`] - turns a target pose into a hinge drive target or a
//!   teleport
//! - [`ProxyHinge`] - drives a hinge from a free-floating proxy's rotation
//!
//! The physics engine sits behind [`kinesketch_physics::ArticulationBackend`]
//! and the XR runtime behind [`InputSource`].
//!
//! # Example
//!
//! ```ignore
//! use kinesketch_grab::prelude::*;
//!
//! let mut interactables = Interactables::new();
//! interactables.register(&mut backend, door, GrabConfig::default());
//! let mut hand = GrabController::new(GrabberId(0), ControllerConfig::default());
//!
//! loop {
//!     let mut ctx = GrabUpdateContext { dt, backend: &mut backend, interactables: &mut interactables };
//!     let tick = hand.update(&mut ctx, &runtime.right_hand());
//!     if let Some(line) = tick.feedback {
//!         draw_line(line.start, line.end, line.state.rgba());
//!     }
//! }
//! ```

mod config;
mod controller;
mod error;
mod events;
mod feedback;
mod follower;
mod input;
mod joint_state;
mod proxy;
mod registry;
mod session;

pub use config::{
    ControllerConfig, GrabConfig, GrabDriveMode, JointControlInput, KinesketchConfig,
    DEFAULT_GRAB_DAMPING, DEFAULT_GRAB_STIFFNESS, DEFAULT_JOINT_MOVE_SPEED,
};
pub use controller::{
    ControllerState, GrabCandidate, GrabController, GrabTick, GrabTransition, GrabUpdateContext,
};
pub use error::{ConfigError, GrabError, InputError, Result};
pub use events::{GrabEvent, GrabEventKind, GrabListeners, GrabberId, ListenerId};
pub use feedback::{FeedbackLine, FeedbackState};
pub use follower::{
    joint_angle, move_joint, revolute_delta, set_joint_angle, FollowMode, FollowOutcome,
    JointFollower, SkipReason, DEFAULT_FOLLOW_SPEED, DEGENERATE_EPSILON,
};
pub use input::{apply_deadzone, read_or_zero, GripEdge, GripLatch, InputChannel, InputSnapshot, InputSource};
pub use joint_state::JointState;
pub use proxy::ProxyHinge;
pub use registry::Interactables;
pub use session::{GrabInteractable, GrabSession};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ControllerConfig, GrabConfig, GrabDriveMode, JointControlInput, KinesketchConfig};
    pub use crate::controller::{ControllerState, GrabController, GrabTick, GrabTransition, GrabUpdateContext};
    pub use crate::error::{GrabError, Result};
    pub use crate::events::{GrabEvent, GrabEventKind, GrabberId};
    pub use crate::feedback::{FeedbackLine, FeedbackState};
    pub use crate::follower::{FollowMode, FollowOutcome};
    pub use crate::input::{InputSnapshot, InputSource};
    pub use crate::proxy::ProxyHinge;
    pub use crate::registry::Interactables;
    pub use crate::session::GrabInteractable;
    pub use kinesketch_core::{Pose, Quat, Vec2, Vec3};
    pub use kinesketch_physics::{ArticulationBackend, BodyHandle};
}
