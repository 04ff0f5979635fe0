//! Kinesketch articulation boundary
//!
//! The grab layer never owns body transforms or joint parameters; it talks
//! to an articulation engine through [`ArticulationBackend`]:
//!
//! - **Drives**: per-axis [`ArticulationDrive`] (target, limits, stiffness, damping, force limit)
//! - **Topology**: [`JointType`], [`DofLocks`], [`JointAnchor`], parent links
//! - **State**: current joint position, world pose, immovable flag
//! - **Teleport**: the only way to move a body outside the solver
//! - **Queries**: sphere overlap for grab candidate search
//!
//! [`MemoryBackend`] is a small reference engine used by tests and demos.
//!
//! # Example
//!
//! ```ignore
//! use kinesketch_physics::*;
//!
//! let mut backend = MemoryBackend::new();
//! let base = backend.add_body(ArticulationBody::root(Pose::IDENTITY).immovable())?;
//! let door = backend.add_body(ArticulationBody::revolute(base, Pose::IDENTITY))?;
//! let axis = backend.joint_axis(door)?;
//! ```

mod body;
mod drive;
mod error;
mod joint;

#[cfg(feature = "memory-backend")]
mod memory_backend;

pub use body::{ArticulationBody, BodyHandle, ColliderHit};
pub use drive::{ArticulationDrive, DriveAxis, DriveType};
pub use error::{PhysicsError, Result};
pub use joint::{DofLock, DofLocks, JointAnchor, JointType, RotationDof};

#[cfg(feature = "memory-backend")]
pub use memory_backend::MemoryBackend;

pub use kinesketch_core::{Pose, Quat, Vec3};

/// Maximum number of parent links walked when resolving a chain root
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Articulation engine trait
///
/// Implement this trait to connect the grab layer to a physics engine. The
/// engine applies drive targets and teleports before the next tick's reads.
pub trait ArticulationBackend: Send + Sync {
    /// Whether the handle refers to a live body
    fn contains(&self, body: BodyHandle) -> bool;

    /// Joint type of the body's link to its parent
    fn joint_type(&self, body: BodyHandle) -> Result<JointType>;

    /// Change the joint type
    fn set_joint_type(&mut self, body: BodyHandle, joint_type: JointType) -> Result<()>;

    /// Read one drive
    fn drive(&self, body: BodyHandle, axis: DriveAxis) -> Result<ArticulationDrive>;

    /// Write one drive
    fn set_drive(&mut self, body: BodyHandle, axis: DriveAxis, drive: ArticulationDrive) -> Result<()>;

    /// Whether the body is pinned
    fn immovable(&self, body: BodyHandle) -> Result<bool>;

    /// Pin or unpin the body
    fn set_immovable(&mut self, body: BodyHandle, immovable: bool) -> Result<()>;

    /// Joint anchor frames
    fn anchor(&self, body: BodyHandle) -> Result<JointAnchor>;

    /// Rotational DOF locks
    fn dof_locks(&self, body: BodyHandle) -> Result<DofLocks>;

    /// Current joint position of the primary axis (radians)
    fn joint_position(&self, body: BodyHandle) -> Result<f32>;

    /// World pose
    fn pose(&self, body: BodyHandle) -> Result<Pose>;

    /// Parent link, `None` for a chain root
    fn parent(&self, body: BodyHandle) -> Result<Option<BodyHandle>>;

    /// Move a body (and whatever the engine carries with it) to `pose`,
    /// bypassing integration
    fn teleport(&mut self, body: BodyHandle, pose: Pose) -> Result<()>;

    /// Colliders whose surface lies within `radius` of `center`, in engine
    /// enumeration order
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<ColliderHit>;

    /// Backend name
    fn name(&self) -> &'static str;

    /// Root of the body's kinematic chain
    fn root(&self, body: BodyHandle) -> Result<BodyHandle> {
        let mut current = body;
        for _ in 0..MAX_CHAIN_DEPTH {
            match self.parent(current)? {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
        Err(PhysicsError::ChainTooDeep(body, MAX_CHAIN_DEPTH))
    }

    /// World-space rotation axis of a hinge
    fn joint_axis(&self, body: BodyHandle) -> Result<Vec3> {
        let pose = self.pose(body)?;
        let dof = self.dof_locks(body)?.hinge_dof();
        Ok(self.anchor(body)?.world_axis(&pose, dof))
    }

    /// World-space joint pivot
    fn joint_pivot(&self, body: BodyHandle) -> Result<Vec3> {
        let pose = self.pose(body)?;
        let parent_pose = match self.parent(body)? {
            Some(parent) => Some(self.pose(parent)?),
            None => None,
        };
        Ok(self.anchor(body)?.world_pivot(&pose, parent_pose.as_ref()))
    }
}
