//! Articulated body description and query results

use crate::{ArticulationDrive, DofLocks, JointAnchor, JointType};
use kinesketch_core::{Pose, Vec3};
use slotmap::new_key_type;

new_key_type! {
    /// Handle to an articulated body owned by the physics engine
    pub struct BodyHandle;
}

/// Description of an articulated body to add to a backend
///
/// # Example
///
/// ```ignore
/// let base = backend.add_body(ArticulationBody::root(Pose::IDENTITY).immovable())?;
/// let arm = backend.add_body(
///     ArticulationBody::revolute(base, Pose::from_position(Vec3::new(1.0, 0.0, 0.0)))
///         .with_anchor(JointAnchor::linked(Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO))
///         .with_locks(DofLocks::swing_y(DofLock::Limited)),
/// )?;
/// ```
#[derive(Clone, Debug)]
pub struct ArticulationBody {
    /// Optional name for debugging
    pub name: Option<String>,
    /// Parent link (None = chain root)
    pub parent: Option<crate::BodyHandle>,
    /// Initial world pose
    pub pose: Pose,
    /// Joint to the parent
    pub joint_type: JointType,
    /// X, Y and Z drives
    pub drives: [ArticulationDrive; 3],
    /// Whether the body is pinned in place
    pub immovable: bool,
    /// Joint anchor
    pub anchor: JointAnchor,
    /// Rotational DOF locks
    pub dof_locks: DofLocks,
    /// Initial joint position (radians)
    pub joint_position: f32,
    /// Radius of the body's sphere collider
    pub collider_radius: f32,
}

impl ArticulationBody {
    /// A chain root at `pose`
    pub fn root(pose: Pose) -> Self {
        Self {
            name: None,
            parent: None,
            pose,
            joint_type: JointType::Fixed,
            drives: [ArticulationDrive::default(); 3],
            immovable: false,
            anchor: JointAnchor::default(),
            dof_locks: DofLocks::locked(),
            joint_position: 0.0,
            collider_radius: 0.05,
        }
    }

    /// A link fixed to `parent`
    pub fn fixed(parent: BodyHandle, pose: Pose) -> Self {
        Self {
            parent: Some(parent),
            ..Self::root(pose)
        }
    }

    /// A hinge link on `parent`, twist unlocked and driven by target
    pub fn revolute(parent: BodyHandle, pose: Pose) -> Self {
        Self {
            parent: Some(parent),
            joint_type: JointType::Revolute,
            drives: [
                ArticulationDrive::target(0.0),
                ArticulationDrive::default(),
                ArticulationDrive::default(),
            ],
            dof_locks: DofLocks::twist(crate::DofLock::Free),
            ..Self::root(pose)
        }
    }

    /// Set the debug name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the joint type
    pub fn with_joint_type(mut self, joint_type: JointType) -> Self {
        self.joint_type = joint_type;
        self
    }

    /// Set the X drive
    pub fn with_x_drive(mut self, drive: ArticulationDrive) -> Self {
        self.drives[0] = drive;
        self
    }

    /// Set the joint anchor
    pub fn with_anchor(mut self, anchor: JointAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Set the DOF locks
    pub fn with_locks(mut self, locks: DofLocks) -> Self {
        self.dof_locks = locks;
        self
    }

    /// Set the collider radius
    pub fn with_collider_radius(mut self, radius: f32) -> Self {
        self.collider_radius = radius.max(0.0);
        self
    }

    /// Mark immovable
    pub fn immovable(mut self) -> Self {
        self.immovable = true;
        self
    }
}

/// Result of a sphere overlap query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderHit {
    /// Body owning the collider
    pub body: BodyHandle,
    /// Collider center in world space
    pub position: Vec3,
    /// Distance from the query center to the collider center
    pub distance: f32,
}
