//! Joint topology: type, degree-of-freedom locks and anchors

use kinesketch_core::{Pose, Quat, Vec3};

/// Articulation joint types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JointType {
    /// Bodies move together
    #[default]
    Fixed,
    /// Rotation around one axis (hinge)
    Revolute,
    /// Anything else the engine supports (prismatic, spherical, ...)
    Other,
}

/// Motion allowed on one degree of freedom
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DofLock {
    /// No motion
    #[default]
    Locked,
    /// Motion between the drive limits
    Limited,
    /// Unrestricted motion
    Free,
}

impl DofLock {
    /// Whether the degree of freedom can move at all
    pub fn is_unlocked(self) -> bool {
        !matches!(self, DofLock::Locked)
    }
}

/// Rotational degree of freedom of a joint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationDof {
    /// About local +Z
    Twist,
    /// About local +Y
    SwingY,
    /// About local +X
    SwingZ,
}

impl RotationDof {
    /// The local-space axis this degree of freedom rotates about
    pub fn local_axis(self) -> Vec3 {
        match self {
            RotationDof::Twist => Vec3::FORWARD,
            RotationDof::SwingY => Vec3::UP,
            RotationDof::SwingZ => Vec3::RIGHT,
        }
    }
}

/// Lock state of the three rotational degrees of freedom
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DofLocks {
    /// Twist lock
    pub twist: DofLock,
    /// Swing-Y lock
    pub swing_y: DofLock,
    /// Swing-Z lock
    pub swing_z: DofLock,
}

impl DofLocks {
    /// Everything locked
    pub fn locked() -> Self {
        Self::default()
    }

    /// Only twist unlocked
    pub fn twist(lock: DofLock) -> Self {
        Self {
            twist: lock,
            ..Self::default()
        }
    }

    /// Only swing-Y unlocked
    pub fn swing_y(lock: DofLock) -> Self {
        Self {
            swing_y: lock,
            ..Self::default()
        }
    }

    /// Only swing-Z unlocked
    pub fn swing_z(lock: DofLock) -> Self {
        Self {
            swing_z: lock,
            ..Self::default()
        }
    }

    /// The rotational degree of freedom a hinge turns about.
    ///
    /// Picks the first unlocked DOF in the order twist, swing-Y, swing-Z and
    /// falls back to twist when all are locked. A joint with several free
    /// DOFs silently reports only the first.
    pub fn hinge_dof(&self) -> RotationDof {
        if self.twist.is_unlocked() {
            RotationDof::Twist
        } else if self.swing_y.is_unlocked() {
            RotationDof::SwingY
        } else if self.swing_z.is_unlocked() {
            RotationDof::SwingZ
        } else {
            RotationDof::Twist
        }
    }

    /// Number of unlocked rotational degrees of freedom
    pub fn unlocked_count(&self) -> usize {
        [self.twist, self.swing_y, self.swing_z]
            .into_iter()
            .filter(|l| l.is_unlocked())
            .count()
    }
}

/// Joint anchor frames
///
/// `position`/`rotation` are in the body's own space; the `parent_*` pair is
/// the same pivot expressed in the parent link's space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct JointAnchor {
    /// Pivot in body space
    pub position: Vec3,
    /// Anchor orientation in body space
    pub rotation: Quat,
    /// Pivot in parent space
    pub parent_position: Vec3,
    /// Anchor orientation in parent space
    pub parent_rotation: Quat,
}

impl JointAnchor {
    /// Anchor at a body-space point with identity orientation
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Anchor given in both body and parent space
    pub fn linked(position: Vec3, parent_position: Vec3) -> Self {
        Self {
            position,
            parent_position,
            ..Self::default()
        }
    }

    /// Set the anchor orientation (both frames)
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self.parent_rotation = rotation;
        self
    }

    /// World-space pivot.
    ///
    /// Linked bodies pivot on the parent-space anchor; roots on their own.
    pub fn world_pivot(&self, body: &Pose, parent: Option<&Pose>) -> Vec3 {
        match parent {
            Some(parent) => parent.transform_point(self.parent_position),
            None => body.transform_point(self.position),
        }
    }

    /// World-space rotation axis of `dof`
    pub fn world_axis(&self, body: &Pose, dof: RotationDof) -> Vec3 {
        (body.rotation * self.rotation * dof.local_axis()).normalize()
    }
}
