//! Joint drive parameters

use kinesketch_core::clamp_to_limits;

/// How a drive actuates its axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DriveType {
    /// Spring-damper force toward target and target velocity
    #[default]
    Force,
    /// Track the target position
    Target,
    /// Track the target velocity
    TargetVelocity,
    /// Velocity-following mode used while a body is held kinematically
    Velocity,
}

/// Drive axis of an articulation joint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriveAxis {
    /// Primary axis; revolute joints are driven here
    X,
    Y,
    Z,
}

impl DriveAxis {
    /// All axes in storage order
    pub const ALL: [DriveAxis; 3] = [DriveAxis::X, DriveAxis::Y, DriveAxis::Z];

    /// Storage index of the axis
    pub fn index(self) -> usize {
        match self {
            DriveAxis::X => 0,
            DriveAxis::Y => 1,
            DriveAxis::Z => 2,
        }
    }
}

/// Drive parameters for one joint axis
///
/// Angles are radians. `lower_limit >= upper_limit` means the axis is
/// unlimited.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArticulationDrive {
    /// Actuation mode
    pub drive_type: DriveType,
    /// Commanded position (radians for rotational axes)
    pub target: f32,
    /// Commanded velocity
    pub target_velocity: f32,
    /// Lower limit
    pub lower_limit: f32,
    /// Upper limit
    pub upper_limit: f32,
    /// Spring stiffness
    pub stiffness: f32,
    /// Damping
    pub damping: f32,
    /// Maximum force/torque the drive may apply
    pub force_limit: f32,
}

impl Default for ArticulationDrive {
    fn default() -> Self {
        Self {
            drive_type: DriveType::Force,
            target: 0.0,
            target_velocity: 0.0,
            lower_limit: 0.0,
            upper_limit: 0.0,
            stiffness: 0.0,
            damping: 0.0,
            force_limit: f32::MAX,
        }
    }
}

impl ArticulationDrive {
    /// Position-target drive
    pub fn target(target: f32) -> Self {
        Self {
            drive_type: DriveType::Target,
            target,
            ..Self::default()
        }
    }

    /// Force drive sized for grabbing: given stiffness and damping, no force cap
    pub fn grab_force(stiffness: f32, damping: f32) -> Self {
        Self {
            stiffness,
            damping,
            force_limit: f32::MAX,
            ..Self::default()
        }
    }

    /// Set limits
    pub fn with_limits(mut self, lower: f32, upper: f32) -> Self {
        self.lower_limit = lower;
        self.upper_limit = upper;
        self
    }

    /// Set stiffness and damping
    pub fn with_spring(mut self, stiffness: f32, damping: f32) -> Self {
        self.stiffness = stiffness;
        self.damping = damping;
        self
    }

    /// Set the drive type
    pub fn with_drive_type(mut self, drive_type: DriveType) -> Self {
        self.drive_type = drive_type;
        self
    }

    /// Whether the limits describe a real range
    pub fn is_limited(&self) -> bool {
        self.lower_limit < self.upper_limit
    }

    /// Clamp a candidate target into this drive's limits
    pub fn clamp(&self, value: f32) -> f32 {
        clamp_to_limits(value, self.lower_limit, self.upper_limit)
    }

    /// Copy of this drive with `target` clamped and written
    pub fn with_clamped_target(mut self, target: f32) -> Self {
        self.target = self.clamp(target);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_target_respects_limits() {
        let drive = ArticulationDrive::target(0.0).with_limits(-0.5, 0.5);
        assert_eq!(drive.with_clamped_target(2.0).target, 0.5);
        assert_eq!(drive.with_clamped_target(-2.0).target, -0.5);
    }

    #[test]
    fn test_unlimited_drive() {
        let drive = ArticulationDrive::target(0.0);
        assert!(!drive.is_limited());
        assert_eq!(drive.with_clamped_target(9.0).target, 9.0);
    }

    #[test]
    fn test_grab_force_preset() {
        let drive = ArticulationDrive::grab_force(1000.0, 50.0);
        assert_eq!(drive.drive_type, DriveType::Force);
        assert_eq!(drive.force_limit, f32::MAX);
        assert_eq!(drive.stiffness, 1000.0);
    }
}
