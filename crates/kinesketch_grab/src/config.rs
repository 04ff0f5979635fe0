//! Grab layer configuration
//!
//! Tunables are fixed at construction. They can be built in code or loaded
//! from a TOML file:
//!
//! ```toml
//! [grab]
//! preserve_settings = true
//! grab_drive = { mode = "force", stiffness = 1000.0, damping = 50.0 }
//! follow_mode = { type = "smooth", speed = 10.0 }
//!
//! [controller]
//! capture_radius = 0.1
//! grab_threshold = 0.5
//! release_threshold = 0.3
//! joint_control = "thumbstick_y"
//! ```

use crate::error::ConfigError;
use crate::follower::FollowMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default stiffness installed for force-based grabbing
pub const DEFAULT_GRAB_STIFFNESS: f32 = 1000.0;
/// Default damping installed for force-based grabbing
pub const DEFAULT_GRAB_DAMPING: f32 = 50.0;
/// Default joint actuation speed in degrees per second
pub const DEFAULT_JOINT_MOVE_SPEED: f32 = 90.0;

/// How a body's drives are set up while it is held
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GrabDriveMode {
    /// Switch the X drive to velocity-following and move the body directly
    Kinematic,
    /// Install spring drives sized for force-based grabbing
    Force {
        /// Drive stiffness
        stiffness: f32,
        /// Drive damping
        damping: f32,
    },
}

impl Default for GrabDriveMode {
    fn default() -> Self {
        Self::Kinematic
    }
}

impl GrabDriveMode {
    /// Force mode with the default stiffness and damping
    pub fn force() -> Self {
        Self::Force {
            stiffness: DEFAULT_GRAB_STIFFNESS,
            damping: DEFAULT_GRAB_DAMPING,
        }
    }
}

/// Per-interactable settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// Restore the pre-grab drives and immovable flag on release
    pub preserve_settings: bool,
    /// Drive setup while held
    pub grab_drive: GrabDriveMode,
    /// Pose-following strategy for teleported bodies
    pub follow_mode: FollowMode,
    /// Follow revolute joints through their hinge instead of teleporting
    pub respect_constraints: bool,
    /// Teleport the chain root instead of the grabbed link
    pub move_whole_chain: bool,
    /// Accept joint actuation input while held
    pub allow_joint_movement: bool,
    /// Joint actuation speed (degrees per second at full input)
    pub joint_move_speed: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            preserve_settings: true,
            grab_drive: GrabDriveMode::Kinematic,
            follow_mode: FollowMode::Instant,
            respect_constraints: true,
            move_whole_chain: false,
            allow_joint_movement: true,
            joint_move_speed: DEFAULT_JOINT_MOVE_SPEED,
        }
    }
}

impl GrabConfig {
    /// Use a follow strategy
    pub fn with_follow_mode(mut self, mode: FollowMode) -> Self {
        self.follow_mode = mode;
        self
    }

    /// Use a grab drive mode
    pub fn with_grab_drive(mut self, mode: GrabDriveMode) -> Self {
        self.grab_drive = mode;
        self
    }

    /// Move the whole chain when teleporting
    pub fn with_move_whole_chain(mut self, enabled: bool) -> Self {
        self.move_whole_chain = enabled;
        self
    }

    /// Enable or disable restoration on release
    pub fn with_preserve_settings(mut self, enabled: bool) -> Self {
        self.preserve_settings = enabled;
        self
    }

    /// Check ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.joint_move_speed.is_finite() && self.joint_move_speed >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "joint_move_speed must be a non-negative number, got {}",
                self.joint_move_speed
            )));
        }
        if let FollowMode::Smooth { speed } = self.follow_mode {
            if !(speed.is_finite() && speed > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "smooth follow speed must be positive, got {}",
                    speed
                )));
            }
        }
        if let GrabDriveMode::Force { stiffness, damping } = self.grab_drive {
            if stiffness < 0.0 || damping < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "grab drive stiffness/damping must be non-negative, got {}/{}",
                    stiffness, damping
                )));
            }
        }
        Ok(())
    }
}

/// Which input drives the held joint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JointControlInput {
    /// Trigger pushes positive, grip pulls negative
    TriggerMinusGrip,
    /// Vertical thumbstick axis
    #[default]
    ThumbstickY,
    /// No joint actuation from input
    Disabled,
}

/// Grab controller settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Search radius around the grab point (meters)
    pub capture_radius: f32,
    /// Grip value above which a grab starts
    pub grab_threshold: f32,
    /// Grip value below which a grab ends; must be below `grab_threshold`
    pub release_threshold: f32,
    /// Grip value above which candidate feedback is shown
    pub feedback_threshold: f32,
    /// Joint actuation source
    pub joint_control: JointControlInput,
    /// Inputs with smaller magnitude are treated as zero
    pub deadzone: f32,
    /// Multiplier applied after the deadzone
    pub sensitivity: f32,
    /// Ignore joint constraints for anything this controller grabs
    pub allow_free_rotation: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            capture_radius: 0.1,
            grab_threshold: 0.5,
            release_threshold: 0.3,
            feedback_threshold: 0.1,
            joint_control: JointControlInput::default(),
            deadzone: 0.1,
            sensitivity: 1.0,
            allow_free_rotation: false,
        }
    }
}

impl ControllerConfig {
    /// Set the grab/release thresholds
    pub fn with_thresholds(mut self, grab: f32, release: f32) -> Self {
        self.grab_threshold = grab;
        self.release_threshold = release;
        self
    }

    /// Set the capture radius
    pub fn with_capture_radius(mut self, radius: f32) -> Self {
        self.capture_radius = radius;
        self
    }

    /// Set the joint actuation source
    pub fn with_joint_control(mut self, source: JointControlInput) -> Self {
        self.joint_control = source;
        self
    }

    /// Check ranges and threshold ordering
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.capture_radius.is_finite() && self.capture_radius > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "capture_radius must be positive, got {}",
                self.capture_radius
            )));
        }
        if !(self.grab_threshold > 0.0 && self.grab_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "grab_threshold must be in (0, 1], got {}",
                self.grab_threshold
            )));
        }
        if !(self.release_threshold >= 0.0 && self.release_threshold < self.grab_threshold) {
            return Err(ConfigError::Invalid(format!(
                "release_threshold must be in [0, grab_threshold), got {} with grab_threshold {}",
                self.release_threshold, self.grab_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.deadzone) {
            return Err(ConfigError::Invalid(format!(
                "deadzone must be in [0, 1), got {}",
                self.deadzone
            )));
        }
        if !self.sensitivity.is_finite() {
            return Err(ConfigError::Invalid("sensitivity must be finite".into()));
        }
        Ok(())
    }
}

/// Complete grab layer configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KinesketchConfig {
    /// Defaults for new interactables
    #[serde(default)]
    pub grab: GrabConfig,
    /// Controller settings
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl KinesketchConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate both sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grab.validate()?;
        self.controller.validate()
    }
}
