//! Error types for kinesketch_grab
//!
//! None of these cross the grab-session boundary: public tick and grab
//! operations log them and report "nothing happened" instead.

use crate::input::InputChannel;
use kinesketch_physics::PhysicsError;
use thiserror::Error;

/// Errors reading controller input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// The channel is not bound or the device is missing
    #[error("Input channel {0:?} is not available")]
    Unavailable(InputChannel),

    /// The device returned an error for this read
    #[error("Failed to read {channel:?}: {reason}")]
    ReadFailed {
        /// Channel being read
        channel: InputChannel,
        /// Device-reported reason
        reason: String,
    },
}

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to write TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A tunable is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors inside the grab layer
#[derive(Error, Debug)]
pub enum GrabError {
    /// Articulation backend failure
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// Input failure
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Configuration failure
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Channels required by the controller configuration are missing
    #[error("Missing input channels: {0:?}")]
    MissingInputs(Vec<InputChannel>),
}

/// Result type for kinesketch_grab operations
pub type Result<T> = std::result::Result<T, GrabError>;
