//! Kinesketch Core
//!
//! Math primitives shared by the Kinesketch crates:
//!
//! - **Vectors**: [`Vec2`] for thumbstick axes, [`Vec3`] with plane projection
//!   and signed angles for joint geometry
//! - **Rotations**: [`Quat`] with slerp
//! - **Poses**: [`Pose`] rigid transforms for controllers and bodies
//! - **Limits**: [`clamp_to_limits`] with the "lower >= upper is unlimited" rule
//!
//! # Example
//!
//! ```rust
//! use kinesketch_core::{Quat, Vec3};
//!
//! let q = Quat::from_axis_angle(Vec3::UP, std::f32::consts::FRAC_PI_2);
//! let v = q * Vec3::RIGHT;
//! assert!((v.z + 1.0).abs() < 1e-5);
//! ```

pub mod angle;
pub mod pose;
pub mod quat;
pub mod vec;

pub use angle::{clamp_to_limits, is_limited};
pub use pose::Pose;
pub use quat::Quat;
pub use vec::{Vec2, Vec3};
