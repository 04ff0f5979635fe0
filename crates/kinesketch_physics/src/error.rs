//! Articulation backend error types

use crate::BodyHandle;
use thiserror::Error;

/// Errors reported by an articulation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// The handle does not refer to a live body
    #[error("Unknown articulation body: {0:?}")]
    UnknownBody(BodyHandle),

    /// A body named as parent does not exist
    #[error("Unknown parent body: {0:?}")]
    UnknownParent(BodyHandle),

    /// Walking parents did not reach a root
    #[error("Articulation chain starting at {0:?} is cyclic or deeper than {1} links")]
    ChainTooDeep(BodyHandle, usize),

    /// Backend-specific failure
    #[error("Articulation backend error: {0}")]
    Backend(String),
}

/// Result type for articulation backend operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
