//! Error types for voxray_core operations.

use thiserror::Error;

/// Errors raised by the pure math layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Resolution must be strictly positive and finite.
    #[error("invalid resolution {value}: must be positive and finite")]
    InvalidResolution {
        /// The rejected value.
        value: f64,
    },

    /// A ray with a zero direction vector cannot be marched.
    #[error("ray direction is the zero vector")]
    DegenerateDirection,

    /// A NaN or infinite value where a finite one was required.
    #[error("non-finite value in {context}")]
    NonFinite {
        /// What was being read.
        context: &'static str,
    },

    /// A transform that is not a rigid homogeneous matrix.
    #[error("invalid transform: {message}")]
    InvalidTransform {
        /// Description of the problem.
        message: String,
    },
}

/// Result type alias for voxray_core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Check that a map resolution is usable.
pub fn validate_resolution(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CoreError::InvalidResolution { value })
    }
}
