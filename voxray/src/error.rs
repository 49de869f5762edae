//! Error types for voxray operations.

use thiserror::Error;
use voxray_core::CoreError;
use voxray_io::IoError;

use crate::config::ConfigError;

/// Errors that can occur while integrating points or casting rays.
#[derive(Error, Debug)]
pub enum VoxrayError {
    /// Math-layer failure (degenerate ray, invalid transform, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage or artifact loading failure.
    #[error(transparent)]
    Io(#[from] IoError),

    /// Configuration could not be loaded or is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller-supplied parameter out of range.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}

impl VoxrayError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        VoxrayError::InvalidInput {
            message: message.into(),
        }
    }

    /// True for the zero-direction ray error.
    pub fn is_degenerate_direction(&self) -> bool {
        matches!(self, VoxrayError::Core(CoreError::DegenerateDirection))
    }
}

/// Result type alias for voxray operations.
pub type Result<T> = std::result::Result<T, VoxrayError>;
