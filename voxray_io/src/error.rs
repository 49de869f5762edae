//! Error types for voxray_io operations.
//!
//! Every artifact error names the file it came from so a failed startup points
//! straight at the offending calibration or chunk.

use std::path::{Path, PathBuf};

use thiserror::Error;
use voxray_core::CoreError;

/// Errors that can occur while building the map or loading artifacts.
#[derive(Error, Debug)]
pub enum IoError {
    /// Underlying filesystem failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Original error.
        #[source]
        source: std::io::Error,
    },

    /// Content does not follow the expected layout.
    #[error("invalid format in {}: {message}", .path.display())]
    InvalidFormat {
        /// Offending file.
        path: PathBuf,
        /// Description of the format error.
        message: String,
    },

    /// Body shorter than the header announces.
    #[error("truncated {}: expected {expected} bytes, got {got}", .path.display())]
    Truncated {
        /// Offending file.
        path: PathBuf,
        /// Bytes required by the header.
        expected: usize,
        /// Bytes available.
        got: usize,
    },

    /// Matrix shape differs from what the artifact kind requires.
    #[error("dimension mismatch in {}: expected {expected}, got {got}", .path.display())]
    DimensionMismatch {
        /// Offending file.
        path: PathBuf,
        /// Required shape.
        expected: String,
        /// Shape found.
        got: String,
    },

    /// Text artifact line that could not be parsed.
    #[error("parse error in {} line {line}: {message}", .path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Storage configuration rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Error from the math layer.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IoError {
    /// Wrap a `std::io::Error` with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        IoError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build an [`IoError::InvalidFormat`].
    pub fn invalid_format(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        IoError::InvalidFormat {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Build an [`IoError::Parse`].
    pub fn parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        IoError::Parse {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for voxray_io operations.
pub type Result<T> = std::result::Result<T, IoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_path() {
        let err = IoError::invalid_format("luts/rays.bin", "negative row count");
        assert_eq!(
            format!("{}", err),
            "invalid format in luts/rays.bin: negative row count"
        );

        let err = IoError::parse("rect.txt", 7, "expected 4 integers");
        assert_eq!(
            format!("{}", err),
            "parse error in rect.txt line 7: expected 4 integers"
        );
    }

    #[test]
    fn test_core_error_converts() {
        let err: IoError = CoreError::InvalidResolution { value: 0.0 }.into();
        assert!(matches!(err, IoError::Core(_)));
    }
}
