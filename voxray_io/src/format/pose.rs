//! Camera pose text files: 16 whitespace-separated numbers forming a
//! row-major 4x4 homogeneous transform.

use std::path::Path;

use voxray_core::CameraPose;

use crate::error::{IoError, Result};

/// Parse a pose from text.
pub fn parse_pose(text: &str, path: &Path) -> Result<CameraPose> {
    let mut m = [0.0f64; 16];
    let mut count = 0;
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            if count == 16 {
                return Err(IoError::parse(path, idx + 1, "more than 16 values"));
            }
            m[count] = token
                .parse()
                .map_err(|_| IoError::parse(path, idx + 1, format!("invalid number '{}'", token)))?;
            count += 1;
        }
    }
    if count != 16 {
        return Err(IoError::invalid_format(
            path,
            format!("expected 16 values, found {}", count),
        ));
    }
    Ok(CameraPose::from_matrix4(&m)?)
}

/// Load a pose file.
pub fn load_pose(path: impl AsRef<Path>) -> Result<CameraPose> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
    parse_pose(&text, path)
}
