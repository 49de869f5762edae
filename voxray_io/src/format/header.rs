//! Binary matrix header definition.

use std::path::Path;

use crate::error::{IoError, Result};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Size of one matrix element on disk.
pub const ELEMENT_SIZE: usize = 8;

/// Binary matrix header.
///
/// Layout (16 bytes total):
/// - Bytes 0-7: rows (i64 LE)
/// - Bytes 8-15: cols (i64 LE)
///
/// Dimensions are signed on disk; negative values are rejected by
/// [`MatrixHeader::dims`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixHeader {
    /// Row count as stored.
    pub rows: i64,
    /// Column count as stored.
    pub cols: i64,
}

impl MatrixHeader {
    /// Create a header for a `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows as i64,
            cols: cols as i64,
        }
    }

    /// Serialize the header to a byte array.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..8].copy_from_slice(&self.rows.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.cols.to_le_bytes());
        bytes
    }

    /// Deserialize a header from a byte array.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut rows = [0u8; 8];
        let mut cols = [0u8; 8];
        rows.copy_from_slice(&bytes[0..8]);
        cols.copy_from_slice(&bytes[8..16]);
        Self {
            rows: i64::from_le_bytes(rows),
            cols: i64::from_le_bytes(cols),
        }
    }

    /// Validated `(rows, cols)`.
    ///
    /// Fails on negative dimensions or when the encoded size of `rows * cols`
    /// elements plus the header does not fit in memory addressing.
    pub fn dims(&self, path: &Path) -> Result<(usize, usize)> {
        let rows = usize::try_from(self.rows).map_err(|_| {
            IoError::invalid_format(path, format!("negative row count {}", self.rows))
        })?;
        let cols = usize::try_from(self.cols).map_err(|_| {
            IoError::invalid_format(path, format!("negative column count {}", self.cols))
        })?;
        rows.checked_mul(cols)
            .and_then(|n| n.checked_mul(ELEMENT_SIZE))
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or_else(|| {
                IoError::invalid_format(path, format!("matrix {}x{} is too large", rows, cols))
            })?;
        Ok((rows, cols))
    }
}

/// Total encoded size of a `rows x cols` matrix.
///
/// Dimensions read from disk must go through [`MatrixHeader::dims`] first.
pub fn encoded_size(rows: usize, cols: usize) -> usize {
    HEADER_SIZE + rows * cols * ELEMENT_SIZE
}
