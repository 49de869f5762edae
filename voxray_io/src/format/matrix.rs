//! Dense `f64` matrix and its binary/text encodings.
//!
//! # Binary layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ HEADER (16 bytes)                            │
//! │  0-7:   rows (i64 LE)                        │
//! │  8-15:  cols (i64 LE)                        │
//! ├──────────────────────────────────────────────┤
//! │ BODY (rows * cols * 8 bytes)                 │
//! │  For each row, for each column: f64 LE       │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Files must end exactly after the body; trailing bytes are rejected.
//!
//! # Text layout
//!
//! One matrix row per line, values separated by whitespace. Blank lines and
//! lines starting with `#` are skipped. Every row must have the same width.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use super::header::{encoded_size, MatrixHeader, ELEMENT_SIZE, HEADER_SIZE};
use crate::error::{IoError, Result};

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major data. Returns `None` when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols) == Some(data.len())).then_some(Self { rows, cols, data })
    }

    /// Build a matrix from a closure `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major element slice.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Element at `(row, col)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Overwrite the element at `(row, col)`. Returns `false` when out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] = value;
            true
        } else {
            false
        }
    }

    /// One row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact(0) panics, and a zero-width matrix has no row content anyway
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Matrix {
        Matrix::from_fn(self.cols, self.rows, |r, c| self.data[c * self.cols + r])
    }
}

/// Encode a matrix into the binary layout.
pub fn encode_matrix(matrix: &Matrix) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(encoded_size(matrix.rows, matrix.cols));
    bytes.extend_from_slice(&MatrixHeader::new(matrix.rows, matrix.cols).to_bytes());
    for value in &matrix.data {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a complete binary matrix. `path` is only used for error messages.
pub fn decode_matrix(bytes: &[u8], path: &Path) -> Result<Matrix> {
    let header_bytes: &[u8; HEADER_SIZE] = bytes
        .get(..HEADER_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or_else(|| IoError::Truncated {
            path: path.to_path_buf(),
            expected: HEADER_SIZE,
            got: bytes.len(),
        })?;

    let (rows, cols) = MatrixHeader::from_bytes(header_bytes).dims(path)?;
    let expected = encoded_size(rows, cols);
    if bytes.len() < expected {
        return Err(IoError::Truncated {
            path: path.to_path_buf(),
            expected,
            got: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(IoError::invalid_format(
            path,
            format!("{} trailing bytes after matrix body", bytes.len() - expected),
        ));
    }

    let data = bytes[HEADER_SIZE..]
        .chunks_exact(ELEMENT_SIZE)
        .map(|chunk| {
            let mut raw = [0u8; ELEMENT_SIZE];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect();

    Ok(Matrix { rows, cols, data })
}

/// Read a binary matrix from a reader, consuming it to the end.
pub fn read_matrix<R: Read>(reader: &mut R, path: &Path) -> Result<Matrix> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| IoError::io(path, e))?;
    decode_matrix(&bytes, path)
}

/// Write a binary matrix to a writer.
pub fn write_matrix<W: Write>(matrix: &Matrix, writer: &mut W, path: &Path) -> Result<()> {
    writer
        .write_all(&encode_matrix(matrix))
        .map_err(|e| IoError::io(path, e))
}

/// Load a binary matrix file.
pub fn load_matrix(path: impl AsRef<Path>) -> Result<Matrix> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IoError::io(path, e))?;
    let matrix = decode_matrix(&bytes, path)?;
    log::debug!(
        "loaded matrix {} ({}x{})",
        path.display(),
        matrix.rows,
        matrix.cols
    );
    Ok(matrix)
}

/// Save a matrix as a binary file, replacing any existing file.
pub fn save_matrix(path: impl AsRef<Path>, matrix: &Matrix) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| IoError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_matrix(matrix, &mut writer, path)?;
    writer.flush().map_err(|e| IoError::io(path, e))
}

/// Parse a whitespace-separated text matrix.
pub fn parse_text_matrix(text: &str, path: &Path) -> Result<Matrix> {
    let mut cols = None;
    let mut rows = 0;
    let mut data = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let before = data.len();
        for token in line.split_whitespace() {
            let value: f64 = token
                .parse()
                .map_err(|_| IoError::parse(path, idx + 1, format!("invalid number '{}'", token)))?;
            data.push(value);
        }
        let width = data.len() - before;

        match cols {
            None => cols = Some(width),
            Some(expected) if expected != width => {
                return Err(IoError::parse(
                    path,
                    idx + 1,
                    format!("expected {} values, found {}", expected, width),
                ));
            }
            Some(_) => {}
        }
        rows += 1;
    }

    Ok(Matrix {
        rows,
        cols: cols.unwrap_or(0),
        data,
    })
}

/// Load a whitespace-separated text matrix file.
pub fn load_text_matrix(path: impl AsRef<Path>) -> Result<Matrix> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| IoError::io(path, e))?;
    parse_text_matrix(&text, path)
}
