//! Point-cloud chunks.
//!
//! A chunk is a batch of points integrated in one write phase. On disk it is
//! a binary matrix with 3 rows (`x y z`) or 4 rows (`x y z label`), one point
//! per column. Text chunks hold one point per line (`x y z label`) and are
//! transposed on load.

use std::fs;
use std::path::{Path, PathBuf};

use voxray_core::{Label, LabeledPoint, Point3};

use super::matrix::{load_matrix, load_text_matrix, save_matrix, Matrix};
use crate::error::{IoError, Result};

/// A batch of sensor points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointChunk {
    points: Vec<LabeledPoint>,
}

impl PointChunk {
    /// Wrap a list of points.
    pub fn new(points: Vec<LabeledPoint>) -> Self {
        Self { points }
    }

    /// Decode from the column-per-point matrix layout.
    ///
    /// Label values that are not a whole number in the `Label` range are
    /// dropped, leaving the point unlabelled.
    pub fn from_matrix(matrix: &Matrix, path: &Path) -> Result<Self> {
        let labeled = match matrix.rows() {
            3 => false,
            4 => true,
            rows => {
                return Err(IoError::DimensionMismatch {
                    path: path.to_path_buf(),
                    expected: "3 or 4 rows".to_string(),
                    got: format!("{}x{}", rows, matrix.cols()),
                })
            }
        };

        let mut dropped_labels = 0usize;
        let points = (0..matrix.cols())
            .map(|c| {
                let at = |r| matrix.get(r, c).unwrap_or(f64::NAN);
                let position = Point3::new(at(0), at(1), at(2));
                let label = if labeled {
                    let label = label_from_f64(at(3));
                    if label.is_none() {
                        dropped_labels += 1;
                    }
                    label
                } else {
                    None
                };
                LabeledPoint { position, label }
            })
            .collect();

        if dropped_labels > 0 {
            log::warn!(
                "{}: {} points carry an invalid label and will use the default",
                path.display(),
                dropped_labels
            );
        }

        Ok(Self { points })
    }

    /// Load a binary chunk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let chunk = Self::from_matrix(&load_matrix(path)?, path)?;
        log::info!("loaded chunk {} ({} points)", path.display(), chunk.len());
        Ok(chunk)
    }

    /// Load a text chunk: one `x y z label` row per point.
    pub fn load_text(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rows = load_text_matrix(path)?;
        if rows.rows() == 0 {
            return Ok(Self::default());
        }
        if rows.cols() != 4 {
            return Err(IoError::DimensionMismatch {
                path: path.to_path_buf(),
                expected: "4 values per line".to_string(),
                got: format!("{} values per line", rows.cols()),
            });
        }
        let chunk = Self::from_matrix(&rows.transpose(), path)?;
        log::info!("loaded text chunk {} ({} points)", path.display(), chunk.len());
        Ok(chunk)
    }

    /// Encode as a matrix: 4 rows when every point carries a label, 3 otherwise.
    pub fn to_matrix(&self) -> Matrix {
        let labeled = !self.points.is_empty() && self.points.iter().all(|p| p.label.is_some());
        let rows = if labeled { 4 } else { 3 };
        Matrix::from_fn(rows, self.points.len(), |r, c| {
            let p = &self.points[c];
            match r {
                0 => p.position.x,
                1 => p.position.y,
                2 => p.position.z,
                _ => p.label.map(f64::from).unwrap_or(0.0),
            }
        })
    }

    /// Write the binary form.
    pub fn write_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        save_matrix(path, &self.to_matrix())
    }

    /// Points in file order.
    #[inline]
    pub fn points(&self) -> &[LabeledPoint] {
        &self.points
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the chunk holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn label_from_f64(value: f64) -> Option<Label> {
    if value.is_finite() && value >= 0.0 && value <= Label::MAX as f64 && value.fract() == 0.0 {
        Some(value as Label)
    } else {
        None
    }
}

/// List chunk files under `dir`, recursively.
///
/// A file matches when its name contains `tag` and ends with `extension`.
/// The result is sorted so chunks replay in a stable order.
pub fn discover_chunks(dir: impl AsRef<Path>, tag: &str, extension: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(dir.as_ref(), tag, extension, &mut found)?;
    found.sort();
    log::info!(
        "discovered {} chunks in {}",
        found.len(),
        dir.as_ref().display()
    );
    Ok(found)
}

fn walk(dir: &Path, tag: &str, extension: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| IoError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| IoError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| IoError::io(&path, e))?;

        if file_type.is_dir() {
            walk(&path, tag, extension, found)?;
        } else if file_type.is_file() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.contains(tag) && name.ends_with(extension) {
                found.push(path);
            }
        }
    }
    Ok(())
}
