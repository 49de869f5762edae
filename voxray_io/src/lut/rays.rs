//! Per-pixel camera ray lookup table.
//!
//! Each calibrated pixel stores a ray (origin + direction) in the camera
//! frame. The table is built once from a calibration artifact and is
//! read-only afterwards.
//!
//! Artifact rows hold 8 values: `pixelRow pixelCol ox oy oz dx dy dz`.

use std::path::Path;

use voxray_core::{Point3, Ray};

use super::grid2::Grid2;
use crate::format::matrix::{load_matrix, load_text_matrix, save_matrix, Matrix};
use crate::error::{IoError, Result};

/// Values per artifact row.
pub const RAY_LUT_COLS: usize = 8;

/// Sensor-sized table of camera rays. Unset pixels hold [`Ray::ZERO`].
#[derive(Debug, Clone, PartialEq)]
pub struct RayLut {
    rays: Grid2<Ray>,
    populated: usize,
}

impl RayLut {
    /// Table built from a closure `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Ray) -> Self {
        let mut rays = Grid2::new(rows, cols, Ray::ZERO);
        let mut populated = 0;
        for r in 0..rows {
            for c in 0..cols {
                let ray = f(r, c);
                if ray != Ray::ZERO {
                    populated += 1;
                }
                rays.set(r, c, ray);
            }
        }
        Self { rays, populated }
    }

    /// Build from an `N x 8` matrix for a `rows x cols` sensor.
    ///
    /// Entries whose pixel lies outside the sensor, whose pixel index is not
    /// a whole number, or whose ray holds non-finite values are skipped and
    /// reported at `warn` level.
    pub fn from_matrix(matrix: &Matrix, rows: usize, cols: usize) -> Result<Self> {
        Self::from_matrix_at(matrix, rows, cols, Path::new("<memory>"))
    }

    fn from_matrix_at(matrix: &Matrix, rows: usize, cols: usize, path: &Path) -> Result<Self> {
        if matrix.cols() != RAY_LUT_COLS {
            return Err(IoError::DimensionMismatch {
                path: path.to_path_buf(),
                expected: format!("N x {}", RAY_LUT_COLS),
                got: format!("{}x{}", matrix.rows(), matrix.cols()),
            });
        }

        let mut rays = Grid2::new(rows, cols, Ray::ZERO);
        let mut ignored = 0usize;

        for entry in matrix.iter_rows() {
            let pixel = pixel_index(entry[0]).zip(pixel_index(entry[1]));
            let ray = Ray::new(
                Point3::new(entry[2], entry[3], entry[4]),
                Point3::new(entry[5], entry[6], entry[7]),
            );
            let accepted = match pixel {
                Some((r, c)) if ray.origin.is_finite() && ray.direction.is_finite() => {
                    rays.set(r, c, ray)
                }
                _ => false,
            };
            if !accepted {
                ignored += 1;
            }
        }

        if ignored > 0 {
            log::warn!(
                "{}: ignored {} ray entries outside the {}x{} sensor or with invalid values",
                path.display(),
                ignored,
                rows,
                cols
            );
        }

        let populated = rays.as_slice().iter().filter(|r| **r != Ray::ZERO).count();
        Ok(Self { rays, populated })
    }

    /// Load a binary ray table.
    pub fn load(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Self> {
        let path = path.as_ref();
        let lut = Self::from_matrix_at(&load_matrix(path)?, rows, cols, path)?;
        log::info!(
            "loaded ray LUT {} ({}x{}, {} rays)",
            path.display(),
            rows,
            cols,
            lut.populated
        );
        Ok(lut)
    }

    /// Load a whitespace text ray table (8 numbers per line).
    pub fn load_text(path: impl AsRef<Path>, rows: usize, cols: usize) -> Result<Self> {
        let path = path.as_ref();
        let matrix = load_text_matrix(path)?;
        let matrix = if matrix.rows() == 0 {
            Matrix::zeros(0, RAY_LUT_COLS)
        } else {
            matrix
        };
        let lut = Self::from_matrix_at(&matrix, rows, cols, path)?;
        log::info!(
            "loaded text ray LUT {} ({}x{}, {} rays)",
            path.display(),
            rows,
            cols,
            lut.populated
        );
        Ok(lut)
    }

    /// Encode populated entries as an `N x 8` matrix, row-major pixel order.
    pub fn to_matrix(&self) -> Matrix {
        let entries: Vec<_> = self
            .rays
            .iter()
            .filter(|(_, ray)| **ray != Ray::ZERO)
            .collect();
        Matrix::from_fn(entries.len(), RAY_LUT_COLS, |i, k| {
            let ((r, c), ray) = entries[i];
            match k {
                0 => r as f64,
                1 => c as f64,
                2 => ray.origin.x,
                3 => ray.origin.y,
                4 => ray.origin.z,
                5 => ray.direction.x,
                6 => ray.direction.y,
                _ => ray.direction.z,
            }
        })
    }

    /// Write the binary artifact.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_matrix(path, &self.to_matrix())
    }

    /// Ray for a pixel; [`Ray::ZERO`] when out of bounds or unset.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Ray {
        self.rays.get(row, col).copied().unwrap_or(Ray::ZERO)
    }

    /// Ray for a pixel, `None` when out of bounds.
    #[inline]
    pub fn try_get(&self, row: usize, col: usize) -> Option<&Ray> {
        self.rays.get(row, col)
    }

    /// Sensor rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rays.rows()
    }

    /// Sensor columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.rays.cols()
    }

    /// Pixels holding anything other than [`Ray::ZERO`]. A calibrated entry
    /// with a zero direction still counts.
    #[inline]
    pub fn populated(&self) -> usize {
        self.populated
    }
}

fn pixel_index(value: f64) -> Option<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 {
        Some(value as usize)
    } else {
        None
    }
}
