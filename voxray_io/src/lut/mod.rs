//! Calibration lookup tables.
//!
//! - `Grid2<T>`: dense bounds-checked 2D grid backing every table
//! - `RayLut`: per-pixel camera rays
//! - `RemapTable`: rectified ↔ raw pixel correspondence

pub mod grid2;
pub mod rays;
pub mod remap;

pub use grid2::Grid2;
pub use rays::{RayLut, RAY_LUT_COLS};
pub use remap::RemapTable;
