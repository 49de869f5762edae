//! voxray_io - storage and calibration artifacts for sparse label voxel maps.
//!
//! This crate provides the data layer for voxray: the concurrent voxel map,
//! the per-pixel lookup tables and the artifact file formats they load from.
//!
//! # Core Types
//!
//! - [`SparseVoxelMap`]: sharded, thread-safe voxel index
//! - [`RayLut`]: per-pixel camera rays, read-only after loading
//! - [`RemapTable`]: rectified ↔ raw pixel correspondence
//! - [`PointChunk`]: batch of sensor points
//! - [`Matrix`]: dense `f64` matrix behind the binary artifact format
//!
//! # Example
//!
//! ```
//! use voxray_io::{MapConfig, SparseVoxelMap};
//! use voxray_core::{Observation, Point3, VoxelCoord};
//!
//! let map = SparseVoxelMap::new(MapConfig::new(0.1, 16, true))?;
//! map.integrate_point(Point3::new(0.05, 0.05, 0.05), Observation::single(1));
//! map.integrate_point(Point3::new(0.05, 0.05, 0.06), Observation::single(1));
//!
//! let data = map.query(VoxelCoord::new(0, 0, 0)).unwrap();
//! assert_eq!(data.weight_of(1), 2);
//! # Ok::<(), voxray_io::IoError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod lut;
pub mod memory;

// Re-export core types from voxray_core
pub use voxray_core::{
    CameraPose, Label, LabeledPoint, Observation, PixelCoord, Point3, Ray, Voxel3D, VoxelCoord,
    VoxelData,
};

// Re-export main types
pub use config::MapConfig;
pub use error::{IoError, Result};
pub use format::{discover_chunks, load_matrix, load_pose, save_matrix, Matrix, PointChunk};
pub use lut::{Grid2, RayLut, RemapTable};
pub use memory::{MapStats, ReadPhase, SparseVoxelMap, VoxelIter, WritePhase};
