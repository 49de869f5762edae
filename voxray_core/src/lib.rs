//! # voxray_core
//!
//! Pure types and math for sparse label voxel maps queried by per-pixel
//! camera rays.
//!
//! This crate has no I/O and no storage: it defines the value types shared by
//! the storage layer (`voxray_io`) and the runtime (`voxray`).
//!
//! ## Modules
//!
//! - [`types`]: Core data types (Point3, VoxelCoord, PixelCoord, Ray, LabeledPoint)
//! - [`coords`]: Position ↔ voxel coordinate conversion
//! - [`voxel`]: Per-voxel label evidence (VoxelData, Observation, Voxel3D)
//! - [`pose`]: Rigid camera pose
//! - [`hash`]: Morton encoding and shard selection
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```
//! use voxray_core::prelude::*;
//!
//! let coord = voxel_coord(Point3::new(0.05, 0.05, 0.06), 0.1);
//! let mut data = VoxelData::new();
//! data.integrate(Observation::single(1));
//! data.integrate(Observation::single(1));
//! data.integrate(Observation::single(2));
//!
//! assert_eq!(coord, VoxelCoord::new(0, 0, 0));
//! assert_eq!(data.heaviest_label(), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coords;
pub mod error;
pub mod hash;
pub mod pose;
pub mod types;
pub mod voxel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::coords::{same_voxel, voxel_center, voxel_coord};
    pub use crate::error::{validate_resolution, CoreError};
    pub use crate::hash::{morton_encode_signed, shard_index};
    pub use crate::pose::CameraPose;
    pub use crate::types::{Label, LabeledPoint, PixelCoord, Point3, Ray, VoxelCoord, Weight};
    pub use crate::voxel::{Observation, Voxel3D, VoxelData, MAX_LABELS};
}

// Re-export everything at crate root for convenience
pub use coords::{same_voxel, voxel_center, voxel_coord};
pub use error::{validate_resolution, CoreError, Result};
pub use hash::{
    compact_bits_3d, morton_decode_3d, morton_decode_signed, morton_encode_3d,
    morton_encode_signed, shard_index, spread_bits_3d,
};
pub use pose::CameraPose;
pub use types::{Label, LabeledPoint, PixelCoord, Point3, Ray, VoxelCoord, Weight};
pub use voxel::{Observation, Voxel3D, VoxelData, MAX_LABELS};
