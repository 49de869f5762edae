//! # voxray
//!
//! Point integration and per-pixel ray casting against a sparse label voxel
//! map.
//!
//! Labelled points are accumulated into voxels keyed by integer coordinate;
//! afterwards every pixel of a calibrated camera casts its ray through the
//! map and reports the first occupied voxel it meets.
//!
//! - **Integration**: many threads merge observations at once, no update is lost
//! - **Ray casting**: fixed-step marching, one rayon task per pixel
//! - **Calibration**: per-pixel ray table and rectified ↔ raw pixel remap
//!
//! ## Quick Start
//!
//! ```
//! use voxray::{intersect_voxel, VoxelIntegrator};
//! use voxray_core::{CameraPose, LabeledPoint, Point3, Ray};
//! use voxray_io::{MapConfig, SparseVoxelMap};
//!
//! let map = SparseVoxelMap::new(MapConfig::new(0.1, 64, true))?;
//!
//! // Points around z = 5
//! let points: Vec<_> = [4.95, 5.05, 5.15]
//!     .iter()
//!     .map(|&z| LabeledPoint::new(Point3::new(0.05, 0.05, z), 1))
//!     .collect();
//! VoxelIntegrator::default().integrate_batch(&points, &map);
//!
//! // March along +z from z = -5
//! let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Point3::new(0.0, 0.0, 1.0));
//! let hit = intersect_voxel(&map, &CameraPose::IDENTITY, &ray, 0.1, 10.0)?;
//! assert_eq!(hit.and_then(|h| h.label()), Some(1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - `voxray_core`: pure math (coordinates, label evidence, poses, Morton codes)
//! - `voxray_io`: sharded map storage, binary/text artifacts, lookup tables
//! - `voxray` (this crate): integration, ray casting, frame passes,
//!   configuration and the [`MappingSession`] that ties them together
//!
//! ## Phases
//!
//! Integration writes the map and ray casting reads it; the two must not
//! overlap. [`MappingSession`] enforces this through `&mut self` for
//! integration and `&self` for casting. Debug builds additionally assert it
//! at the map level.
//!
//! ## Configuration
//!
//! A whole session is described by one TOML file, see [`config`]:
//!
//! ```no_run
//! use voxray::{MappingSession, VoxrayConfig};
//!
//! let config = VoxrayConfig::load("voxray.toml")?;
//! let mut session = MappingSession::from_config(&config)?;
//! session.integrate_dataset()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod error;
mod frame;
mod integrator;
mod raycast;
mod session;

pub use config::{ConfigError, VoxrayConfig};
pub use error::{Result, VoxrayError};
pub use frame::{
    cast_region, AllValid, MaskOrientation, PixelMask, PixelRegion, RaycastFrame, RgbMask,
};
pub use integrator::{IntegrationReport, VoxelIntegrator};
pub use raycast::{intersect_voxel, RayCaster, RayHit};
pub use session::MappingSession;

// Re-export the types that appear in this crate's signatures
pub use voxray_core::{CameraPose, Label, LabeledPoint, Point3, Ray, Voxel3D, VoxelCoord};
pub use voxray_io::{MapConfig, PointChunk, RayLut, RemapTable, SparseVoxelMap};

/// Prelude module for convenient imports.
///
/// ```
/// use voxray::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::VoxrayConfig;
    pub use crate::error::{Result, VoxrayError};
    pub use crate::frame::{AllValid, PixelMask, PixelRegion, RaycastFrame};
    pub use crate::integrator::{IntegrationReport, VoxelIntegrator};
    pub use crate::raycast::{RayCaster, RayHit};
    pub use crate::session::MappingSession;

    pub use voxray_core::{CameraPose, LabeledPoint, Point3, Ray, VoxelCoord};
}
