//! Coordinate mathematics for the sparse voxel map.
//!
//! Maps continuous positions onto integer voxel coordinates and back.

use crate::types::{Point3, VoxelCoord};

/// Compute the voxel coordinate containing a position.
///
/// Uses `floor(p / resolution)` componentwise, so negative positions round
/// toward negative infinity (`-0.05` with resolution `0.1` lands in `-1`).
/// Values outside the `i32` range saturate.
///
/// # Example
/// ```
/// use voxray_core::coords::voxel_coord;
/// use voxray_core::types::{Point3, VoxelCoord};
///
/// let coord = voxel_coord(Point3::new(0.25, -0.05, 1.0), 0.1);
/// assert_eq!(coord, VoxelCoord::new(2, -1, 10));
/// ```
#[inline]
pub fn voxel_coord(point: Point3, resolution: f64) -> VoxelCoord {
    VoxelCoord::new(
        (point.x / resolution).floor() as i32,
        (point.y / resolution).floor() as i32,
        (point.z / resolution).floor() as i32,
    )
}

/// World-space center of a voxel: `(coord + 0.5) * resolution`.
#[inline]
pub fn voxel_center(coord: VoxelCoord, resolution: f64) -> Point3 {
    Point3::new(
        (coord.x as f64 + 0.5) * resolution,
        (coord.y as f64 + 0.5) * resolution,
        (coord.z as f64 + 0.5) * resolution,
    )
}

/// True when both positions fall in the same axis-aligned cell.
#[inline]
pub fn same_voxel(a: Point3, b: Point3, resolution: f64) -> bool {
    voxel_coord(a, resolution) == voxel_coord(b, resolution)
}
