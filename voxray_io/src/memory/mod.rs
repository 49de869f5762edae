//! In-memory voxel storage.
//!
//! This module provides the map container:
//! - `SparseVoxelMap`: sharded concurrent voxel index
//! - `VoxelIter`: lazy traversal of all stored voxels
//! - `MapStats`: occupancy statistics
//! - `WritePhase` / `ReadPhase`: phase guards

pub mod voxel_map;

pub use voxel_map::{MapStats, ReadPhase, SparseVoxelMap, VoxelIter, WritePhase};
