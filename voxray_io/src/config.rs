//! Map configuration types.

use voxray_core::validate_resolution;

use crate::error::{IoError, Result};

/// Storage-level map configuration (immutable after construction, apart
/// from the concurrency flag which the map exposes separately).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Voxel edge length in world units.
    pub resolution: f64,
    /// Number of lock shards. Must be a power of two.
    pub shards: usize,
    /// Whether writers may integrate from several threads at once.
    pub concurrent: bool,
}

impl MapConfig {
    /// Create a new map configuration.
    ///
    /// # Arguments
    /// * `resolution` - Voxel edge length
    /// * `shards` - Lock shard count (power of two)
    /// * `concurrent` - Enable multi-threaded integration
    #[inline]
    pub const fn new(resolution: f64, shards: usize, concurrent: bool) -> Self {
        Self {
            resolution,
            shards,
            concurrent,
        }
    }

    /// Same configuration with a different resolution.
    #[inline]
    pub const fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Check the invariants the map relies on.
    pub fn validate(&self) -> Result<()> {
        validate_resolution(self.resolution)?;
        if self.shards == 0 || !self.shards.is_power_of_two() {
            return Err(IoError::InvalidConfig {
                message: format!("shard count must be a power of two, got {}", self.shards),
            });
        }
        Ok(())
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            shards: 64,
            concurrent: true,
        }
    }
}
