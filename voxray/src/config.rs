//! Unified configuration loaded from a single TOML file.
//!
//! Every section falls back to its defaults, so an empty file (or no file at
//! all, via [`VoxrayConfig::default`]) is a valid configuration.
//!
//! ## Configuration Sections
//!
//! | Section | Description |
//! |---------|-------------|
//! | [`MapSection`] | Resolution, sharding, frame offset, default label |
//! | [`SensorSection`] | Sensor size and mask orientation |
//! | [`RaycastSection`] | March step, range, region of interest |
//! | [`PathsSection`] | Calibration artifacts and dataset location |
//!
//! ## Example TOML
//!
//! ```toml
//! [map]
//! resolution = 0.1
//! shards = 64
//! concurrent = true
//! frame_offset = [679919.953, 4931904.674, 89.178]
//! default_label = 0
//!
//! [sensor]
//! rows = 2048
//! cols = 2448
//! mask_orientation = "row_flip_transpose"
//!
//! [raycast]
//! step = 0.1
//! max_range = 50.0
//! roi_half_extent = 300      # 0 casts the whole sensor
//! normalize_directions = false
//!
//! [paths]
//! ray_lut = "raysLut.bin"    # ".txt" selects the text loader
//! rectify_lut = "unrectifyLut.txt"
//! dataset_dir = "chunks"
//! chunk_tag = "DUCATI"
//! chunk_extension = ".bin"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxray_core::{Label, Point3};
use voxray_io::MapConfig;

use crate::error::Result;
use crate::frame::{MaskOrientation, PixelRegion};
use crate::integrator::VoxelIntegrator;
use crate::raycast::RayCaster;

/// Configuration load error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Original error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error.
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but are inconsistent.
    #[error("invalid config: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

/// Full voxray configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct VoxrayConfig {
    /// Voxel map settings.
    #[serde(default)]
    pub map: MapSection,

    /// Sensor geometry.
    #[serde(default)]
    pub sensor: SensorSection,

    /// Ray casting settings.
    #[serde(default)]
    pub raycast: RaycastSection,

    /// Artifact locations.
    #[serde(default)]
    pub paths: PathsSection,
}

/// Voxel map section.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapSection {
    /// Voxel edge length (meters).
    pub resolution: f64,
    /// Lock shard count (power of two).
    pub shards: usize,
    /// Integrate batches on the rayon pool.
    pub concurrent: bool,
    /// Subtracted from every raw point before voxelisation.
    pub frame_offset: Point3,
    /// Label used for points that carry none.
    pub default_label: Label,
}

impl Default for MapSection {
    fn default() -> Self {
        Self {
            resolution: 0.1,
            shards: 64,
            concurrent: true,
            frame_offset: Point3::new(679919.953, 4931904.674, 89.178),
            default_label: 0,
        }
    }
}

/// How mask images are laid out relative to the ray table.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrientationSetting {
    /// Same indexing as the ray table.
    Direct,
    /// Sensor mounted rotated: see [`MaskOrientation::RowFlipTranspose`].
    #[default]
    RowFlipTranspose,
}

/// Sensor section.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorSection {
    /// Sensor rows (ray table height).
    pub rows: usize,
    /// Sensor columns (ray table width).
    pub cols: usize,
    /// Mask image orientation.
    pub mask_orientation: OrientationSetting,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            rows: 2048,
            cols: 2448,
            mask_orientation: OrientationSetting::RowFlipTranspose,
        }
    }
}

impl SensorSection {
    /// Runtime mask orientation for this sensor.
    pub fn mask_orientation(&self) -> MaskOrientation {
        match self.mask_orientation {
            OrientationSetting::Direct => MaskOrientation::Direct,
            OrientationSetting::RowFlipTranspose => MaskOrientation::RowFlipTranspose {
                sensor_rows: self.rows,
            },
        }
    }
}

/// Ray casting section.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RaycastSection {
    /// Distance between march samples (meters).
    pub step: f64,
    /// Longest distance marched (meters).
    pub max_range: f64,
    /// Half size of the square region cast around the sensor center; 0 casts
    /// the whole sensor.
    pub roi_half_extent: usize,
    /// Normalize ray directions before marching.
    pub normalize_directions: bool,
}

impl Default for RaycastSection {
    fn default() -> Self {
        Self {
            step: 0.1,
            max_range: 50.0,
            roi_half_extent: 300,
            normalize_directions: false,
        }
    }
}

/// Artifact paths section.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsSection {
    /// Ray table (binary matrix, or text when the extension is `.txt`).
    pub ray_lut: PathBuf,
    /// Optional rectification correspondence table.
    pub rectify_lut: Option<PathBuf>,
    /// Root searched recursively for point chunks.
    pub dataset_dir: PathBuf,
    /// Substring a chunk file name must contain.
    pub chunk_tag: String,
    /// Suffix a chunk file name must end with.
    pub chunk_extension: String,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            ray_lut: PathBuf::from("raysLut.bin"),
            rectify_lut: None,
            dataset_dir: PathBuf::from("chunks"),
            chunk_tag: "DUCATI".to_string(),
            chunk_extension: ".bin".to_string(),
        }
    }
}

impl VoxrayConfig {
    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        log::info!("loaded config {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(toml: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.map_config()
            .validate()
            .map_err(|e| ConfigError::invalid(format!("[map] {}", e)))?;
        if !self.map.frame_offset.is_finite() {
            return Err(ConfigError::invalid("[map] frame_offset must be finite"));
        }
        if self.sensor.rows == 0 || self.sensor.cols == 0 {
            return Err(ConfigError::invalid("[sensor] rows and cols must be non-zero"));
        }
        if !(self.raycast.step.is_finite() && self.raycast.step > 0.0) {
            return Err(ConfigError::invalid(format!(
                "[raycast] step must be positive, got {}",
                self.raycast.step
            )));
        }
        if !(self.raycast.max_range.is_finite() && self.raycast.max_range >= 0.0) {
            return Err(ConfigError::invalid(format!(
                "[raycast] max_range must be non-negative, got {}",
                self.raycast.max_range
            )));
        }
        Ok(())
    }

    /// Storage-level map configuration.
    pub fn map_config(&self) -> MapConfig {
        MapConfig::new(self.map.resolution, self.map.shards, self.map.concurrent)
    }

    /// Point integrator for this configuration.
    pub fn integrator(&self) -> VoxelIntegrator {
        VoxelIntegrator::new(self.map.frame_offset, self.map.default_label)
    }

    /// Ray caster for this configuration.
    pub fn ray_caster(&self) -> Result<RayCaster> {
        Ok(RayCaster::new(self.raycast.step, self.raycast.max_range)?
            .normalize_directions(self.raycast.normalize_directions))
    }

    /// Region cast each frame.
    pub fn region(&self) -> PixelRegion {
        let (rows, cols) = (self.sensor.rows, self.sensor.cols);
        match self.raycast.roi_half_extent {
            0 => PixelRegion::full(rows, cols),
            half => PixelRegion::centered(rows, cols, half),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VoxrayConfig::default();
        assert_eq!(config.map.resolution, 0.1);
        assert_eq!(config.sensor.rows, 2048);
        assert_eq!(config.sensor.cols, 2448);
        assert_eq!(config.raycast.max_range, 50.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = VoxrayConfig::from_toml("").unwrap();
        assert_eq!(config, VoxrayConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = VoxrayConfig::from_toml(
            r#"
            [map]
            resolution = 0.2
            frame_offset = [1.0, 2.0, 3.0]

            [sensor]
            mask_orientation = "direct"

            [paths]
            rectify_lut = "unrectifyLut.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.map.resolution, 0.2);
        assert_eq!(config.map.shards, 64);
        assert_eq!(config.map.frame_offset, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(config.sensor.mask_orientation(), MaskOrientation::Direct);
        assert_eq!(
            config.paths.rectify_lut,
            Some(PathBuf::from("unrectifyLut.txt"))
        );
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = VoxrayConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(VoxrayConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            VoxrayConfig::from_toml("[map]\nresolution = 0.0\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            VoxrayConfig::from_toml("[map]\nshards = 3\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            VoxrayConfig::from_toml("[raycast]\nstep = -0.1\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            VoxrayConfig::from_toml("[map]\nresolution = \"fine\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_region_selection() {
        let mut config = VoxrayConfig::default();
        let roi = config.region();
        assert_eq!(roi.height(), 600);
        assert_eq!(roi.width(), 600);

        config.raycast.roi_half_extent = 0;
        assert_eq!(config.region(), PixelRegion::full(2048, 2448));
    }

    #[test]
    fn test_row_flip_orientation_uses_sensor_rows() {
        let config = VoxrayConfig::default();
        assert_eq!(
            config.sensor.mask_orientation(),
            MaskOrientation::RowFlipTranspose { sensor_rows: 2048 }
        );
    }
}
