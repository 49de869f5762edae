//! Mapping session: the map together with the calibration it is queried
//! through.
//!
//! Integration takes `&mut self` and frame casting takes `&self`, so a
//! session can never integrate and cast at the same time. The map's own
//! debug phase guards stay in place underneath.

use std::path::Path;

use voxray_core::{CameraPose, LabeledPoint};
use voxray_io::{discover_chunks, PointChunk, RayLut, RemapTable, SparseVoxelMap, VoxelIter};

use crate::config::VoxrayConfig;
use crate::error::{Result, VoxrayError};
use crate::frame::{cast_region, MaskOrientation, PixelMask, PixelRegion, RaycastFrame};
use crate::integrator::{IntegrationReport, VoxelIntegrator};
use crate::raycast::{RayCaster, RayHit};

/// Owns a voxel map, its ray table and the integration/casting settings.
pub struct MappingSession {
    config: VoxrayConfig,
    map: SparseVoxelMap,
    lut: RayLut,
    remap: Option<RemapTable>,
    integrator: VoxelIntegrator,
    caster: RayCaster,
}

impl MappingSession {
    /// Build a session from already loaded calibration.
    ///
    /// Fails when the configuration is invalid or the ray table does not
    /// match the configured sensor size.
    pub fn new(config: &VoxrayConfig, lut: RayLut, remap: Option<RemapTable>) -> Result<Self> {
        config.validate()?;
        let (rows, cols) = (config.sensor.rows, config.sensor.cols);
        if lut.rows() != rows || lut.cols() != cols {
            return Err(VoxrayError::invalid_input(format!(
                "ray table is {}x{}, sensor is {}x{}",
                lut.rows(),
                lut.cols(),
                rows,
                cols
            )));
        }
        if let Some(remap) = &remap {
            if remap.rows() != rows || remap.cols() != cols {
                return Err(VoxrayError::invalid_input(format!(
                    "remap table is {}x{}, sensor is {}x{}",
                    remap.rows(),
                    remap.cols(),
                    rows,
                    cols
                )));
            }
        }

        Ok(Self {
            config: config.clone(),
            map: SparseVoxelMap::new(config.map_config())?,
            lut,
            remap,
            integrator: config.integrator(),
            caster: config.ray_caster()?,
        })
    }

    /// Build a session, loading the ray table and optional remap table from
    /// the configured paths.
    pub fn from_config(config: &VoxrayConfig) -> Result<Self> {
        let (rows, cols) = (config.sensor.rows, config.sensor.cols);
        let lut_path = &config.paths.ray_lut;
        let lut = if is_text(lut_path) {
            RayLut::load_text(lut_path, rows, cols)?
        } else {
            RayLut::load(lut_path, rows, cols)?
        };
        let remap = config
            .paths
            .rectify_lut
            .as_ref()
            .map(|path| RemapTable::load_text(path, rows, cols))
            .transpose()?;
        Self::new(config, lut, remap)
    }

    /// Integrate a batch of raw points.
    pub fn integrate_batch(&mut self, points: &[LabeledPoint]) -> IntegrationReport {
        self.integrator.integrate_batch(points, &self.map)
    }

    /// Integrate every point of a chunk.
    pub fn integrate_chunk(&mut self, chunk: &PointChunk) -> IntegrationReport {
        self.integrator.integrate_chunk(chunk, &self.map)
    }

    /// Load and integrate every chunk found under the configured dataset
    /// directory, in sorted path order.
    pub fn integrate_dataset(&mut self) -> Result<IntegrationReport> {
        let paths = discover_chunks(
            &self.config.paths.dataset_dir,
            &self.config.paths.chunk_tag,
            &self.config.paths.chunk_extension,
        )?;

        let mut total = IntegrationReport::default();
        for path in &paths {
            let chunk = if is_text(path) {
                PointChunk::load_text(path)?
            } else {
                PointChunk::load(path)?
            };
            total += self.integrate_chunk(&chunk);
        }

        log::info!(
            "integrated {} chunks: {} points, {} skipped, {} voxels",
            paths.len(),
            total.integrated,
            total.skipped_non_finite,
            self.map.len()
        );
        Ok(total)
    }

    /// Cast the ray of a single pixel. `Ok(None)` is a miss; a pixel without
    /// a calibrated ray reports the degenerate-direction error.
    pub fn cast_pixel(&self, pose: &CameraPose, row: usize, col: usize) -> Result<Option<RayHit>> {
        self.caster
            .intersect_voxel(&self.map, pose, &self.lut.get(row, col))
    }

    /// Cast every unmasked pixel of `region`.
    pub fn cast_frame<M: PixelMask + ?Sized>(
        &self,
        pose: &CameraPose,
        region: PixelRegion,
        mask: &M,
    ) -> Result<RaycastFrame> {
        cast_region(&self.map, &self.lut, pose, &self.caster, region, mask)
    }

    /// Every voxel currently in the map.
    pub fn voxels(&self) -> VoxelIter<'_> {
        self.map.fetch_all()
    }

    /// The configured region of interest.
    pub fn region(&self) -> PixelRegion {
        self.config.region()
    }

    /// Mask orientation for the configured sensor.
    pub fn mask_orientation(&self) -> MaskOrientation {
        self.config.sensor.mask_orientation()
    }

    /// Underlying map.
    #[inline]
    pub fn map(&self) -> &SparseVoxelMap {
        &self.map
    }

    /// Ray table.
    #[inline]
    pub fn ray_lut(&self) -> &RayLut {
        &self.lut
    }

    /// Rectification table, if one was loaded.
    #[inline]
    pub fn remap(&self) -> Option<&RemapTable> {
        self.remap.as_ref()
    }

    /// Ray caster settings.
    #[inline]
    pub fn caster(&self) -> &RayCaster {
        &self.caster
    }

    /// Configuration the session was built from.
    #[inline]
    pub fn config(&self) -> &VoxrayConfig {
        &self.config
    }
}

fn is_text(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}
