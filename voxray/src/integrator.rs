//! Point integration: raw sensor points into voxel label evidence.

use std::ops::AddAssign;
use std::time::Instant;

use rayon::prelude::*;
use voxray_core::{voxel_coord, Label, LabeledPoint, Observation, Point3};
use voxray_io::{PointChunk, SparseVoxelMap};

/// Outcome of one integration batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntegrationReport {
    /// Points merged into the map.
    pub integrated: usize,
    /// Points dropped because a coordinate was NaN or infinite.
    pub skipped_non_finite: usize,
}

impl IntegrationReport {
    /// Points seen, integrated or not.
    #[inline]
    pub fn total(&self) -> usize {
        self.integrated + self.skipped_non_finite
    }

    /// Combine with the report of another batch.
    #[inline]
    pub fn merge(&mut self, other: IntegrationReport) {
        self.integrated += other.integrated;
        self.skipped_non_finite += other.skipped_non_finite;
    }
}

impl AddAssign for IntegrationReport {
    fn add_assign(&mut self, other: IntegrationReport) {
        self.merge(other);
    }
}

/// Moves raw points into the map frame and records one observation each.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelIntegrator {
    frame_offset: Point3,
    default_label: Label,
}

impl VoxelIntegrator {
    /// Create an integrator.
    ///
    /// # Arguments
    /// * `frame_offset` - Subtracted from every point before voxelisation
    /// * `default_label` - Used for points without a label
    pub const fn new(frame_offset: Point3, default_label: Label) -> Self {
        Self {
            frame_offset,
            default_label,
        }
    }

    /// Frame offset removed from raw points.
    #[inline]
    pub fn frame_offset(&self) -> Point3 {
        self.frame_offset
    }

    /// Label given to unlabelled points.
    #[inline]
    pub fn default_label(&self) -> Label {
        self.default_label
    }

    /// Integrate a batch of points.
    ///
    /// Runs on the rayon pool when the map is in concurrent mode, otherwise
    /// on the calling thread. Either way the final map contents are the same.
    pub fn integrate_batch(&self, points: &[LabeledPoint], map: &SparseVoxelMap) -> IntegrationReport {
        let _phase = map.begin_write();
        let start = Instant::now();

        let integrated = if map.is_concurrent() {
            points.par_iter().filter(|p| self.integrate_one(p, map)).count()
        } else {
            points.iter().filter(|p| self.integrate_one(p, map)).count()
        };

        let report = IntegrationReport {
            integrated,
            skipped_non_finite: points.len() - integrated,
        };

        if report.skipped_non_finite > 0 {
            log::warn!(
                "skipped {} of {} points with non-finite coordinates",
                report.skipped_non_finite,
                points.len()
            );
        }
        log::info!(
            "integrated {} points in {:.1} ms ({} voxels)",
            report.integrated,
            start.elapsed().as_secs_f64() * 1000.0,
            map.len()
        );

        report
    }

    /// Integrate every point of a chunk.
    pub fn integrate_chunk(&self, chunk: &PointChunk, map: &SparseVoxelMap) -> IntegrationReport {
        self.integrate_batch(chunk.points(), map)
    }

    #[inline]
    fn integrate_one(&self, point: &LabeledPoint, map: &SparseVoxelMap) -> bool {
        let shifted = point.position - self.frame_offset;
        if !shifted.is_finite() {
            return false;
        }
        let label = point.label.unwrap_or(self.default_label);
        map.integrate(voxel_coord(shifted, map.resolution()), Observation::single(label));
        true
    }
}

impl Default for VoxelIntegrator {
    fn default() -> Self {
        Self::new(Point3::ZERO, 0)
    }
}
