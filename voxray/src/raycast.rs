//! Fixed-step ray marching against the voxel map.
//!
//! A ray is moved into the map frame by the camera pose (origin by the full
//! transform, direction by the rotation only) and sampled at
//! `d = k * step` for `k = 0..=floor(max_range / step)`. The first sample
//! whose voxel holds data is the hit. There is no backtracking, so a voxel
//! thinner than the step along the ray can be skipped.

use voxray_core::{voxel_coord, CameraPose, CoreError, Label, Point3, Ray, Voxel3D};
use voxray_io::SparseVoxelMap;

use crate::error::{Result, VoxrayError};

/// Absorbs rounding in `max_range / step` so that e.g. `10.0 / 0.1` still
/// yields the final sample.
const STEP_EPSILON: f64 = 1e-9;

/// First occupied voxel along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The voxel hit, with its real center.
    pub voxel: Voxel3D,
    /// March distance `k * step` of the sample that hit.
    pub distance: f64,
    /// Sample index `k`.
    pub step: usize,
}

impl RayHit {
    /// Euclidean distance from `origin` to the hit voxel's center.
    #[inline]
    pub fn distance_to_center(&self, origin: Point3) -> f64 {
        origin.distance(self.voxel.center)
    }

    /// Heaviest label of the hit voxel.
    #[inline]
    pub fn label(&self) -> Option<Label> {
        self.voxel.label()
    }
}

/// Ray marcher parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCaster {
    step_delta: f64,
    max_range: f64,
    normalize: bool,
}

impl RayCaster {
    /// Create a ray caster.
    ///
    /// Fails when `step_delta` is not strictly positive or `max_range` is
    /// negative (or either is non-finite).
    pub fn new(step_delta: f64, max_range: f64) -> Result<Self> {
        if !(step_delta.is_finite() && step_delta > 0.0) {
            return Err(VoxrayError::invalid_input(format!(
                "step must be positive and finite, got {}",
                step_delta
            )));
        }
        if !(max_range.is_finite() && max_range >= 0.0) {
            return Err(VoxrayError::invalid_input(format!(
                "max range must be non-negative and finite, got {}",
                max_range
            )));
        }
        Ok(Self {
            step_delta,
            max_range,
            normalize: false,
        })
    }

    /// Normalize ray directions before marching. Off by default: directions
    /// are used as stored, so the march distance scales with their length.
    pub fn normalize_directions(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Distance between samples.
    #[inline]
    pub fn step_delta(&self) -> f64 {
        self.step_delta
    }

    /// Longest march distance.
    #[inline]
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Whether directions are normalized.
    #[inline]
    pub fn normalizes_directions(&self) -> bool {
        self.normalize
    }

    /// Index of the last sample.
    #[inline]
    pub fn max_steps(&self) -> usize {
        (self.max_range / self.step_delta + STEP_EPSILON).floor() as usize
    }

    /// Camera-frame ray moved into the map frame, ready to march.
    ///
    /// Returns the degenerate-direction error for a zero direction and
    /// `InvalidInput` when the pose produces non-finite values.
    pub fn world_ray(&self, pose: &CameraPose, ray: &Ray) -> Result<Ray> {
        if ray.is_degenerate() {
            return Err(CoreError::DegenerateDirection.into());
        }
        let world = pose.transform_ray(ray);
        if !world.origin.is_finite() || !world.direction.is_finite() {
            return Err(VoxrayError::invalid_input("non-finite ray after pose transform"));
        }
        if world.is_degenerate() {
            return Err(CoreError::DegenerateDirection.into());
        }
        let direction = if self.normalize {
            world.direction.normalize()
        } else {
            world.direction
        };
        Ok(Ray::new(world.origin, direction))
    }

    /// March `ray` (camera frame) through `map` under `pose`.
    ///
    /// `Ok(None)` is a miss. Each distinct voxel along the ray is looked up
    /// once, however many samples fall in it.
    pub fn intersect_voxel(
        &self,
        map: &SparseVoxelMap,
        pose: &CameraPose,
        ray: &Ray,
    ) -> Result<Option<RayHit>> {
        let world = self.world_ray(pose, ray)?;
        let _phase = map.begin_read();
        Ok(self.march(map, &world))
    }

    /// March an already transformed ray. The caller holds the read phase.
    pub(crate) fn march(&self, map: &SparseVoxelMap, world: &Ray) -> Option<RayHit> {
        let resolution = map.resolution();
        let mut last = None;

        for k in 0..=self.max_steps() {
            let distance = k as f64 * self.step_delta;
            let coord = voxel_coord(world.at(distance), resolution);
            if last == Some(coord) {
                continue;
            }
            last = Some(coord);

            if let Some(data) = map.query(coord) {
                return Some(RayHit {
                    voxel: Voxel3D::new(coord, resolution, data),
                    distance,
                    step: k,
                });
            }
        }
        None
    }
}

/// One-shot form of [`RayCaster::intersect_voxel`].
pub fn intersect_voxel(
    map: &SparseVoxelMap,
    pose: &CameraPose,
    ray: &Ray,
    step_delta: f64,
    max_range: f64,
) -> Result<Option<RayHit>> {
    RayCaster::new(step_delta, max_range)?.intersect_voxel(map, pose, ray)
}
