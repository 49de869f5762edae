//! Whole-frame ray casting over a pixel region.
//!
//! A frame pass casts one ray per pixel of a [`PixelRegion`], skipping pixels
//! a [`PixelMask`] rejects, and collects the result as plain data in a
//! [`RaycastFrame`]. Rays run on the rayon pool; each writes only its own
//! output slot.

use std::time::Instant;

use rayon::prelude::*;
use voxray_core::{CameraPose, Voxel3D};
use voxray_io::{Grid2, RayLut, SparseVoxelMap};

use crate::error::Result;
use crate::raycast::RayCaster;

/// Half-open rectangle of sensor pixels, `[row_start, row_end) x [col_start, col_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRegion {
    /// First row.
    pub row_start: usize,
    /// One past the last row.
    pub row_end: usize,
    /// First column.
    pub col_start: usize,
    /// One past the last column.
    pub col_end: usize,
}

impl PixelRegion {
    /// Region clamped to a `rows x cols` sensor. Inverted bounds give an
    /// empty region.
    pub fn new(
        rows: usize,
        cols: usize,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> Self {
        let row_end = row_end.min(rows);
        let col_end = col_end.min(cols);
        Self {
            row_start: row_start.min(row_end),
            row_end,
            col_start: col_start.min(col_end),
            col_end,
        }
    }

    /// The whole sensor.
    pub fn full(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols, 0, rows, 0, cols)
    }

    /// Square of `2 * half_extent` pixels around the sensor center.
    pub fn centered(rows: usize, cols: usize, half_extent: usize) -> Self {
        let (center_row, center_col) = (rows / 2, cols / 2);
        Self::new(
            rows,
            cols,
            center_row.saturating_sub(half_extent),
            center_row.saturating_add(half_extent),
            center_col.saturating_sub(half_extent),
            center_col.saturating_add(half_extent),
        )
    }

    /// Rows covered.
    #[inline]
    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }

    /// Columns covered.
    #[inline]
    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    /// Pixel count.
    #[inline]
    pub fn len(&self) -> usize {
        self.height() * self.width()
    }

    /// True when the region holds no pixel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `(row, col)` lies inside the region.
    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_start..self.row_end).contains(&row) && (self.col_start..self.col_end).contains(&col)
    }

    /// Pixel at row-major position `index`.
    #[inline]
    pub fn pixel(&self, index: usize) -> (usize, usize) {
        let width = self.width().max(1);
        (self.row_start + index / width, self.col_start + index % width)
    }

    /// Row-major position of `(row, col)`, `None` outside the region.
    #[inline]
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        self.contains(row, col)
            .then(|| (row - self.row_start) * self.width() + (col - self.col_start))
    }

    /// Pixels in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.len()).map(move |i| self.pixel(i))
    }
}

/// Decides which sensor pixels are cast.
pub trait PixelMask: Sync {
    /// True when the ray of `(row, col)` should be cast.
    fn is_valid(&self, row: usize, col: usize) -> bool;
}

impl<F> PixelMask for F
where
    F: Fn(usize, usize) -> bool + Sync,
{
    #[inline]
    fn is_valid(&self, row: usize, col: usize) -> bool {
        self(row, col)
    }
}

/// Mask accepting every pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllValid;

impl PixelMask for AllValid {
    #[inline]
    fn is_valid(&self, _row: usize, _col: usize) -> bool {
        true
    }
}

/// Layout of a mask image relative to the ray table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskOrientation {
    /// Mask pixel `(r, c)` belongs to ray `(r, c)`.
    Direct,
    /// Rotated sensor mount: ray `(r, c)` reads mask pixel
    /// `(c, sensor_rows - r)`.
    RowFlipTranspose {
        /// Ray table height.
        sensor_rows: usize,
    },
}

impl MaskOrientation {
    /// Mask image pixel for ray pixel `(row, col)`.
    #[inline]
    pub fn apply(&self, row: usize, col: usize) -> Option<(usize, usize)> {
        match *self {
            MaskOrientation::Direct => Some((row, col)),
            MaskOrientation::RowFlipTranspose { sensor_rows } => {
                Some((col, sensor_rows.checked_sub(row)?))
            }
        }
    }

    /// Ray pixel for mask image pixel `(image_row, image_col)`.
    #[inline]
    pub fn invert(&self, image_row: usize, image_col: usize) -> Option<(usize, usize)> {
        match *self {
            MaskOrientation::Direct => Some((image_row, image_col)),
            MaskOrientation::RowFlipTranspose { sensor_rows } => {
                Some((sensor_rows.checked_sub(image_col)?, image_row))
            }
        }
    }
}

/// RGB validity image. Pure black marks an invalid pixel; lookups falling
/// outside the image are invalid too.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbMask {
    image: Grid2<[u8; 3]>,
    orientation: MaskOrientation,
}

impl RgbMask {
    /// Wrap a decoded image.
    pub fn new(image: Grid2<[u8; 3]>, orientation: MaskOrientation) -> Self {
        Self { image, orientation }
    }

    /// Image accessor.
    #[inline]
    pub fn image(&self) -> &Grid2<[u8; 3]> {
        &self.image
    }

    /// Orientation used for lookups.
    #[inline]
    pub fn orientation(&self) -> MaskOrientation {
        self.orientation
    }
}

impl PixelMask for RgbMask {
    fn is_valid(&self, row: usize, col: usize) -> bool {
        self.orientation
            .apply(row, col)
            .and_then(|(r, c)| self.image.get(r, c))
            .is_some_and(|px| *px != [0, 0, 0])
    }
}

/// Result of one frame pass: one slot per region pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastFrame {
    /// Pixels cast.
    pub region: PixelRegion,
    /// Hit voxel per pixel; [`Voxel3D::empty`] for misses and masked pixels.
    pub voxels: Vec<Voxel3D>,
    /// Distance from the ray origin (map frame) to the hit voxel's center.
    pub distances: Vec<Option<f64>>,
    /// Pixels that hit a voxel.
    pub hits: usize,
    /// Pixels not cast: rejected by the mask or without a calibrated ray.
    pub skipped: usize,
}

impl RaycastFrame {
    /// Voxel at sensor pixel `(row, col)`, `None` outside the region.
    pub fn voxel_at(&self, row: usize, col: usize) -> Option<&Voxel3D> {
        self.voxels.get(self.region.index_of(row, col)?)
    }

    /// Pixels whose ray was marched (hit or miss).
    #[inline]
    pub fn cast(&self) -> usize {
        self.voxels.len() - self.skipped
    }

    /// Hits with their pixel, row-major.
    pub fn hit_voxels(&self) -> impl Iterator<Item = ((usize, usize), &Voxel3D)> + '_ {
        self.voxels
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(move |(i, v)| (self.region.pixel(i), v))
    }

    /// Distances divided by `max_range`, clamped to `[0, 1]`.
    pub fn depth_normalized(&self, max_range: f64) -> Vec<Option<f64>> {
        self.distances
            .iter()
            .map(|d| {
                d.map(|d| {
                    if max_range > 0.0 {
                        (d / max_range).clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                })
            })
            .collect()
    }

    /// 8-bit depth image; misses are 0.
    pub fn depth_bytes(&self, max_range: f64) -> Grid2<u8> {
        let data = self
            .depth_normalized(max_range)
            .into_iter()
            .map(|d| d.map_or(0, |d| (d * 255.0).round() as u8))
            .collect();
        Grid2::from_vec(self.region.height(), self.region.width(), data)
            .unwrap_or_else(|| Grid2::new(0, 0, 0))
    }
}

enum Slot {
    Skipped,
    Miss,
    Hit(Voxel3D, f64),
}

/// Cast every unmasked pixel of `region`.
///
/// Pixels without a calibrated ray count as skipped. Any other ray error
/// aborts the pass.
pub fn cast_region<M: PixelMask + ?Sized>(
    map: &SparseVoxelMap,
    lut: &RayLut,
    pose: &CameraPose,
    caster: &RayCaster,
    region: PixelRegion,
    mask: &M,
) -> Result<RaycastFrame> {
    let _phase = map.begin_read();
    let start = Instant::now();

    let slots = (0..region.len())
        .into_par_iter()
        .map(|i| -> Result<Slot> {
            let (row, col) = region.pixel(i);
            if !mask.is_valid(row, col) {
                return Ok(Slot::Skipped);
            }
            let ray = lut.get(row, col);
            if ray.is_degenerate() {
                return Ok(Slot::Skipped);
            }
            let world = caster.world_ray(pose, &ray)?;
            Ok(match caster.march(map, &world) {
                Some(hit) => Slot::Hit(hit.voxel, hit.distance_to_center(world.origin)),
                None => Slot::Miss,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut frame = RaycastFrame {
        region,
        voxels: Vec::with_capacity(slots.len()),
        distances: Vec::with_capacity(slots.len()),
        hits: 0,
        skipped: 0,
    };
    for slot in slots {
        let (voxel, distance) = match slot {
            Slot::Skipped => {
                frame.skipped += 1;
                (Voxel3D::empty(), None)
            }
            Slot::Miss => (Voxel3D::empty(), None),
            Slot::Hit(voxel, distance) => {
                frame.hits += 1;
                (voxel, Some(distance))
            }
        };
        frame.voxels.push(voxel);
        frame.distances.push(distance);
    }

    log::info!(
        "cast {}x{} region in {:.1} ms: {} hits, {} skipped",
        region.height(),
        region.width(),
        start.elapsed().as_secs_f64() * 1000.0,
        frame.hits,
        frame.skipped
    );

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use voxray_core::{Observation, Point3, Ray};
    use voxray_io::MapConfig;

    fn wall_map() -> SparseVoxelMap {
        let map = SparseVoxelMap::new(MapConfig::new(0.1, 8, true)).unwrap();
        // A wall at z = 2 covering x, y in [0, 0.4).
        for x in 0..4 {
            for y in 0..4 {
                map.integrate(voxray_core::VoxelCoord::new(x, y, 20), Observation::single(5));
            }
        }
        map
    }

    /// Parallel rays along +z, one per pixel, spaced one voxel apart.
    fn parallel_lut(rows: usize, cols: usize) -> RayLut {
        RayLut::from_fn(rows, cols, |r, c| {
            Ray::new(
                Point3::new(0.05 + 0.1 * c as f64, 0.05 + 0.1 * r as f64, 0.05),
                Point3::new(0.0, 0.0, 1.0),
            )
        })
    }

    #[test]
    fn test_region_centered_and_clamped() {
        let roi = PixelRegion::centered(2048, 2448, 300);
        assert_eq!(roi.row_start, 724);
        assert_eq!(roi.row_end, 1324);
        assert_eq!(roi.col_start, 924);
        assert_eq!(roi.col_end, 1524);
        assert_eq!(roi.len(), 360_000);

        let small = PixelRegion::centered(10, 8, 300);
        assert_eq!(small, PixelRegion::full(10, 8));

        let inverted = PixelRegion::new(10, 10, 8, 2, 0, 10);
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_region_indexing() {
        let roi = PixelRegion::new(10, 10, 2, 4, 5, 8);
        let pixels: Vec<_> = roi.iter().collect();
        assert_eq!(pixels.len(), 6);
        assert_eq!(pixels[0], (2, 5));
        assert_eq!(pixels[3], (3, 5));
        assert_eq!(roi.index_of(3, 7), Some(5));
        assert_eq!(roi.index_of(4, 7), None);
        assert!(!roi.contains(2, 8));
    }

    #[test]
    fn test_orientation_mapping() {
        let o = MaskOrientation::RowFlipTranspose { sensor_rows: 2048 };
        assert_eq!(o.apply(48, 7), Some((7, 2000)));
        assert_eq!(o.invert(7, 2000), Some((48, 7)));
        assert_eq!(o.apply(3000, 0), None);
        assert_eq!(MaskOrientation::Direct.apply(4, 5), Some((4, 5)));
    }

    #[test]
    fn test_rgb_mask() {
        let mut image = Grid2::new(4, 4, [255u8, 255, 255]);
        image.set(1, 2, [0, 0, 0]);
        let direct = RgbMask::new(image.clone(), MaskOrientation::Direct);
        assert!(!direct.is_valid(1, 2));
        assert!(direct.is_valid(2, 1));
        assert!(!direct.is_valid(9, 9));

        let rotated = RgbMask::new(image, MaskOrientation::RowFlipTranspose { sensor_rows: 4 });
        // ray (2, 1) reads image (1, 2)
        assert!(!rotated.is_valid(2, 1));
        // ray (0, 0) reads image column 4, outside the image
        assert!(!rotated.is_valid(0, 0));
        assert!(rotated.is_valid(1, 1));
    }

    #[test]
    fn test_cast_region_hits_wall() {
        let map = wall_map();
        let lut = parallel_lut(6, 6);
        let caster = RayCaster::new(0.1, 5.0).unwrap();
        let frame = cast_region(
            &map,
            &lut,
            &CameraPose::IDENTITY,
            &caster,
            PixelRegion::full(6, 6),
            &AllValid,
        )
        .unwrap();

        assert_eq!(frame.voxels.len(), 36);
        assert_eq!(frame.hits, 16);
        assert_eq!(frame.skipped, 0);
        assert_eq!(frame.cast(), 36);
        assert_eq!(frame.voxel_at(1, 2).unwrap().label(), Some(5));
        assert!(frame.voxel_at(5, 5).unwrap().is_empty());
        assert_relative_eq!(frame.distances[0].unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(frame.hit_voxels().count(), 16);
        assert!(frame.hit_voxels().all(|((r, c), _)| r < 4 && c < 4));
    }

    #[test]
    fn test_cast_region_respects_mask() {
        let map = wall_map();
        let lut = parallel_lut(4, 4);
        let caster = RayCaster::new(0.1, 5.0).unwrap();
        let frame = cast_region(
            &map,
            &lut,
            &CameraPose::IDENTITY,
            &caster,
            PixelRegion::full(4, 4),
            &|r: usize, _c: usize| r % 2 == 0,
        )
        .unwrap();

        assert_eq!(frame.hits, 8);
        assert_eq!(frame.skipped, 8);
        assert!(frame.voxel_at(1, 0).unwrap().is_empty());
        assert_eq!(frame.distances[4], None);
    }

    #[test]
    fn test_uncalibrated_pixels_are_skipped() {
        let map = wall_map();
        let lut = RayLut::from_fn(2, 2, |r, c| {
            if r == c {
                Ray::new(Point3::new(0.05, 0.05, 0.05), Point3::new(0.0, 0.0, 1.0))
            } else {
                Ray::ZERO
            }
        });
        let caster = RayCaster::new(0.1, 5.0).unwrap();
        let frame = cast_region(
            &map,
            &lut,
            &CameraPose::IDENTITY,
            &caster,
            PixelRegion::full(2, 2),
            &AllValid,
        )
        .unwrap();
        assert_eq!(frame.hits, 2);
        assert_eq!(frame.skipped, 2);
    }

    #[test]
    fn test_non_finite_pose_aborts() {
        let map = wall_map();
        let lut = parallel_lut(2, 2);
        let caster = RayCaster::new(0.1, 5.0).unwrap();
        let pose = CameraPose::from_translation(Point3::new(f64::NAN, 0.0, 0.0));
        let result = cast_region(&map, &lut, &pose, &caster, PixelRegion::full(2, 2), &AllValid);
        assert!(result.is_err());
    }

    #[test]
    fn test_depth_outputs() {
        let map = wall_map();
        let lut = parallel_lut(1, 6);
        let caster = RayCaster::new(0.1, 5.0).unwrap();
        let frame = cast_region(
            &map,
            &lut,
            &CameraPose::IDENTITY,
            &caster,
            PixelRegion::full(1, 6),
            &AllValid,
        )
        .unwrap();

        let depth = frame.depth_normalized(4.0);
        assert_relative_eq!(depth[0].unwrap(), 0.5, epsilon = 1e-9);
        assert_eq!(depth[5], None);
        assert_eq!(frame.depth_normalized(1.0)[0], Some(1.0));

        let bytes = frame.depth_bytes(5.0);
        assert_eq!(bytes.rows(), 1);
        assert_eq!(bytes.cols(), 6);
        assert_eq!(bytes.get(0, 0), Some(&102));
        assert_eq!(bytes.get(0, 5), Some(&0));
    }
}
