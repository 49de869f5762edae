//! Core value types for voxel maps and camera rays.
//!
//! Provides the continuous-space point type, integer voxel and pixel
//! coordinates, per-pixel rays and labelled sensor points.

use core::ops::{Add, Div, Mul, Neg, Sub};

/// Label attached to an observation (semantic class id).
pub type Label = u16;

/// Accumulated evidence count for a label.
pub type Weight = u32;

/// A 3D point (or vector) in double precision.
///
/// Source clouds come in projected geodetic coordinates, so `f64` is used
/// throughout to keep centimetre precision before the frame offset is removed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f64; 3]", into = "[f64; 3]"))]
pub struct Point3 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point3 {
    /// The origin.
    pub const ZERO: Point3 = Point3::new(0.0, 0.0, 0.0);

    /// Create a new Point3.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a Point3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product with another point (treating both as vectors).
    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Squared length of the vector.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Normalize the vector to unit length.
    /// Returns a zero vector if the length is zero.
    #[inline]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// True when all three components are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True when all three components are exactly zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl From<[f64; 3]> for Point3 {
    #[inline]
    fn from(arr: [f64; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }
}

impl From<Point3> for [f64; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        p.as_array()
    }
}

impl From<(f64, f64, f64)> for Point3 {
    #[inline]
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

impl Mul<Point3> for f64 {
    type Output = Point3;

    #[inline]
    fn mul(self, point: Point3) -> Point3 {
        point * self
    }
}

impl Div<f64> for Point3 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f64) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
            z: self.z / scalar,
        }
    }
}

impl Neg for Point3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

/// Integer voxel coordinate (signed, so the map extends in every direction).
///
/// Derived from a position `p` and resolution `R` as `floor(p / R)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelCoord {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: i32,
}

impl VoxelCoord {
    /// Create a new VoxelCoord.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Offset by integer steps along each axis (wrapping at the i32 limits).
    #[inline]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.wrapping_add(dx),
            y: self.y.wrapping_add(dy),
            z: self.z.wrapping_add(dz),
        }
    }
}

impl From<[i32; 3]> for VoxelCoord {
    #[inline]
    fn from(arr: [i32; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }
}

impl From<VoxelCoord> for [i32; 3] {
    #[inline]
    fn from(c: VoxelCoord) -> Self {
        c.as_array()
    }
}

/// A pixel position on the sensor, `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelCoord {
    /// Row (vertical index).
    pub row: usize,
    /// Column (horizontal index).
    pub col: usize,
}

impl PixelCoord {
    /// Create a new PixelCoord.
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A camera ray in the camera's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3,
    /// Ray direction. Not guaranteed to be unit length.
    pub direction: Point3,
}

impl Ray {
    /// Sentinel ray returned for pixels with no calibration entry.
    pub const ZERO: Ray = Ray {
        origin: Point3::ZERO,
        direction: Point3::ZERO,
    };

    /// Create a new Ray.
    #[inline]
    pub const fn new(origin: Point3, direction: Point3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// True for the zero sentinel (or any ray with a zero direction).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction.is_zero()
    }
}

/// A raw sensor sample, optionally labelled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabeledPoint {
    /// Position in the sensor/world frame (before frame offset removal).
    pub position: Point3,
    /// Semantic label, if the source carries one.
    pub label: Option<Label>,
}

impl LabeledPoint {
    /// Create a labelled point.
    #[inline]
    pub const fn new(position: Point3, label: Label) -> Self {
        Self {
            position,
            label: Some(label),
        }
    }

    /// Create a point without a label.
    #[inline]
    pub const fn unlabeled(position: Point3) -> Self {
        Self {
            position,
            label: None,
        }
    }
}
