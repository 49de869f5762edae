//! Rigid camera pose (camera-local frame → map frame).

use crate::error::{CoreError, Result};
use crate::types::{Point3, Ray};

/// Tolerance used when checking the homogeneous row of a 4x4 transform.
const HOMOGENEOUS_EPS: f64 = 1e-9;

/// Rotation plus translation mapping camera-local coordinates to the map frame.
///
/// `rotation` is row-major: `rotation[r][c]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraPose {
    /// 3x3 rotation, row-major.
    pub rotation: [[f64; 3]; 3],
    /// Translation applied after rotation.
    pub translation: Point3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CameraPose {
    /// The identity transform.
    pub const IDENTITY: CameraPose = CameraPose {
        rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        translation: Point3::ZERO,
    };

    /// Create a pose from its parts.
    #[inline]
    pub const fn new(rotation: [[f64; 3]; 3], translation: Point3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pure translation.
    #[inline]
    pub const fn from_translation(translation: Point3) -> Self {
        Self {
            rotation: Self::IDENTITY.rotation,
            translation,
        }
    }

    /// Build a pose from a row-major 4x4 homogeneous matrix.
    ///
    /// Fails when any entry is non-finite or the last row is not `0 0 0 1`.
    pub fn from_matrix4(m: &[f64; 16]) -> Result<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::NonFinite {
                context: "pose matrix",
            });
        }
        let last = [m[12], m[13], m[14], m[15]];
        let expected = [0.0, 0.0, 0.0, 1.0];
        if last
            .iter()
            .zip(expected.iter())
            .any(|(a, b)| (a - b).abs() > HOMOGENEOUS_EPS)
        {
            return Err(CoreError::InvalidTransform {
                message: format!("last row must be [0, 0, 0, 1], got {:?}", last),
            });
        }

        Ok(Self {
            rotation: [
                [m[0], m[1], m[2]],
                [m[4], m[5], m[6]],
                [m[8], m[9], m[10]],
            ],
            translation: Point3::new(m[3], m[7], m[11]),
        })
    }

    /// Row-major 4x4 homogeneous matrix.
    pub fn to_matrix4(&self) -> [f64; 16] {
        let r = &self.rotation;
        let t = self.translation;
        [
            r[0][0], r[0][1], r[0][2], t.x, //
            r[1][0], r[1][1], r[1][2], t.y, //
            r[2][0], r[2][1], r[2][2], t.z, //
            0.0, 0.0, 0.0, 1.0,
        ]
    }

    /// Apply rotation only (for direction vectors).
    #[inline]
    pub fn rotate_vector(&self, v: Point3) -> Point3 {
        let r = &self.rotation;
        Point3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Apply the full transform (for positions).
    #[inline]
    pub fn transform_point(&self, p: Point3) -> Point3 {
        self.rotate_vector(p) + self.translation
    }

    /// Move a camera-frame ray into the map frame.
    #[inline]
    pub fn transform_ray(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.transform_point(ray.origin),
            self.rotate_vector(ray.direction),
        )
    }
}
