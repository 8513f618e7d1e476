// tagvision_core/src/geometry.rs

use nalgebra::{
    Isometry2, Isometry3, Matrix3, Point3, Quaternion, Rotation3, Translation3, UnitQuaternion,
    Vector2, Vector3,
};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::error::{Result, VisionError};

/// Largest deviation from `RᵀR = I` accepted for a user supplied rotation matrix.
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Smallest quaternion norm we are willing to normalize.
const MIN_QUATERNION_NORM: f64 = 1e-9;

// =========================================================================
// == Rigid Transform ==
// =========================================================================

/// An immutable 3-D rigid transform between two coordinate frames.
///
/// Read `a_to_b` as "the pose of frame `b` expressed in frame `a`". Chaining
/// follows the frames: `field_to_tag.compose(&tag_to_camera)` is
/// `field_to_camera`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform(Isometry3<f64>);

/// A field-frame pose is the transform from the field origin to the posed frame.
pub type Pose3 = RigidTransform;

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Isometry3<f64>> for RigidTransform {
    fn from(iso: Isometry3<f64>) -> Self {
        Self(iso)
    }
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }

    /// Builds a transform from parts that are already known to be valid.
    pub fn new(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Self {
        Self(Isometry3::from_parts(Translation3::from(translation), rotation))
    }

    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Roll, pitch and yaw in radians, applied in that order about fixed axes.
    pub fn from_euler(translation: Vector3<f64>, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(translation, UnitQuaternion::from_euler_angles(roll, pitch, yaw))
    }

    /// Validating constructor for translation + rotation pairs coming from config.
    pub fn from_parts(translation: Vector3<f64>, rotation: UnitQuaternion<f64>) -> Result<Self> {
        let transform = Self::new(translation, rotation);
        transform.validate()?;
        Ok(transform)
    }

    /// Builds a transform from a rotation matrix, rejecting anything that is
    /// not a proper rotation.
    pub fn try_from_matrix(rotation: &Matrix3<f64>, translation: Vector3<f64>) -> Result<Self> {
        if rotation.iter().any(|v| !v.is_finite()) {
            return Err(VisionError::degenerate_rotation("non-finite entries"));
        }

        let deviation = (rotation.transpose() * rotation - Matrix3::identity()).amax();
        if deviation > ORTHONORMAL_TOLERANCE {
            return Err(VisionError::degenerate_rotation(format!(
                "not orthonormal (max |RᵀR - I| = {deviation:.3e})"
            )));
        }

        let det = rotation.determinant();
        if det < 0.0 {
            return Err(VisionError::degenerate_rotation(format!(
                "reflection (determinant {det:.3})"
            )));
        }

        let rot = Rotation3::from_matrix_unchecked(*rotation);
        Self::from_parts(translation, UnitQuaternion::from_rotation_matrix(&rot))
    }

    /// Builds a transform from a raw (w, x, y, z) quaternion, normalizing it.
    pub fn try_from_quaternion(
        w: f64,
        x: f64,
        y: f64,
        z: f64,
        translation: Vector3<f64>,
    ) -> Result<Self> {
        let q = Quaternion::new(w, x, y, z);
        let norm = q.norm();
        if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
            return Err(VisionError::InvalidQuaternion { w, x, y, z });
        }
        Self::from_parts(translation, UnitQuaternion::from_quaternion(q))
    }

    /// Checks that every component is finite and the rotation is unit length.
    pub fn validate(&self) -> Result<()> {
        let t = self.0.translation.vector;
        if t.iter().any(|v| !v.is_finite()) {
            return Err(VisionError::NonFiniteTranslation {
                x: t.x,
                y: t.y,
                z: t.z,
            });
        }

        let q = self.0.rotation.quaternion();
        let norm = q.norm();
        if !norm.is_finite() || (norm - 1.0).abs() > ORTHONORMAL_TOLERANCE {
            return Err(VisionError::InvalidQuaternion {
                w: q.w,
                x: q.i,
                y: q.j,
                z: q.k,
            });
        }
        Ok(())
    }

    // --- Composition ---

    /// Chains `other` onto `self`: if `self` is `a_to_b` and `other` is
    /// `b_to_c`, the result is `a_to_c`.
    pub fn compose(&self, other: &RigidTransform) -> RigidTransform {
        let iso = self.0 * other.0;
        // Re-project the rotation so long chains stay on the unit sphere.
        let rotation = UnitQuaternion::new_normalize(iso.rotation.into_inner());
        Self(Isometry3::from_parts(iso.translation, rotation))
    }

    pub fn inverse(&self) -> RigidTransform {
        Self(self.0.inverse())
    }

    // --- Accessors ---

    pub fn translation(&self) -> Vector3<f64> {
        self.0.translation.vector
    }

    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.0.rotation
    }

    pub fn as_isometry(&self) -> &Isometry3<f64> {
        &self.0
    }

    /// Straight-line distance between the two frame origins.
    pub fn translation_norm(&self) -> f64 {
        self.0.translation.vector.norm()
    }

    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.0.transform_point(point)
    }

    /// Projects onto the ground plane: keeps x, y and the yaw angle.
    pub fn to_isometry2(&self) -> Isometry2<f64> {
        let (_, _, yaw) = self.0.rotation.euler_angles();
        let t = self.0.translation.vector;
        Isometry2::new(Vector2::new(t.x, t.y), yaw)
    }

    /// True when the origins agree within `epsilon` meters and the rotations
    /// within `epsilon` in chordal quaternion distance (about half the angle).
    pub fn approx_eq(&self, other: &RigidTransform, epsilon: f64) -> bool {
        let dt = (self.translation() - other.translation()).norm();
        let (a, b) = (&self.0.rotation.coords, &other.0.rotation.coords);
        // q and -q are the same rotation.
        let dr = (a - b).norm().min((a + b).norm());
        dt <= epsilon && dr <= epsilon
    }
}

impl Mul for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        self.compose(&rhs)
    }
}

// =========================================================================
// == Camera Mount ==
// =========================================================================

/// The fixed robot→camera transform. Validated once at construction; the
/// inverse used by every estimate is cached alongside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMount {
    robot_to_camera: RigidTransform,
    camera_to_robot: RigidTransform,
}

impl Default for CameraMount {
    fn default() -> Self {
        Self::identity()
    }
}

impl CameraMount {
    pub fn new(robot_to_camera: RigidTransform) -> Result<Self> {
        robot_to_camera.validate()?;
        Ok(Self {
            robot_to_camera,
            camera_to_robot: robot_to_camera.inverse(),
        })
    }

    /// A camera sitting exactly at the robot origin.
    pub fn identity() -> Self {
        Self {
            robot_to_camera: RigidTransform::identity(),
            camera_to_robot: RigidTransform::identity(),
        }
    }

    pub fn robot_to_camera(&self) -> RigidTransform {
        self.robot_to_camera
    }

    pub fn camera_to_robot(&self) -> RigidTransform {
        self.camera_to_robot
    }
}
