//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph and the
//! collision pipeline. Everything is `f32` and built on nalgebra.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Position, rotation and scale of a node, either local or world space.
///
/// Composition follows the scene graph's additive rule: a child's world
/// position is its parent's world position plus its local position, world
/// rotation is `parent * local` and world scale is the component-wise product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Compose a child's local transform onto this (parent world) transform.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + local.position,
            rotation: self.rotation * local.rotation,
            scale: self.scale.component_mul(&local.scale),
        }
    }

    /// Apply this transform's rotation and scale to a local offset.
    pub fn transform_offset(&self, offset: Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(&offset)
    }

    /// Largest absolute scale factor, used to scale radii conservatively.
    pub fn max_scale(&self) -> f32 {
        self.scale.x.abs().max(self.scale.y.abs()).max(self.scale.z.abs())
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Tolerance below which a length is treated as zero
    pub const EPSILON: f32 = 1e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Quat, Unit, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Rotation of `angle` radians about `axis`; a zero axis yields identity.
    pub fn axis_angle(axis: Vec3, angle: f32) -> Quat {
        if axis.magnitude_squared() <= constants::EPSILON {
            return Quat::identity();
        }
        Quat::from_axis_angle(&Unit::new_normalize(axis), angle)
    }

    /// Right-handed perspective projection with depth mapped to `[0, 1]`.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }
}
