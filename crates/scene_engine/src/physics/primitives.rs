//! Primitive collision volumes
//!
//! Axis-aligned boxes for the broad phase. Spheres and oriented boxes for
//! the narrow phase.

use crate::foundation::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Coordinate axis, used to address one projection of the broad phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// X axis
    X = 0,
    /// Y axis
    Y = 1,
    /// Z axis
    Z = 2,
}

impl Axis {
    /// All three axes in index order
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Component index of this axis
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Degenerate box at a single point
    pub fn point(at: Vec3) -> Self {
        Self { min: at, max: at }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Minimum coordinate on `axis`
    pub fn min_on(&self, axis: Axis) -> f32 {
        self.min[axis.index()]
    }

    /// Maximum coordinate on `axis`
    pub fn max_on(&self, axis: Axis) -> f32 {
        self.max[axis.index()]
    }

    /// Whether the projections of the two boxes overlap on `axis`
    pub fn overlaps_on(&self, other: &Self, axis: Axis) -> bool {
        self.min_on(axis) <= other.max_on(axis) && self.max_on(axis) >= other.min_on(axis)
    }

    /// Check if this AABB intersects another AABB
    pub fn intersects(&self, other: &Self) -> bool {
        Axis::ALL.iter().all(|&axis| self.overlaps_on(other, axis))
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Whether `other` lies entirely inside this box
    pub fn contains(&self, other: &Self) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| self.min_on(axis) <= other.min_on(axis) && self.max_on(axis) >= other.max_on(axis))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::point(Vec3::zeros())
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another
    pub fn intersects(&self, other: &Self) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared < radius_sum * radius_sum
    }

    /// Get the penetration depth if intersecting (0.0 if not intersecting)
    pub fn penetration_depth(&self, other: &Self) -> f32 {
        let distance = (self.center - other.center).magnitude();
        (self.radius + other.radius - distance).max(0.0)
    }

    /// Bounding box of the sphere
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_extents(self.center, Vec3::repeat(self.radius))
    }
}

/// Box with its own orientation, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// World-space center
    pub center: Vec3,
    /// World-space orientation
    pub rotation: Quat,
    /// Half size along the box's local axes
    pub half_extents: Vec3,
}

impl OrientedBox {
    /// Create a box from its world pose and half extents
    pub fn new(center: Vec3, rotation: Quat, half_extents: Vec3) -> Self {
        Self {
            center,
            rotation,
            half_extents: half_extents.abs(),
        }
    }

    /// Express a world point in the box's local frame
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse_transform_vector(&(point - self.center))
    }

    /// Point of the box closest to `point`; `point` itself when inside
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let local = self.to_local(point);
        let clamped = local.zip_map(&self.half_extents, |v, h| v.clamp(-h, h));
        self.center + self.rotation * clamped
    }

    /// Tight world-axis bounds
    pub fn aabb(&self) -> Aabb {
        let extents = self.rotation.to_rotation_matrix().matrix().abs() * self.half_extents;
        Aabb::from_center_extents(self.center, extents)
    }

    /// Sphere enclosing every corner
    pub fn enclosing_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.half_extents.magnitude())
    }
}

/// World-space geometry a collider tests against
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionVolume {
    /// Sphere
    Sphere(BoundingSphere),
    /// Oriented box
    Box(OrientedBox),
}

impl CollisionVolume {
    /// Tight world-axis bounds
    pub fn aabb(&self) -> Aabb {
        match self {
            Self::Sphere(sphere) => sphere.aabb(),
            Self::Box(obb) => obb.aabb(),
        }
    }

    /// Sphere enclosing the volume
    pub fn bounding_sphere(&self) -> BoundingSphere {
        match self {
            Self::Sphere(sphere) => *sphere,
            Self::Box(obb) => obb.enclosing_sphere(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersects() {
        let a = Aabb::new(Vec3::repeat(0.0), Vec3::repeat(2.0));
        let b = Aabb::new(Vec3::repeat(1.0), Vec3::repeat(3.0));
        let c = Aabb::new(Vec3::repeat(5.0), Vec3::repeat(7.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_single_separating_axis() {
        let a = Aabb::new(Vec3::repeat(0.0), Vec3::repeat(2.0));
        let b = Aabb::new(Vec3::new(1.0, 1.0, 5.0), Vec3::new(3.0, 3.0, 7.0));

        assert!(a.overlaps_on(&b, Axis::X));
        assert!(a.overlaps_on(&b, Axis::Y));
        assert!(!a.overlaps_on(&b, Axis::Z));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_union_contains_both() {
        let a = Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        let b = Aabb::new(Vec3::new(2.0, -3.0, 0.5), Vec3::new(4.0, 0.0, 0.7));
        let union = a.union(&b);
        assert!(union.contains(&a));
        assert!(union.contains(&b));
        assert_eq!(union.min, Vec3::new(-1.0, -3.0, 0.0));
        assert_eq!(union.max, Vec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn test_closest_point_on_rotated_box() {
        let rotation = crate::foundation::math::utils::axis_angle(Vec3::z(), std::f32::consts::FRAC_PI_2);
        let obb = OrientedBox::new(Vec3::new(1.0, 0.0, 0.0), rotation, Vec3::new(2.0, 0.5, 0.5));

        // The long side now runs along world Y
        let on_top = obb.closest_point(Vec3::new(1.0, 5.0, 0.0));
        assert!((on_top - Vec3::new(1.0, 2.0, 0.0)).magnitude() < 1e-5);
        let inside = Vec3::new(1.2, 1.0, 0.1);
        assert!((obb.closest_point(inside) - inside).magnitude() < 1e-5);
        assert!((obb.aabb().extents() - Vec3::new(0.5, 2.0, 0.5)).magnitude() < 1e-5);
    }

    #[test]
    fn test_sphere_penetration() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
        assert!(a.intersects(&b));
        assert!((a.penetration_depth(&b) - 0.5).abs() < 1e-6);

        let far = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        assert!(!a.intersects(&far));
        assert_eq!(a.penetration_depth(&far), 0.0);
    }
}
