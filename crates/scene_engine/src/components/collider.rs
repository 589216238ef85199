//! Collider component
//!
//! Keeps two boxes per frame: the static AABB at the current world pose and
//! the dynamic AABB, the union of this frame's and last frame's static boxes.
//! The broad phase sweeps the dynamic box so a fast mover cannot skip past a
//! thin obstacle between two frames.

use crate::foundation::math::{Transform, Vec3};
use crate::physics::{Aabb, BoundingSphere, CollisionVolume, OrientedBox};
use serde::{Deserialize, Serialize};

/// Collision geometry in local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Sphere of the given radius
    Sphere {
        /// Local radius before scaling
        radius: f32,
    },
    /// Oriented box with the given half extents
    Box {
        /// Local half size before scaling
        half_extents: Vec3,
    },
}

/// Collision volume attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    shape: ColliderShape,
    origin: Vec3,
    is_static: bool,
    static_aabb: Aabb,
    dynamic_aabb: Aabb,
    volume: CollisionVolume,
    primed: bool,
}

impl Collider {
    /// Build a collider from a shape, centered on the entity
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            origin: Vec3::zeros(),
            is_static: false,
            static_aabb: Aabb::default(),
            dynamic_aabb: Aabb::default(),
            volume: CollisionVolume::Sphere(BoundingSphere::new(Vec3::zeros(), 0.0)),
            primed: false,
        }
    }

    /// Sphere collider
    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::Sphere { radius })
    }

    /// Box collider
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::new(ColliderShape::Box { half_extents })
    }

    /// Offset the collider from the entity origin (builder pattern)
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    /// Mark the collider as immovable (builder pattern)
    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Local geometry
    pub fn shape(&self) -> ColliderShape {
        self.shape
    }

    /// Local origin offset
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Static colliders never receive collision response
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Box at the current world pose
    pub fn static_aabb(&self) -> Aabb {
        self.static_aabb
    }

    /// Box swept from the previous pose to the current one
    pub fn dynamic_aabb(&self) -> Aabb {
        self.dynamic_aabb
    }

    /// World geometry tested by the narrow phase
    pub fn volume(&self) -> CollisionVolume {
        self.volume
    }

    /// Sphere enclosing the world geometry
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.volume.bounding_sphere()
    }

    /// Recompute both boxes from the owner's world transform
    pub fn update(&mut self, world: &Transform) {
        let previous = self.primed.then_some(self.static_aabb);
        self.refresh(world);
        let current = self.static_aabb;
        self.dynamic_aabb = previous.map_or(current, |previous| previous.union(&current));
        self.primed = true;
    }

    /// Move the world geometry to a corrected pose without touching the sweep
    pub fn refresh(&mut self, world: &Transform) {
        let center = world.position + world.transform_offset(self.origin);
        self.volume = match self.shape {
            ColliderShape::Sphere { radius } => {
                CollisionVolume::Sphere(BoundingSphere::new(center, radius * world.max_scale()))
            }
            ColliderShape::Box { half_extents } => {
                let scaled = world.scale.component_mul(&half_extents);
                CollisionVolume::Box(OrientedBox::new(center, world.rotation, scaled))
            }
        };
        self.static_aabb = self.volume.aabb();
    }

    /// Forget the previous pose so the next update does not sweep
    pub fn reset_motion(&mut self) {
        self.primed = false;
    }
}
