//! Narrow phase: exact volume tests and collision response
//!
//! Spheres test against spheres and oriented boxes exactly. Box pairs test
//! their world bounds, which is exact only while both stay axis aligned.
//!
//! Response rules for a confirmed contact between `a` and `b`:
//! - static/static: nothing happens
//! - dynamic/static: the dynamic body is pushed out by the full penetration
//!   depth and its velocity reflected along the contact normal
//! - dynamic/dynamic: each body is pushed out by half the depth and each
//!   velocity reflected
//!
//! A velocity is only reflected while it still points into the other body,
//! so a separating pair is never pulled back together.

use super::{Aabb, Axis, BoundingSphere, CollisionVolume, OrientedBox};
use crate::foundation::math::{constants::EPSILON, Vec3};
use crate::scene::EntityId;

/// Confirmed intersection between two colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// First participant (lower id)
    pub a: EntityId,
    /// Second participant
    pub b: EntityId,
    /// Unit vector pointing from `a` towards `b`
    pub normal: Vec3,
    /// Penetration depth along `normal`
    pub depth: f32,
}

/// Motion state of one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Static bodies never move
    pub is_static: bool,
    /// Current linear velocity
    pub velocity: Vec3,
    /// Bounciness, 0 = inelastic, 1 = perfectly elastic
    pub restitution: f32,
}

/// Position and velocity change for one participant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Translation that separates the bodies
    pub offset: Vec3,
    /// Velocity after the response
    pub velocity: Vec3,
}

/// Normal and depth if the spheres intersect
///
/// Coincident centers fall back to the +Y normal.
pub fn sphere_sphere(a: &BoundingSphere, b: &BoundingSphere) -> Option<(Vec3, f32)> {
    if !a.intersects(b) {
        return None;
    }
    let normal = (b.center - a.center).try_normalize(EPSILON).unwrap_or_else(Vec3::y);
    Some((normal, a.penetration_depth(b)))
}

/// Normal (sphere towards box) and depth if the sphere touches the box
///
/// A center outside the box pushes along the closest-point direction. A
/// center inside pushes through the nearest face.
pub fn sphere_box(sphere: &BoundingSphere, obb: &OrientedBox) -> Option<(Vec3, f32)> {
    let local = obb.to_local(sphere.center);
    let clamped = local.zip_map(&obb.half_extents, |v, h| v.clamp(-h, h));
    let outside = local - clamped;
    let distance = outside.magnitude();

    let (outward, depth) = if distance > EPSILON {
        if distance >= sphere.radius {
            return None;
        }
        (outside / distance, sphere.radius - distance)
    } else {
        let axis = Axis::ALL
            .into_iter()
            .min_by(|&p, &q| {
                let gap = |axis: Axis| obb.half_extents[axis.index()] - local[axis.index()].abs();
                gap(p).total_cmp(&gap(q))
            })
            .unwrap_or(Axis::Y);
        let i = axis.index();
        let mut outward = Vec3::zeros();
        outward[i] = if local[i] < 0.0 { -1.0 } else { 1.0 };
        (outward, sphere.radius + obb.half_extents[i] - local[i].abs())
    };
    Some((-(obb.rotation * outward), depth))
}

/// Normal (a towards b) and depth along the axis of least overlap
pub fn box_box(a: &Aabb, b: &Aabb) -> Option<(Vec3, f32)> {
    let mut best: Option<(Axis, f32)> = None;
    for axis in Axis::ALL {
        let overlap = a.max_on(axis).min(b.max_on(axis)) - a.min_on(axis).max(b.min_on(axis));
        if overlap <= 0.0 {
            return None;
        }
        if best.map_or(true, |(_, least)| overlap < least) {
            best = Some((axis, overlap));
        }
    }
    let (axis, depth) = best?;
    let i = axis.index();
    let mut normal = Vec3::zeros();
    normal[i] = if b.center()[i] < a.center()[i] { -1.0 } else { 1.0 };
    Some((normal, depth))
}

/// Dispatch on the volume kinds; the normal always points from `a` to `b`
pub fn intersect(a: &CollisionVolume, b: &CollisionVolume) -> Option<(Vec3, f32)> {
    match (a, b) {
        (CollisionVolume::Sphere(a), CollisionVolume::Sphere(b)) => sphere_sphere(a, b),
        (CollisionVolume::Sphere(a), CollisionVolume::Box(b)) => sphere_box(a, b),
        (CollisionVolume::Box(a), CollisionVolume::Sphere(b)) => {
            sphere_box(b, a).map(|(normal, depth)| (-normal, depth))
        }
        (CollisionVolume::Box(a), CollisionVolume::Box(b)) => box_box(&a.aabb(), &b.aabb()),
    }
}

/// Reflect `velocity` off a surface with outward direction `-toward`
fn reflect(velocity: Vec3, toward: Vec3, restitution: f32) -> Vec3 {
    let approach = velocity.dot(&toward);
    if approach > 0.0 {
        velocity - toward * ((1.0 + restitution) * approach)
    } else {
        velocity
    }
}

/// Compute the response for both participants of a contact
///
/// Returns `None` for static/static pairs. A static participant gets no
/// correction (`None` in its slot).
pub fn respond(
    normal: Vec3,
    depth: f32,
    a: &BodyState,
    b: &BodyState,
) -> Option<(Option<Correction>, Option<Correction>)> {
    let share = match (a.is_static, b.is_static) {
        (true, true) => return None,
        (false, false) => 0.5,
        _ => 1.0,
    };

    let correct_a = (!a.is_static).then(|| Correction {
        offset: -normal * depth * share,
        velocity: reflect(a.velocity, normal, a.restitution),
    });
    let correct_b = (!b.is_static).then(|| Correction {
        offset: normal * depth * share,
        velocity: reflect(b.velocity, -normal, b.restitution),
    });
    Some((correct_a, correct_b))
}
