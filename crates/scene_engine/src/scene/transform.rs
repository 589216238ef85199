//! Hierarchical transform node
//!
//! Local position/orientation/scale plus a lazily recomputed world cache.
//! The cache lives in `Cell`s so read accessors can refresh it through a
//! shared reference: reading a stale world transform is allowed to write
//! the cache. `dirty == false` means the cached world transform is valid.

use crate::foundation::math::{utils, Mat4, Quat, Transform, Vec3};
use std::cell::Cell;

/// Spatial state of one entity
#[derive(Debug, Clone)]
pub struct TransformNode {
    local: Transform,
    velocity: Vec3,
    force: Vec3,
    world: Cell<Transform>,
    dirty: Cell<bool>,
    previous_world: Mat4,
    /// Set by every local mutation, consumed by the owning scene to
    /// propagate dirtiness and publish `TransformChanged`.
    changed: bool,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new(Transform::identity())
    }
}

impl TransformNode {
    /// Create a node with the given local transform
    pub fn new(local: Transform) -> Self {
        Self {
            local,
            velocity: Vec3::zeros(),
            force: Vec3::zeros(),
            world: Cell::new(local),
            dirty: Cell::new(true),
            previous_world: local.to_matrix(),
            changed: false,
        }
    }

    /// Move by `delta` in parent space
    pub fn translate(&mut self, delta: Vec3) {
        self.local.position += delta;
        self.touch();
    }

    /// Rotate by `angle` radians about `axis`
    ///
    /// The new rotation is applied on the left (world side) of the current
    /// orientation, then renormalized against drift.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) {
        let combined = utils::axis_angle(axis, angle) * self.local.rotation;
        self.local.rotation = Quat::new_normalize(combined.into_inner());
        self.touch();
    }

    /// Multiply the local scale component-wise
    pub fn scale(&mut self, factor: Vec3) {
        self.local.scale.component_mul_assign(&factor);
        self.touch();
    }

    /// Multiply the local scale uniformly
    pub fn scale_uniform(&mut self, factor: f32) {
        self.scale(Vec3::repeat(factor));
    }

    /// Zero the local position, then translate to `position`
    pub fn reposition(&mut self, position: Vec3) {
        self.local.position = Vec3::zeros();
        self.translate(position);
    }

    /// Replace the local orientation
    pub fn reorient(&mut self, rotation: Quat) {
        self.local.rotation = rotation;
        self.touch();
    }

    /// Replace the local scale
    pub fn rescale(&mut self, scale: Vec3) {
        self.local.scale = scale;
        self.touch();
    }

    /// Local position
    pub fn local_position(&self) -> Vec3 {
        self.local.position
    }

    /// Local orientation
    pub fn local_orientation(&self) -> Quat {
        self.local.rotation
    }

    /// Local scale
    pub fn local_scale(&self) -> Vec3 {
        self.local.scale
    }

    /// Full local transform
    pub fn local_transform(&self) -> Transform {
        self.local
    }

    /// Linear velocity (units per second)
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Replace the linear velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Accumulated force for the current step
    pub fn force(&self) -> Vec3 {
        self.force
    }

    /// Accumulate a force, consumed by the next rigid-body integration
    pub fn add_force(&mut self, force: Vec3) {
        self.force += force;
    }

    /// Drop the accumulated force
    pub fn clear_force(&mut self) {
        self.force = Vec3::zeros();
    }

    /// Whether the cached world transform is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// World transform given the parent's world transform (`None` for roots)
    ///
    /// Recomputes and caches only when dirty. The caller guarantees that a
    /// parent change has already marked this node dirty.
    pub fn world_with_parent(&self, parent: Option<&Transform>) -> Transform {
        if self.dirty.get() {
            let world = parent.map_or(self.local, |parent| parent.compose(&self.local));
            self.world.set(world);
            self.dirty.set(false);
        }
        self.world.get()
    }

    /// World transform matrix of the previous frame
    pub fn previous_world_matrix(&self) -> Mat4 {
        self.previous_world
    }

    /// Snapshot `world` as the previous frame's transform
    pub fn next_frame(&mut self, world: &Transform) {
        self.previous_world = world.to_matrix();
    }

    pub(crate) fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub(crate) fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Restore a captured local state and velocity, dropping pending forces
    pub(crate) fn restore(&mut self, local: Transform, velocity: Vec3) {
        self.local = local;
        self.velocity = velocity;
        self.force = Vec3::zeros();
        self.touch();
    }

    fn touch(&mut self) {
        self.dirty.set(true);
        self.changed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::PI;
    use approx::assert_relative_eq;

    fn assert_world_matches_local(node: &TransformNode) {
        let world = node.world_with_parent(None);
        let local = node.local_transform();
        assert_relative_eq!(world.position, local.position, epsilon = 1e-6);
        assert_relative_eq!(world.rotation, local.rotation, epsilon = 1e-6);
        assert_relative_eq!(world.scale, local.scale, epsilon = 1e-6);
    }

    #[test]
    fn test_root_world_tracks_local() {
        let mut node = TransformNode::default();
        assert_world_matches_local(&node);

        node.translate(Vec3::new(1.0, 2.0, 3.0));
        assert_world_matches_local(&node);
        node.rotate(0.4, Vec3::new(0.0, 1.0, 1.0));
        assert_world_matches_local(&node);
        node.scale(Vec3::new(2.0, 1.0, 0.5));
        assert_world_matches_local(&node);
        node.translate(Vec3::new(-4.0, 0.0, 0.0));
        node.rotate(-1.1, Vec3::x());
        assert_world_matches_local(&node);
    }

    #[test]
    fn test_reposition_roundtrip() {
        let mut node = TransformNode::default();
        node.translate(Vec3::new(9.0, -3.0, 1.0));
        let target = Vec3::new(0.25, 7.5, -2.0);
        node.reposition(target);
        assert_eq!(node.local_position(), target);
    }

    #[test]
    fn test_rotation_is_applied_on_the_left() {
        let mut node = TransformNode::default();
        node.rotate(PI / 2.0, Vec3::y());
        node.rotate(PI / 2.0, Vec3::x());

        let expected = utils::axis_angle(Vec3::x(), PI / 2.0) * utils::axis_angle(Vec3::y(), PI / 2.0);
        assert_relative_eq!(node.local_orientation(), expected, epsilon = 1e-5);
        assert_relative_eq!(node.local_orientation().norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_stays_normalized_over_many_steps() {
        let mut node = TransformNode::default();
        for _ in 0..10_000 {
            node.rotate(0.013, Vec3::new(0.3, 1.0, -0.2));
        }
        assert_relative_eq!(node.local_orientation().quaternion().norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_read_clears_dirty_flag() {
        let mut node = TransformNode::default();
        node.translate(Vec3::x());
        assert!(node.is_dirty());
        let _ = node.world_with_parent(None);
        assert!(!node.is_dirty());
        assert!(node.take_changed());
        assert!(!node.take_changed());
    }

    #[test]
    fn test_force_accumulates_until_cleared() {
        let mut node = TransformNode::default();
        node.add_force(Vec3::x());
        node.add_force(Vec3::x());
        assert_eq!(node.force(), Vec3::new(2.0, 0.0, 0.0));
        node.clear_force();
        assert_eq!(node.force(), Vec3::zeros());
        assert!(!node.take_changed());
    }

    #[test]
    fn test_next_frame_snapshots_world() {
        let mut node = TransformNode::default();
        node.translate(Vec3::new(1.0, 0.0, 0.0));
        let world = node.world_with_parent(None);
        node.next_frame(&world);
        node.translate(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(node.previous_world_matrix().m14, 1.0);
    }
}
