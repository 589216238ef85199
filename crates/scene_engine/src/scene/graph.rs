//! Entity arena and tree operations

use super::entity::EntityMut;
use super::{Entity, EntityId, EntityKind, SceneError, TransformNode};
use crate::events::{Event, EventKind};
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use std::collections::HashMap;

/// Local state captured at `init`, restored by a reset
#[derive(Debug, Clone, Copy)]
struct InitialState {
    local: Transform,
    velocity: Vec3,
}

/// Fixed-capacity entity tree
///
/// Entities are stored flat in allocation order; stages iterate that order.
/// Transform mutations go through the scene, which invalidates the cached
/// world transforms of all descendants and queues a `TransformChanged`
/// event. Queued events are handed to the notification center by the frame
/// scheduler at the next stage boundary.
pub struct Scene {
    slots: Vec<Option<Entity>>,
    capacity: usize,
    index: HashMap<String, EntityId>,
    roots: Vec<EntityId>,
    initialized: bool,
    initial_state: Vec<Option<InitialState>>,
    outbox: Vec<Event>,
}

impl Scene {
    /// Scene able to hold `capacity` entities over its lifetime
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            index: HashMap::with_capacity(capacity),
            roots: Vec::new(),
            initialized: false,
            initial_state: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Pool size fixed at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the scene has no live entities
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Create an entity under `parent` (or as a root)
    ///
    /// Fails without side effects when the pool is exhausted, `name` is
    /// taken, or `parent` does not name a live entity. Entities can only be
    /// created before [`Scene::init`].
    pub fn create_entity(&mut self, name: &str, parent: Option<&str>, kind: EntityKind) -> Result<EntityId, SceneError> {
        if self.initialized {
            return Err(SceneError::AlreadyInitialized);
        }
        if self.slots.len() >= self.capacity {
            log::warn!("Cannot create '{}': entity pool of {} exhausted", name, self.capacity);
            return Err(SceneError::CapacityExhausted {
                capacity: self.capacity,
            });
        }
        if self.index.contains_key(name) {
            log::warn!("Cannot create '{}': id already in use", name);
            return Err(SceneError::DuplicateId(name.to_string()));
        }
        let parent = match parent {
            Some(parent_name) => match self.index.get(parent_name) {
                Some(&id) => Some(id),
                None => {
                    log::warn!("Cannot create '{}': parent '{}' not found", name, parent_name);
                    return Err(SceneError::UnknownParent(parent_name.to_string()));
                }
            },
            None => None,
        };

        let index = u32::try_from(self.slots.len()).map_err(|_| SceneError::CapacityExhausted {
            capacity: self.capacity,
        })?;
        let id = EntityId::new(index);
        self.slots.push(Some(Entity::new(name.to_string(), kind, parent)));
        self.index.insert(name.to_string(), id);

        match parent {
            Some(parent) => {
                if let Some(parent_entity) = self.slot_mut(parent) {
                    parent_entity.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        log::trace!("Created entity '{}' as {}", name, id);
        Ok(id)
    }

    /// Look up an entity by identifier
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.index.get(name).copied()
    }

    /// Depth-first search of the subtree below `parent` (excluding `parent`)
    pub fn find_child(&self, parent: EntityId, name: &str) -> Option<EntityId> {
        let mut stack: Vec<EntityId> = self.children(parent).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(entity) = self.slot(id) else {
                continue;
            };
            if entity.name() == name {
                return Some(id);
            }
            stack.extend(entity.children.iter().rev());
        }
        None
    }

    /// Borrow an entity
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.slot(id)
    }

    /// Borrow an entity for component attachment
    pub fn entity_mut(&mut self, id: EntityId) -> Option<EntityMut<'_>> {
        self.slot_mut(id).map(|entity| EntityMut {
            id,
            components: &mut entity.components,
            enabled: &mut entity.enabled,
        })
    }

    /// Parent of `id`
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.slot(id).and_then(Entity::parent)
    }

    /// Children of `id`, empty for unknown ids
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.slot(id).map(Entity::children).unwrap_or(&[])
    }

    /// Top-level entities in creation order
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Live entities in allocation order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| EntityId::new(index as u32))
    }

    /// Enable or disable an entity for every frame stage
    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> Result<(), SceneError> {
        let entity = self.slot_mut(id).ok_or(SceneError::UnknownEntity(id))?;
        entity.enabled = enabled;
        Ok(())
    }

    /// Mutate the transform node of `id`
    ///
    /// Any local change invalidates every descendant's world transform and
    /// queues a `TransformChanged` event.
    pub fn update_transform<R>(&mut self, id: EntityId, f: impl FnOnce(&mut TransformNode) -> R) -> Result<R, SceneError> {
        let entity = self.slot_mut(id).ok_or(SceneError::UnknownEntity(id))?;
        let result = f(&mut entity.transform);
        self.commit(id);
        Ok(result)
    }

    /// Move by `delta` in parent space
    pub fn translate(&mut self, id: EntityId, delta: Vec3) -> Result<(), SceneError> {
        self.update_transform(id, |node| node.translate(delta))
    }

    /// Rotate by `angle` radians about `axis`
    pub fn rotate(&mut self, id: EntityId, angle: f32, axis: Vec3) -> Result<(), SceneError> {
        self.update_transform(id, |node| node.rotate(angle, axis))
    }

    /// Multiply the local scale component-wise
    pub fn scale(&mut self, id: EntityId, factor: Vec3) -> Result<(), SceneError> {
        self.update_transform(id, |node| node.scale(factor))
    }

    /// Set the local position
    pub fn reposition(&mut self, id: EntityId, position: Vec3) -> Result<(), SceneError> {
        self.update_transform(id, |node| node.reposition(position))
    }

    /// Set the local orientation
    pub fn reorient(&mut self, id: EntityId, rotation: Quat) -> Result<(), SceneError> {
        self.update_transform(id, |node| node.reorient(rotation))
    }

    /// Set the local scale
    pub fn rescale(&mut self, id: EntityId, scale: Vec3) -> Result<(), SceneError> {
        self.update_transform(id, |node| node.rescale(scale))
    }

    /// World transform, recomputed lazily through the ancestor chain
    pub fn world_transform(&self, id: EntityId) -> Option<Transform> {
        self.slot(id).map(|entity| self.resolve_world(entity))
    }

    /// World position
    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.world_transform(id).map(|world| world.position)
    }

    /// World orientation
    pub fn world_orientation(&self, id: EntityId) -> Option<Quat> {
        self.world_transform(id).map(|world| world.rotation)
    }

    /// World scale
    pub fn world_scale(&self, id: EntityId) -> Option<Vec3> {
        self.world_transform(id).map(|world| world.scale)
    }

    /// World transform as a matrix
    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        self.world_transform(id).map(|world| world.to_matrix())
    }

    /// Initialize every entity once, parents before children
    pub fn init(&mut self) -> Result<(), SceneError> {
        if self.initialized {
            return Err(SceneError::AlreadyInitialized);
        }

        let mut stack: Vec<EntityId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(world) = self.world_transform(id) else {
                continue;
            };
            let Some(entity) = self.slot_mut(id) else {
                continue;
            };
            entity.init(&world);
            stack.extend(entity.children.iter().rev());
        }

        self.initial_state = self
            .slots
            .iter()
            .map(|slot| {
                slot.as_ref().map(|entity| InitialState {
                    local: entity.transform.local_transform(),
                    velocity: entity.transform.velocity(),
                })
            })
            .collect();
        self.initialized = true;
        log::info!("Scene initialized with {} entities", self.len());
        Ok(())
    }

    /// Destroy `id` and its whole subtree, children first
    pub fn destroy(&mut self, id: EntityId) -> Result<(), SceneError> {
        if self.slot(id).is_none() {
            return Err(SceneError::UnknownEntity(id));
        }

        // Pre-order collection reversed gives a children-before-parent order
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend_from_slice(self.children(current));
        }

        match self.parent(id) {
            Some(parent) => {
                if let Some(parent_entity) = self.slot_mut(parent) {
                    parent_entity.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        for current in order.into_iter().rev() {
            if let Some(mut entity) = self.slots.get_mut(current.index()).and_then(Option::take) {
                entity.components.release();
                self.index.remove(entity.name());
                log::trace!("Destroyed entity '{}'", entity.name());
            }
        }
        Ok(())
    }

    /// Snapshot the world transform of every enabled entity as the previous frame's
    ///
    /// A disabled entity keeps the snapshot from before it was disabled.
    pub fn next_frame(&mut self) {
        for index in 0..self.slots.len() {
            let id = EntityId::new(index as u32);
            if !self.entity(id).is_some_and(|entity| entity.is_enabled()) {
                continue;
            }
            let Some(world) = self.world_transform(id) else {
                continue;
            };
            if let Some(entity) = self.slot_mut(id) {
                entity.transform.next_frame(&world);
            }
        }
    }

    /// Restore the local state captured at `init` and rewind components
    pub fn reset_to_initial(&mut self) {
        for index in 0..self.slots.len() {
            let Some(initial) = self.initial_state.get(index).copied().flatten() else {
                continue;
            };
            let id = EntityId::new(index as u32);
            let Some(entity) = self.slot_mut(id) else {
                continue;
            };
            entity.transform.restore(initial.local, initial.velocity);
            let components = &mut entity.components;
            if let Some(animation) = components.animation.as_mut() {
                animation.reset();
            }
            if let Some(particles) = components.particles.as_mut() {
                particles.reset();
            }
            if let Some(collider) = components.collider.as_mut() {
                collider.reset_motion();
            }
            self.commit(id);
        }
        log::info!("Scene reset to initial state");
    }

    /// Take the events queued since the last call
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn queue_event(&mut self, event: Event) {
        self.outbox.push(event);
    }

    pub(crate) fn slot(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Publish a pending local change of `id`: invalidate descendants and
    /// queue the change event
    pub(crate) fn commit(&mut self, id: EntityId) {
        let changed = self.slot_mut(id).is_some_and(|entity| entity.transform.take_changed());
        if !changed {
            return;
        }
        self.invalidate_descendants(id);
        self.outbox.push(Event::from_sender(EventKind::TransformChanged, id));
    }

    /// A dirty node's descendants are all dirty already, so the walk stops
    /// at the first dirty node of each branch.
    fn invalidate_descendants(&self, id: EntityId) {
        let mut stack: Vec<EntityId> = self.children(id).to_vec();
        while let Some(child) = stack.pop() {
            let Some(entity) = self.slot(child) else {
                continue;
            };
            if entity.transform.is_dirty() {
                continue;
            }
            entity.transform.mark_dirty();
            stack.extend_from_slice(&entity.children);
        }
    }

    fn resolve_world(&self, entity: &Entity) -> Transform {
        let parent = if entity.transform.is_dirty() {
            entity.parent.and_then(|p| self.slot(p)).map(|p| self.resolve_world(p))
        } else {
            None
        };
        entity.transform.world_with_parent(parent.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Collider;
    use crate::foundation::math::{constants::PI, utils};
    use approx::assert_relative_eq;

    fn tree() -> (Scene, EntityId, EntityId, EntityId) {
        let mut scene = Scene::with_capacity(8);
        let root = scene.create_entity("root", None, EntityKind::Default).unwrap();
        let child = scene.create_entity("child", Some("root"), EntityKind::Default).unwrap();
        let grandchild = scene.create_entity("grandchild", Some("child"), EntityKind::Light).unwrap();
        (scene, root, child, grandchild)
    }

    #[test]
    fn test_create_links_parent_and_child() {
        let (scene, root, child, grandchild) = tree();
        assert_eq!(scene.parent(child), Some(root));
        assert_eq!(scene.children(root), &[child]);
        assert_eq!(scene.children(child), &[grandchild]);
        assert_eq!(scene.roots(), &[root]);
        assert_eq!(scene.len(), 3);
        assert_eq!(scene.entity(grandchild).map(Entity::kind), Some(EntityKind::Light));
    }

    #[test]
    fn test_create_failures() {
        let mut scene = Scene::with_capacity(2);
        scene.create_entity("a", None, EntityKind::Default).unwrap();

        assert_eq!(
            scene.create_entity("a", None, EntityKind::Default),
            Err(SceneError::DuplicateId("a".into()))
        );
        assert_eq!(
            scene.create_entity("b", Some("nobody"), EntityKind::Default),
            Err(SceneError::UnknownParent("nobody".into()))
        );
        scene.create_entity("b", Some("a"), EntityKind::Default).unwrap();
        assert_eq!(
            scene.create_entity("c", None, EntityKind::Default),
            Err(SceneError::CapacityExhausted { capacity: 2 })
        );
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_find_entity_and_child() {
        let (scene, root, child, grandchild) = tree();
        assert_eq!(scene.find_entity("grandchild"), Some(grandchild));
        assert_eq!(scene.find_entity("missing"), None);
        assert_eq!(scene.find_child(root, "grandchild"), Some(grandchild));
        assert_eq!(scene.find_child(child, "root"), None);
        assert_eq!(scene.find_child(root, "root"), None);
    }

    #[test]
    fn test_child_world_follows_parent_lazily() {
        let (mut scene, root, child, grandchild) = tree();
        scene.translate(child, Vec3::new(0.0, 1.0, 0.0)).unwrap();
        scene.translate(grandchild, Vec3::new(0.0, 0.0, 2.0)).unwrap();
        // Prime the caches
        assert_relative_eq!(scene.world_position(grandchild).unwrap(), Vec3::new(0.0, 1.0, 2.0));

        scene.translate(root, Vec3::new(5.0, 0.0, 0.0)).unwrap();
        assert!(scene.entity(grandchild).unwrap().transform().is_dirty());
        assert_relative_eq!(scene.world_position(child).unwrap(), Vec3::new(5.0, 1.0, 0.0));
        assert_relative_eq!(scene.world_position(grandchild).unwrap(), Vec3::new(5.0, 1.0, 2.0));
    }

    #[test]
    fn test_world_orientation_and_scale_compose() {
        let (mut scene, root, child, _) = tree();
        scene.rotate(root, PI / 2.0, Vec3::y()).unwrap();
        scene.rescale(root, Vec3::new(2.0, 2.0, 2.0)).unwrap();
        scene.rotate(child, PI / 2.0, Vec3::x()).unwrap();
        scene.scale(child, Vec3::new(1.0, 3.0, 1.0)).unwrap();

        let expected = utils::axis_angle(Vec3::y(), PI / 2.0) * utils::axis_angle(Vec3::x(), PI / 2.0);
        assert_relative_eq!(scene.world_orientation(child).unwrap(), expected, epsilon = 1e-5);
        assert_relative_eq!(scene.world_scale(child).unwrap(), Vec3::new(2.0, 6.0, 2.0));
    }

    #[test]
    fn test_mutation_queues_change_event() {
        let (mut scene, root, _, _) = tree();
        scene.translate(root, Vec3::x()).unwrap();
        let events = scene.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::TransformChanged);
        assert_eq!(events[0].sender, Some(root));
        assert!(scene.drain_events().is_empty());
    }

    #[test]
    fn test_unknown_entity_mutation() {
        let (mut scene, _, _, _) = tree();
        let bogus = EntityId::new(42);
        assert_eq!(scene.translate(bogus, Vec3::x()), Err(SceneError::UnknownEntity(bogus)));
        assert!(scene.world_transform(bogus).is_none());
        assert!(scene.children(bogus).is_empty());
    }

    #[test]
    fn test_init_runs_once() {
        let (mut scene, root, _, grandchild) = tree();
        assert!(scene.init().is_ok());
        assert!(scene.entity(grandchild).unwrap().is_initialized());
        assert!(scene.entity(root).unwrap().is_initialized());
        assert_eq!(scene.init(), Err(SceneError::AlreadyInitialized));
        assert_eq!(
            scene.create_entity("late", None, EntityKind::Default),
            Err(SceneError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_init_primes_collider_at_world_pose() {
        let (mut scene, root, child, _) = tree();
        scene.translate(root, Vec3::new(3.0, 0.0, 0.0)).unwrap();
        scene.entity_mut(child).unwrap().attach_collider(Collider::sphere(1.0)).unwrap();
        scene.init().unwrap();

        let aabb = scene.entity(child).unwrap().collider().unwrap().static_aabb();
        assert_relative_eq!(aabb.center(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_component_attached_once() {
        let (mut scene, root, _, _) = tree();
        let mut entity = scene.entity_mut(root).unwrap();
        entity.attach_collider(Collider::sphere(1.0)).unwrap();
        assert!(matches!(
            entity.attach_collider(Collider::sphere(2.0)),
            Err(SceneError::ComponentAlreadyAttached { capability: "collider", .. })
        ));
    }

    #[test]
    fn test_destroy_subtree() {
        let (mut scene, root, child, grandchild) = tree();
        scene.destroy(child).unwrap();

        assert!(scene.entity(child).is_none());
        assert!(scene.entity(grandchild).is_none());
        assert!(scene.children(root).is_empty());
        assert_eq!(scene.find_entity("grandchild"), None);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.destroy(child), Err(SceneError::UnknownEntity(child)));
        assert_eq!(scene.ids().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn test_destroyed_slots_are_not_reused() {
        let mut scene = Scene::with_capacity(2);
        let a = scene.create_entity("a", None, EntityKind::Default).unwrap();
        scene.destroy(a).unwrap();
        let b = scene.create_entity("a", None, EntityKind::Default).unwrap();
        assert_ne!(a, b);
        assert!(scene.create_entity("c", None, EntityKind::Default).is_err());
    }

    #[test]
    fn test_next_frame_and_reset() {
        let (mut scene, root, child, _) = tree();
        scene.init().unwrap();
        scene.translate(root, Vec3::new(1.0, 0.0, 0.0)).unwrap();
        scene.next_frame();
        let previous = scene.entity(child).unwrap().transform().previous_world_matrix();
        assert_relative_eq!(previous.m14, 1.0);

        scene.update_transform(child, |node| node.set_velocity(Vec3::y())).unwrap();
        scene.reset_to_initial();
        assert_eq!(scene.world_position(child), Some(Vec3::zeros()));
        assert_eq!(scene.entity(child).unwrap().transform().velocity(), Vec3::zeros());
    }

    #[test]
    fn test_next_frame_skips_disabled() {
        let (mut scene, root, child, _) = tree();
        scene.init().unwrap();
        scene.set_enabled(child, false).unwrap();
        scene.translate(root, Vec3::new(2.0, 0.0, 0.0)).unwrap();
        scene.next_frame();

        let root_previous = scene.entity(root).unwrap().transform().previous_world_matrix();
        assert_relative_eq!(root_previous.m14, 2.0);
        let child_previous = scene.entity(child).unwrap().transform().previous_world_matrix();
        assert_relative_eq!(child_previous.m14, 0.0);
    }
}
