//! Collision pipeline over the scene
//!
//! Three frame stages share this state: collider update (refresh every
//! collider's boxes from the scene), broad phase (incremental sweep and
//! prune over the dynamic boxes), and narrow phase (volume tests plus
//! response on the broad-phase candidates).
//!
//! Contacts resolve in candidate order. A body moved by one contact has its
//! collider refreshed before the next pair that includes it is tested.
//!
//! The collider set is captured once from the initialized scene. Colliders
//! added afterwards are not tracked; destroyed ones are skipped.

use super::broad_phase::{SweepAndPrune, SweepStats};
use super::narrow_phase::{self, BodyState, Contact};
use super::Aabb;
use crate::components::Capabilities;
use crate::events::{Event, EventArg, EventKind};
use crate::scene::{EntityId, Scene};
use std::collections::HashSet;

/// Collision pair representing two entities that are colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Entity with the smaller id
    pub entity_a: EntityId,
    /// Entity with the larger id
    pub entity_b: EntityId,
}

impl CollisionPair {
    /// Create a new collision pair (always stores smaller entity ID first for consistency)
    pub fn new(entity_a: EntityId, entity_b: EntityId) -> Self {
        if entity_a < entity_b {
            Self { entity_a, entity_b }
        } else {
            Self {
                entity_a: entity_b,
                entity_b: entity_a,
            }
        }
    }
}

/// Broad and narrow phase state for one scene
pub struct CollisionSystem {
    /// Collider owners; position is the broad-phase collider index
    entities: Vec<EntityId>,
    aabbs: Vec<Aabb>,
    broad_phase: SweepAndPrune,
    current_pairs: HashSet<CollisionPair>,
    previous_pairs: HashSet<CollisionPair>,
}

impl CollisionSystem {
    /// Empty system tracking no colliders
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            aabbs: Vec::new(),
            broad_phase: SweepAndPrune::new(&[]),
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
        }
    }

    /// Capture every collider of `scene`, in allocation order
    pub fn build(scene: &Scene) -> Self {
        let (entities, aabbs): (Vec<_>, Vec<_>) = scene
            .ids()
            .filter_map(|id| {
                let collider = scene.entity(id)?.collider()?;
                Some((id, collider.dynamic_aabb()))
            })
            .unzip();
        let broad_phase = SweepAndPrune::new(&aabbs);
        log::info!("Collision system tracking {} colliders", entities.len());
        Self {
            entities,
            aabbs,
            broad_phase,
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
        }
    }

    /// Number of tracked colliders
    pub fn collider_count(&self) -> usize {
        self.entities.len()
    }

    /// Check if an entity is tracked
    pub fn has_collider(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    /// Refresh every enabled collider from its owner's world transform
    ///
    /// Returns how many colliders were updated.
    pub fn update_colliders(&mut self, scene: &mut Scene) -> usize {
        let mut updated = 0;
        for (slot, &id) in self.entities.iter().enumerate() {
            let Some(world) = scene.world_transform(id) else {
                continue;
            };
            let Some(entity) = scene.slot_mut(id) else {
                continue;
            };
            if !entity.participates(Capabilities::COLLIDER) {
                continue;
            }
            if let Some(collider) = entity.components.collider.as_mut() {
                collider.update(&world);
                self.aabbs[slot] = collider.dynamic_aabb();
                updated += 1;
            }
        }
        updated
    }

    /// Incrementally resort the broad phase
    pub fn broad_phase(&mut self) -> SweepStats {
        let stats = self.broad_phase.update(&self.aabbs);
        log::trace!("Broad phase: {} swaps, {} flips", stats.swaps, stats.flips);
        stats
    }

    /// Pairs overlapping on all three axes
    pub fn candidate_pairs(&self) -> Vec<CollisionPair> {
        self.broad_phase
            .overlapping_pairs()
            .into_iter()
            .map(|(i, j)| CollisionPair::new(self.entities[i], self.entities[j]))
            .collect()
    }

    /// Test every candidate pair exactly and apply the response
    ///
    /// Confirmed contacts publish a `Collision` event for each participant
    /// and trigger collision sounds.
    pub fn resolve(&mut self, scene: &mut Scene) -> Vec<Contact> {
        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();

        let mut contacts = Vec::new();
        for pair in self.candidate_pairs() {
            if let Some(contact) = Self::narrow_phase(scene, pair) {
                self.current_pairs.insert(pair);
                Self::apply(scene, &contact);
                contacts.push(contact);
            }
        }
        contacts
    }

    fn narrow_phase(scene: &Scene, pair: CollisionPair) -> Option<Contact> {
        let a = scene.entity(pair.entity_a)?;
        let b = scene.entity(pair.entity_b)?;
        if !a.participates(Capabilities::COLLIDER) || !b.participates(Capabilities::COLLIDER) {
            return None;
        }
        let (collider_a, collider_b) = (a.collider()?, b.collider()?);
        if collider_a.is_static() && collider_b.is_static() {
            return None;
        }
        let (normal, depth) = narrow_phase::intersect(&collider_a.volume(), &collider_b.volume())?;
        Some(Contact {
            a: pair.entity_a,
            b: pair.entity_b,
            normal,
            depth,
        })
    }

    fn body_state(scene: &Scene, id: EntityId) -> Option<BodyState> {
        let entity = scene.entity(id)?;
        Some(BodyState {
            is_static: entity.collider().is_some_and(|c| c.is_static()),
            velocity: entity.transform().velocity(),
            restitution: entity.rigid_body().map_or(1.0, |body| body.restitution),
        })
    }

    fn apply(scene: &mut Scene, contact: &Contact) {
        let (Some(a), Some(b)) = (Self::body_state(scene, contact.a), Self::body_state(scene, contact.b)) else {
            return;
        };
        let Some((correct_a, correct_b)) = narrow_phase::respond(contact.normal, contact.depth, &a, &b) else {
            return;
        };
        log::trace!("Contact {} / {}: depth {:.4}", contact.a, contact.b, contact.depth);

        for (id, correction) in [(contact.a, correct_a), (contact.b, correct_b)] {
            if let Some(correction) = correction {
                let applied = scene.update_transform(id, |node| {
                    node.translate(correction.offset);
                    node.set_velocity(correction.velocity);
                });
                if let Err(err) = applied {
                    log::debug!("Skipping collision response: {}", err);
                    continue;
                }
                Self::refresh_collider(scene, id);
            }
        }

        for (id, other, normal) in [
            (contact.a, contact.b, contact.normal),
            (contact.b, contact.a, -contact.normal),
        ] {
            scene.queue_event(
                Event::from_sender(EventKind::Collision, id)
                    .with_arg("other", EventArg::Entity(other))
                    .with_arg("normal", EventArg::Vector(normal))
                    .with_arg("depth", EventArg::Scalar(contact.depth)),
            );
            if let Some(audio) = scene.slot_mut(id).and_then(|e| e.components.audio.as_mut()) {
                if audio.play_on_collision {
                    audio.trigger();
                }
            }
        }
    }

    fn refresh_collider(scene: &mut Scene, id: EntityId) {
        let Some(world) = scene.world_transform(id) else {
            return;
        };
        if let Some(collider) = scene.slot_mut(id).and_then(|e| e.components.collider.as_mut()) {
            collider.refresh(&world);
        }
    }

    /// Pairs that started touching this frame
    pub fn collision_entered(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self.current_pairs.difference(&self.previous_pairs).copied().collect();
        pairs.sort();
        pairs
    }

    /// Pairs that stopped touching this frame
    pub fn collision_exited(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self.previous_pairs.difference(&self.current_pairs).copied().collect();
        pairs.sort();
        pairs
    }

    /// Pairs in contact after the last resolve
    pub fn current_collisions(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Broad-phase state, for inspection
    pub fn sweep_and_prune(&self) -> &SweepAndPrune {
        &self.broad_phase
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}
