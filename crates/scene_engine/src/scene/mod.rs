//! Scene graph
//!
//! Entities live in a fixed-capacity arena owned by [`Scene`] and refer to
//! each other by [`EntityId`]. The tree (parent links and child lists) is
//! expressed through ids, so ownership is flat and destruction order is
//! handled by the scene rather than by the entities themselves.

pub mod description;
pub mod entity;
pub mod graph;
pub mod transform;

pub use description::{ColliderDescription, EntityDescription, SceneDescription};
pub use entity::{Entity, EntityId, EntityKind, EntityMut};
pub use graph::Scene;
pub use transform::TransformNode;

use thiserror::Error;

/// Scene construction and mutation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Every slot of the preallocated pool has been handed out
    #[error("Entity pool exhausted (capacity {capacity})")]
    CapacityExhausted {
        /// Configured pool size
        capacity: usize,
    },

    /// Identifiers must be unique within the whole scene
    #[error("Entity id '{0}' already exists")]
    DuplicateId(String),

    /// The requested parent is not in the scene
    #[error("Parent entity '{0}' not found")]
    UnknownParent(String),

    /// The handle does not refer to a live entity
    #[error("Unknown entity {0}")]
    UnknownEntity(EntityId),

    /// The scene (or entity) was already initialized
    #[error("Scene already initialized")]
    AlreadyInitialized,

    /// Components are attached at most once
    #[error("Entity {entity} already has a {capability} component")]
    ComponentAlreadyAttached {
        /// Target entity
        entity: EntityId,
        /// Name of the component slot
        capability: &'static str,
    },
}
