//! Entities: a transform node plus optional capability components

use super::{SceneError, TransformNode};
use crate::components::{
    Animation, AudioSource, Capabilities, Collider, Components, Graphics, InputController, ParticleEmitter,
    RigidBody,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to an entity slot
///
/// Slots are never reused within a scene, so an id stays unambiguous even
/// after its entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Slot index in allocation order
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    /// Ordinary object
    #[default]
    Default,
    /// Viewpoint; the first enabled camera defines the view matrix
    Camera,
    /// Light source
    Light,
}

/// A node of the scene tree
#[derive(Debug)]
pub struct Entity {
    name: String,
    kind: EntityKind,
    pub(crate) enabled: bool,
    pub(crate) transform: TransformNode,
    pub(crate) parent: Option<EntityId>,
    pub(crate) children: Vec<EntityId>,
    pub(crate) initialized: bool,
    pub(crate) components: Components,
}

macro_rules! attach_component {
    ($(#[$doc:meta])* $method:ident, $slot:ident, $ty:ty, $capability:expr) => {
        $(#[$doc])*
        pub fn $method(&mut self, component: $ty) -> Result<&mut Self, SceneError> {
            if self.components.$slot.is_some() {
                return Err(SceneError::ComponentAlreadyAttached {
                    entity: self.id,
                    capability: $capability.label(),
                });
            }
            self.components.$slot = Some(component);
            Ok(self)
        }
    };
}

/// Mutable view of an entity used to attach components
///
/// Handed out by [`super::Scene::entity_mut`]. It deliberately does not
/// expose the transform; transform mutations go through the scene so that
/// descendants are invalidated.
pub struct EntityMut<'a> {
    pub(crate) id: EntityId,
    pub(crate) components: &'a mut Components,
    pub(crate) enabled: &'a mut bool,
}

impl<'a> EntityMut<'a> {
    /// Handle of this entity
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Enable or disable the entity for every frame stage
    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        *self.enabled = enabled;
        self
    }

    attach_component!(
        /// Attach an input controller
        attach_input, input, Box<dyn InputController>, Capabilities::INPUT
    );
    attach_component!(
        /// Attach an animation
        attach_animation, animation, Box<dyn Animation>, Capabilities::ANIMATION
    );
    attach_component!(
        /// Attach a particle emitter
        attach_particles, particles, Box<dyn ParticleEmitter>, Capabilities::PARTICLES
    );
    attach_component!(
        /// Attach a collider
        attach_collider, collider, Collider, Capabilities::COLLIDER
    );
    attach_component!(
        /// Attach a rigid body
        attach_rigid_body, rigid_body, RigidBody, Capabilities::RIGID_BODY
    );
    attach_component!(
        /// Attach graphics
        attach_graphics, graphics, Graphics, Capabilities::GRAPHICS
    );
    attach_component!(
        /// Attach an audio source
        attach_audio, audio, AudioSource, Capabilities::AUDIO
    );

    /// Mutable access to the audio source
    pub fn audio_mut(&mut self) -> Option<&mut AudioSource> {
        self.components.audio.as_mut()
    }

    /// Mutable access to the graphics component
    pub fn graphics_mut(&mut self) -> Option<&mut Graphics> {
        self.components.graphics.as_mut()
    }

    /// Mutable access to the rigid body
    pub fn rigid_body_mut(&mut self) -> Option<&mut RigidBody> {
        self.components.rigid_body.as_mut()
    }
}

impl Entity {
    pub(crate) fn new(name: String, kind: EntityKind, parent: Option<EntityId>) -> Self {
        Self {
            name,
            kind,
            enabled: true,
            transform: TransformNode::default(),
            parent,
            children: Vec::new(),
            initialized: false,
            components: Components::default(),
        }
    }

    /// Unique identifier within the scene
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role of the entity
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Disabled entities are skipped by every frame stage
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether `init` has run for this entity
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Spatial state
    pub fn transform(&self) -> &TransformNode {
        &self.transform
    }

    /// Parent handle, `None` for roots
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Direct children in creation order
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    /// Mask of attached components
    pub fn capabilities(&self) -> Capabilities {
        self.components.capabilities()
    }

    /// Whether the entity is enabled and carries every capability in `required`
    pub fn participates(&self, required: Capabilities) -> bool {
        self.enabled && self.capabilities().contains(required)
    }

    /// Collider, if attached
    pub fn collider(&self) -> Option<&Collider> {
        self.components.collider.as_ref()
    }

    /// Rigid body, if attached
    pub fn rigid_body(&self) -> Option<&RigidBody> {
        self.components.rigid_body.as_ref()
    }

    /// Graphics, if attached
    pub fn graphics(&self) -> Option<&Graphics> {
        self.components.graphics.as_ref()
    }

    /// Audio source, if attached
    pub fn audio(&self) -> Option<&AudioSource> {
        self.components.audio.as_ref()
    }

    /// Particle emitter, if attached
    pub fn particles(&self) -> Option<&dyn ParticleEmitter> {
        self.components.particles.as_deref()
    }

    /// Run component init hooks and prime the collider
    pub(crate) fn init(&mut self, world: &crate::foundation::math::Transform) {
        let Self {
            transform, components, ..
        } = self;
        if let Some(input) = components.input.as_mut() {
            input.init(transform);
        }
        if let Some(animation) = components.animation.as_mut() {
            animation.init(transform);
        }
        if let Some(collider) = components.collider.as_mut() {
            collider.update(world);
        }
        self.initialized = true;
    }
}
