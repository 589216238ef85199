//! Capability components
//!
//! An entity owns zero or one component of each kind. Behaviour that varies
//! per entity (input, animation, particles) is a trait object; data-driven
//! components (collider, rigid body, graphics, audio) are plain structs.

pub mod animation;
pub mod audio;
pub mod collider;
pub mod graphics;
pub mod input;
pub mod particles;
pub mod rigid_body;

pub use animation::{Animation, AnimationStatus, Spin, Tween};
pub use audio::AudioSource;
pub use collider::{Collider, ColliderShape};
pub use graphics::Graphics;
pub use input::{FlyController, InputController};
pub use particles::{Particle, ParticleEmitter, SimpleEmitter};
pub use rigid_body::RigidBody;

use bitflags::bitflags;

bitflags! {
    /// Which capability components an entity carries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Has an input controller
        const INPUT = 1 << 0;
        /// Has an animation
        const ANIMATION = 1 << 1;
        /// Has a collider
        const COLLIDER = 1 << 2;
        /// Has a rigid body
        const RIGID_BODY = 1 << 3;
        /// Has an audio source
        const AUDIO = 1 << 4;
        /// Has graphics
        const GRAPHICS = 1 << 5;
        /// Has a particle emitter
        const PARTICLES = 1 << 6;
    }
}

impl Capabilities {
    const LABELS: [(Self, &'static str); 7] = [
        (Self::INPUT, "input"),
        (Self::ANIMATION, "animation"),
        (Self::COLLIDER, "collider"),
        (Self::RIGID_BODY, "rigid body"),
        (Self::AUDIO, "audio"),
        (Self::GRAPHICS, "graphics"),
        (Self::PARTICLES, "particles"),
    ];

    /// Human readable name of a single capability
    pub fn label(self) -> &'static str {
        Self::LABELS
            .iter()
            .find(|(flag, _)| *flag == self)
            .map_or("components", |(_, label)| label)
    }
}

/// Component slots of one entity
#[derive(Default)]
pub struct Components {
    pub(crate) input: Option<Box<dyn InputController>>,
    pub(crate) animation: Option<Box<dyn Animation>>,
    pub(crate) particles: Option<Box<dyn ParticleEmitter>>,
    pub(crate) collider: Option<Collider>,
    pub(crate) rigid_body: Option<RigidBody>,
    pub(crate) graphics: Option<Graphics>,
    pub(crate) audio: Option<AudioSource>,
}

impl Components {
    /// Mask of the attached components
    pub fn capabilities(&self) -> Capabilities {
        let mut mask = Capabilities::empty();
        mask.set(Capabilities::INPUT, self.input.is_some());
        mask.set(Capabilities::ANIMATION, self.animation.is_some());
        mask.set(Capabilities::PARTICLES, self.particles.is_some());
        mask.set(Capabilities::COLLIDER, self.collider.is_some());
        mask.set(Capabilities::RIGID_BODY, self.rigid_body.is_some());
        mask.set(Capabilities::GRAPHICS, self.graphics.is_some());
        mask.set(Capabilities::AUDIO, self.audio.is_some());
        mask
    }

    /// Drop every component
    pub(crate) fn release(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components")
            .field("capabilities", &self.capabilities())
            .field("collider", &self.collider)
            .field("rigid_body", &self.rigid_body)
            .field("graphics", &self.graphics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_follow_slots() {
        let mut components = Components::default();
        assert!(components.capabilities().is_empty());

        components.collider = Some(Collider::sphere(1.0));
        components.rigid_body = Some(RigidBody::default());
        let mask = components.capabilities();
        assert!(mask.contains(Capabilities::COLLIDER | Capabilities::RIGID_BODY));
        assert!(!mask.contains(Capabilities::INPUT));

        components.release();
        assert!(components.capabilities().is_empty());
    }

    #[test]
    fn test_capability_labels() {
        assert_eq!(Capabilities::COLLIDER.label(), "collider");
        assert_eq!((Capabilities::INPUT | Capabilities::AUDIO).label(), "components");
    }
}
