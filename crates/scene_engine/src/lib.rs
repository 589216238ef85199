//! # Scene Engine
//!
//! Core of a small real-time 3D engine: a hierarchical scene graph with
//! lazily cached world transforms, an incremental three-axis sweep-and-prune
//! broad phase, and the fixed-order frame pipeline that ties input,
//! animation, collision and integration together. Rendering, audio
//! synthesis, asset parsing and window input are external collaborators
//! reached through traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Bounce;
//!
//! impl Application for Bounce {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let scene = engine.scene_mut();
//!         let ball = scene.create_entity("ball", None, EntityKind::Default)?;
//!         scene.reposition(ball, Vec3::new(0.0, 2.0, 0.0))?;
//!         if let Some(mut entity) = scene.entity_mut(ball) {
//!             entity.attach_collider(Collider::sphere(0.5))?;
//!             entity.attach_rigid_body(RigidBody::default())?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     engine.run(&mut Bounce, Some(600))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod audio;
pub mod components;
pub mod config;
pub mod events;
pub mod foundation;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;
pub mod scheduler;

mod application;
mod engine;

#[cfg(test)]
mod tests;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineConfig, EngineError, PhysicsConfig};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetHandle, AssetKind, AssetLoader, AssetRegistry},
        audio::{AudioConfig, AudioStream, Synthesizer, ToneSynth, VoiceParams},
        components::{
            Animation, AnimationStatus, AudioSource, Capabilities, Collider, ColliderShape, FlyController,
            Graphics, InputController, ParticleEmitter, RigidBody, SimpleEmitter, Spin, Tween,
        },
        config::{Config, ConfigFormat},
        events::{Event, EventArg, EventKind, NotificationCenter, Observer, ObserverToken},
        foundation::{
            math::{Mat4, Quat, Transform, Vec3},
            time::{FrameClock, Stopwatch},
        },
        input::{InputSource, InputState, KeyCode, NullInput, ScriptedInput},
        physics::{Aabb, CollisionPair, Contact, SweepAndPrune},
        render::{FrameContext, NullRenderer, ProjectionConfig, RenderView, Renderer},
        scene::{EntityId, EntityKind, Scene, SceneDescription, SceneError},
        scheduler::{FrameReport, FrameStage, FrameStatus},
        AppError, Application, Engine, EngineConfig, EngineError,
    };
}
