//! Host application hooks driven by [`Engine::run`]

use crate::engine::{Engine, EngineError};
use crate::scene::SceneError;
use thiserror::Error;

/// Hooks the main loop calls around the frame stages
pub trait Application {
    /// Populate the scene and register observers
    ///
    /// Runs before [`Engine::init`] captures the collider set, so every
    /// entity that should collide must exist by the time this returns.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Per-frame hook, called with the frame delta before the stages run
    fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        Ok(())
    }

    /// Called once after the loop exits
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Failure raised from an [`Application`] hook
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine call failed inside a hook
    #[error("engine: {0}")]
    Engine(#[from] EngineError),

    /// Scene construction failed
    #[error("scene: {0}")]
    Scene(#[from] SceneError),

    /// Free-form failure raised by the host
    #[error("{0}")]
    Custom(String),
}
