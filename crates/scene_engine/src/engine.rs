//! Core engine implementation

use crate::{
    application::Application,
    assets::{AssetLoader, AssetRegistry},
    audio::{audio_channel, AudioConfig, AudioMixer, AudioStream},
    config::{Config, ConfigError},
    events::NotificationCenter,
    foundation::{math::Vec3, time::FrameClock},
    input::{InputSource, NullInput},
    physics::CollisionSystem,
    render::{NullRenderer, ProjectionConfig, Renderer},
    scene::{Scene, SceneError},
    scheduler::{FrameParts, FrameReport, FrameScheduler, FrameStatus},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main engine struct
///
/// Owns every subsystem and passes them explicitly to the frame scheduler;
/// there is no process-wide state, so several engines can coexist.
pub struct Engine {
    scene: Scene,
    collisions: CollisionSystem,
    notifications: NotificationCenter,
    assets: AssetRegistry,
    audio: AudioMixer,
    /// Callback side of the audio channel until the host takes it
    audio_stream: Option<AudioStream>,
    renderer: Box<dyn Renderer>,
    input: Box<dyn InputSource>,
    scheduler: FrameScheduler,
    clock: FrameClock,
    config: EngineConfig,
    initialized: bool,
    running: bool,
    last_report: FrameReport,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        if config.entity_capacity == 0 {
            return Err(EngineError::InitializationFailed(
                "entity capacity must be at least 1".to_string(),
            ));
        }
        if config.max_frame_delta <= 0.0 {
            return Err(EngineError::InitializationFailed(
                "max frame delta must be positive".to_string(),
            ));
        }

        let (audio, audio_stream) = audio_channel(&config.audio);
        Ok(Self {
            scene: Scene::with_capacity(config.entity_capacity),
            collisions: CollisionSystem::new(),
            notifications: NotificationCenter::new(),
            assets: AssetRegistry::default(),
            audio,
            audio_stream: Some(audio_stream),
            renderer: Box::new(NullRenderer),
            input: Box::new(NullInput),
            scheduler: FrameScheduler::new(),
            clock: FrameClock::new(config.fixed_delta, config.max_frame_delta),
            config,
            initialized: false,
            running: true,
            last_report: FrameReport::default(),
        })
    }

    /// Use `renderer` for the render stage (builder pattern)
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Use `input` for the poll-input stage (builder pattern)
    pub fn with_input(mut self, input: Box<dyn InputSource>) -> Self {
        self.input = input;
        self
    }

    /// Use `loader` for asset requests (builder pattern)
    pub fn with_asset_loader(mut self, loader: Box<dyn AssetLoader>) -> Self {
        self.assets = AssetRegistry::new(loader);
        self
    }

    /// Initialize the scene and capture its colliders
    ///
    /// Must be called once, after the scene is built.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Err(EngineError::Scene(SceneError::AlreadyInitialized));
        }
        self.scene.init()?;
        self.collisions = CollisionSystem::build(&self.scene);
        for event in self.scene.drain_events() {
            self.notifications.notify(&event);
        }
        self.initialized = true;
        log::info!(
            "Engine ready: {} entities, {} colliders",
            self.scene.len(),
            self.collisions.collider_count()
        );
        Ok(())
    }

    /// Run one frame of `delta_time` seconds (clamped to the configured maximum)
    pub fn step(&mut self, delta_time: f32) -> Result<FrameStatus, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let delta_time = delta_time.clamp(0.0, self.config.max_frame_delta);
        let parts = FrameParts {
            scene: &mut self.scene,
            collisions: &mut self.collisions,
            notifications: &mut self.notifications,
            input: self.input.as_mut(),
            renderer: self.renderer.as_mut(),
            audio: &mut self.audio,
            gravity: self.config.physics.gravity,
            projection: &self.config.projection,
        };
        self.last_report = self.scheduler.run_frame(parts, delta_time);
        Ok(self.last_report.status)
    }

    /// Run the engine main loop with the given application
    ///
    /// Stops when a frame reports [`FrameStatus::Stop`], when the application
    /// calls [`Engine::quit`], or after `max_frames` frames.
    pub fn run<T: Application>(&mut self, app: &mut T, max_frames: Option<u64>) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {}", e)))?;
        if !self.initialized {
            self.init()?;
        }

        log::info!("Starting main loop...");
        let mut frames = 0;
        while self.running && max_frames.map_or(true, |max| frames < max) {
            let delta_time = self.clock.tick();

            app.update(self, delta_time)
                .map_err(|e| EngineError::ApplicationError(format!("App update: {}", e)))?;
            if !self.running {
                break;
            }
            if self.step(delta_time)? == FrameStatus::Stop {
                self.running = false;
            }
            frames += 1;
        }

        app.cleanup(self);
        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps, {:.2}s simulated)",
            frames,
            self.clock.wall_rate(),
            self.clock.simulated_time()
        );
        Ok(())
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
        self.scheduler.request_quit();
    }

    /// Whether the main loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Restore the initial scene state at the end of the next frame
    pub fn request_reset(&mut self) {
        self.scheduler.request_reset();
    }

    /// Pause or resume the simulation at the end of the next frame
    pub fn request_pause(&mut self, paused: bool) {
        self.scheduler.request_pause(paused);
    }

    /// Whether the simulation stages are skipped
    pub fn is_paused(&self) -> bool {
        self.scheduler.is_paused()
    }

    /// Frames run so far
    pub fn frame_index(&self) -> u64 {
        self.scheduler.frame_index()
    }

    /// Report of the most recent frame
    pub fn last_report(&self) -> &FrameReport {
        &self.last_report
    }

    /// Get the scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Get mutable access to the scene
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Collision state
    pub fn collisions(&self) -> &CollisionSystem {
        &self.collisions
    }

    /// Observer registry
    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Get mutable access to the observer registry
    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// Get the asset registry
    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    /// Get mutable access to the asset registry
    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }

    /// Frame-thread side of the audio channel
    pub fn audio_mut(&mut self) -> &mut AudioMixer {
        &mut self.audio
    }

    /// Hand the audio callback side to the host audio API
    ///
    /// Returns `None` after the first call.
    pub fn take_audio_stream(&mut self) -> Option<AudioStream> {
        self.audio_stream.take()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Physics settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Acceleration applied to every rigid body, scaled by its gravity scale
    pub gravity: Vec3,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { gravity: Vec3::zeros() }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entities the scene can hold over its lifetime
    pub entity_capacity: usize,
    /// Longest frame simulated in one step, in seconds
    pub max_frame_delta: f32,
    /// Fixed step for deterministic runs; wall clock when absent
    pub fixed_delta: Option<f32>,
    /// Physics settings
    pub physics: PhysicsConfig,
    /// Camera projection
    pub projection: ProjectionConfig,
    /// Audio output
    pub audio: AudioConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            max_frame_delta: 0.25,
            fixed_delta: None,
            physics: PhysicsConfig::default(),
            projection: ProjectionConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// A frame was requested before `init`
    #[error("Engine not initialized")]
    NotInitialized,

    /// Scene construction or mutation error
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}
