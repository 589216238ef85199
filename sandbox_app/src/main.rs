//! Headless sandbox
//!
//! Drops a ring of spheres onto a static floor, runs a fixed number of
//! frames and logs every collision. Usage:
//!
//! ```text
//! sandbox [engine.toml|engine.ron] [scene.ron]
//! ```

use scene_engine::prelude::*;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

const FRAMES: u64 = 600;
const FIXED_DELTA: f32 = 1.0 / 60.0;
const BALLS: usize = 8;

#[derive(Error, Debug)]
enum SandboxError {
    #[error("Config error: {0}")]
    Config(#[from] scene_engine::config::ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Builds the scene and counts collisions
struct Sandbox {
    description: Option<SceneDescription>,
    collisions: Rc<Cell<usize>>,
    /// Stands in for a host audio callback
    audio: Option<AudioStream>,
    buffer: Vec<f32>,
}

impl Sandbox {
    fn spawn_default_scene(scene: &mut Scene, ball_mesh: AssetHandle) -> Result<(), AppError> {
        let floor = scene.create_entity("floor", None, EntityKind::Default)?;
        scene.reposition(floor, Vec3::new(0.0, -1.0, 0.0))?;
        if let Some(mut entity) = scene.entity_mut(floor) {
            entity
                .attach_collider(Collider::cuboid(Vec3::new(10.0, 0.5, 10.0)).with_static(true))?
                .attach_graphics(Graphics::default())?;
        }

        let camera = scene.create_entity("camera", None, EntityKind::Camera)?;
        scene.reposition(camera, Vec3::new(0.0, 4.0, 14.0))?;

        let chime = Arc::new(ToneSynth::new(660.0));
        for i in 0..BALLS {
            let name = format!("ball{}", i);
            let angle = i as f32 / BALLS as f32 * std::f32::consts::TAU;
            let id = scene.create_entity(&name, None, EntityKind::Default)?;
            scene.reposition(id, Vec3::new(3.0 * angle.cos(), 2.0 + i as f32 * 0.5, 3.0 * angle.sin()))?;
            scene.update_transform(id, |node| node.set_velocity(Vec3::new(-angle.cos(), 0.0, -angle.sin())))?;
            if let Some(mut entity) = scene.entity_mut(id) {
                entity
                    .attach_collider(Collider::sphere(0.4))?
                    .attach_rigid_body(RigidBody {
                        restitution: 0.8,
                        ..Default::default()
                    })?
                    .attach_graphics(Graphics::with_mesh(ball_mesh))?
                    .attach_audio(AudioSource::new(chime.clone(), VoiceParams::default()).on_collision())?;
            }
        }
        Ok(())
    }
}

impl Application for Sandbox {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Building sandbox scene...");
        match &self.description {
            Some(description) => {
                let created = description.build_into(engine.scene_mut())?;
                log::info!("Loaded {} entities from description", created.len());
            }
            None => {
                let ball_mesh = engine.assets_mut().request("meshes/sphere.obj", AssetKind::Mesh);
                Self::spawn_default_scene(engine.scene_mut(), ball_mesh)?;
            }
        }

        let counter = Rc::clone(&self.collisions);
        engine
            .notifications_mut()
            .observe(EventKind::Collision, None, move |event: &Event| {
                counter.set(counter.get() + 1);
                if let (Some(sender), Some(other)) = (event.sender, event.get_entity("other")) {
                    log::debug!(
                        "Collision {} -> {} (depth {:.3})",
                        sender,
                        other,
                        event.get_scalar("depth").unwrap_or_default()
                    );
                }
            });
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        if let Some(stream) = self.audio.as_mut() {
            let samples = (stream.sample_rate() as f32 * delta_time) as usize;
            self.buffer.resize(samples, 0.0);
            stream.fill(&mut self.buffer);
        }
        if engine.frame_index() > 0 && engine.frame_index() % 120 == 0 {
            let report = engine.last_report();
            log::info!(
                "Frame {}: {} candidates, {} contacts, {} swaps",
                report.frame_index,
                report.candidate_pairs,
                report.contacts,
                report.sweep.swaps
            );
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!(
            "Sandbox done after {} frames, {} collision notifications",
            engine.frame_index(),
            self.collisions.get()
        );
    }
}

fn main() -> Result<(), SandboxError> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => {
            log::info!("Loading engine config from {}", path);
            EngineConfig::load_from_file(path)?
        }
        None => EngineConfig {
            physics: scene_engine::PhysicsConfig {
                gravity: Vec3::new(0.0, -9.81, 0.0),
            },
            ..Default::default()
        },
    };
    if config.fixed_delta.is_none() {
        config.fixed_delta = Some(FIXED_DELTA);
    }
    let description = args
        .next()
        .map(|path| SceneDescription::load_from_file(path))
        .transpose()?;

    let mut engine = Engine::new(config)?;
    let mut sandbox = Sandbox {
        description,
        collisions: Rc::new(Cell::new(0)),
        audio: engine.take_audio_stream(),
        buffer: Vec::new(),
    };

    let stopwatch = Stopwatch::start_new();
    engine.run(&mut sandbox, Some(FRAMES))?;
    log::info!("Simulated {} frames in {:.1} ms", FRAMES, stopwatch.elapsed_millis());
    Ok(())
}
