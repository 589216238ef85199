//! Frame scheduler
//!
//! Runs the fixed stage order once per frame:
//!
//! ```text
//! poll-input → dispatch-input → animate → update-colliders → broad-phase
//!   → narrow-phase → integrate → render → advance-snapshots → process-timers
//! ```
//!
//! Every stage walks the entity pool in allocation order and skips disabled
//! entities and entities lacking the stage's component. Events queued by a
//! stage are delivered to the notification center before the next stage
//! starts. Reset and pause requests are deferred to `process-timers`.

use crate::audio::AudioMixer;
use crate::components::{AnimationStatus, Capabilities};
use crate::events::{Event, EventKind, NotificationCenter};
use crate::foundation::math::Vec3;
use crate::input::{InputSource, InputState};
use crate::physics::{CollisionSystem, SweepStats};
use crate::render::{self, FrameContext, ProjectionConfig, Renderer};
use crate::scene::{EntityId, Scene};

/// Stages of one frame, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameStage {
    /// Collect this frame's input snapshot
    PollInput = 0,
    /// Run input controllers
    DispatchInput = 1,
    /// Advance animations and particle emitters
    Animate = 2,
    /// Refresh collider boxes from world transforms
    UpdateColliders = 3,
    /// Incremental sweep-and-prune resort
    BroadPhase = 4,
    /// Exact tests and collision response
    NarrowPhase = 5,
    /// Rigid body integration
    Integrate = 6,
    /// External rendering and audio triggers
    Render = 7,
    /// Snapshot world transforms as the previous frame's
    AdvanceSnapshots = 8,
    /// Deliver due timers and apply deferred reset/pause
    ProcessTimers = 9,
}

impl FrameStage {
    /// Every stage in execution order
    pub const ORDER: [Self; 10] = [
        Self::PollInput,
        Self::DispatchInput,
        Self::Animate,
        Self::UpdateColliders,
        Self::BroadPhase,
        Self::NarrowPhase,
        Self::Integrate,
        Self::Render,
        Self::AdvanceSnapshots,
        Self::ProcessTimers,
    ];

    /// Whether the stage is skipped while the simulation is paused
    pub const fn pausable(self) -> bool {
        matches!(
            self,
            Self::Animate | Self::UpdateColliders | Self::BroadPhase | Self::NarrowPhase | Self::Integrate
        )
    }
}

/// Whether the frame loop should go on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStatus {
    /// Keep running
    #[default]
    Continue,
    /// Quit was requested
    Stop,
}

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Index of the frame, starting at zero
    pub frame_index: u64,
    /// Seconds simulated
    pub delta_time: f32,
    /// Continue or stop
    pub status: FrameStatus,
    /// Whether the pausable stages were skipped
    pub paused: bool,
    /// Stages that ran, in order
    pub stages: Vec<FrameStage>,
    /// Pairs overlapping in the broad phase
    pub candidate_pairs: usize,
    /// Confirmed contacts
    pub contacts: usize,
    /// Broad phase work
    pub sweep: SweepStats,
    /// Entities handed to the renderer
    pub rendered: usize,
    /// Events delivered to observers
    pub events_delivered: usize,
}

/// Borrowed engine state one frame operates on
pub struct FrameParts<'a> {
    /// Entity tree
    pub scene: &'a mut Scene,
    /// Broad/narrow phase state
    pub collisions: &'a mut CollisionSystem,
    /// Observer registry and timers
    pub notifications: &'a mut NotificationCenter,
    /// Input polling
    pub input: &'a mut dyn InputSource,
    /// External renderer
    pub renderer: &'a mut dyn Renderer,
    /// Audio command queue
    pub audio: &'a mut AudioMixer,
    /// World gravity for rigid bodies
    pub gravity: Vec3,
    /// Camera projection
    pub projection: &'a ProjectionConfig,
}

/// Per-frame driver
///
/// Holds only scratch state (the input snapshot and frame counter) plus the
/// deferred control requests.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    frame_index: u64,
    input: InputState,
    paused: bool,
    pause_request: Option<bool>,
    reset_requested: bool,
    quit_requested: bool,
}

impl FrameScheduler {
    /// Fresh scheduler at frame zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames completed so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Whether the pausable stages are currently skipped
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Input snapshot of the current (or last) frame
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Restore the scene's initial state at the end of the next frame
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Pause or resume at the end of the next frame
    pub fn request_pause(&mut self, paused: bool) {
        self.pause_request = Some(paused);
    }

    /// Make the current (or next) frame report `Stop`
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    /// Run every stage once
    pub fn run_frame(&mut self, parts: FrameParts<'_>, delta_time: f32) -> FrameReport {
        let FrameParts {
            scene,
            collisions,
            notifications,
            input,
            renderer,
            audio,
            gravity,
            projection,
        } = parts;

        let mut report = FrameReport {
            frame_index: self.frame_index,
            delta_time,
            paused: self.paused,
            ..Default::default()
        };
        let ids: Vec<EntityId> = scene.ids().collect();

        for stage in FrameStage::ORDER {
            if self.paused && stage.pausable() {
                continue;
            }
            match stage {
                FrameStage::PollInput => {
                    self.input = input.poll();
                    if self.input.quit_requested() {
                        log::info!("Quit requested by input");
                        self.quit_requested = true;
                    }
                }
                FrameStage::DispatchInput => self.dispatch_input(scene, &ids, delta_time),
                FrameStage::Animate => Self::animate(scene, &ids, delta_time),
                FrameStage::UpdateColliders => {
                    collisions.update_colliders(scene);
                }
                FrameStage::BroadPhase => {
                    report.sweep = collisions.broad_phase();
                    report.candidate_pairs = collisions.sweep_and_prune().overlapping_pairs().len();
                }
                FrameStage::NarrowPhase => report.contacts = collisions.resolve(scene).len(),
                FrameStage::Integrate => Self::integrate(scene, &ids, gravity, delta_time),
                FrameStage::Render => {
                    let frame = FrameContext::from_scene(scene, projection, delta_time, self.frame_index);
                    report.rendered = render::render_scene(scene, renderer, &frame);
                    Self::trigger_audio(scene, &ids, audio);
                }
                FrameStage::AdvanceSnapshots => scene.next_frame(),
                FrameStage::ProcessTimers => {
                    notifications.advance_time(delta_time);
                    report.events_delivered += notifications.dispatch_due();
                    self.apply_deferred(scene, notifications, audio);
                }
            }
            report.stages.push(stage);
            report.events_delivered += Self::deliver(scene, notifications);
        }

        report.status = if self.quit_requested {
            FrameStatus::Stop
        } else {
            FrameStatus::Continue
        };
        log::debug!(
            "Frame {}: {} candidates, {} contacts, {} swaps, {} drawn",
            report.frame_index,
            report.candidate_pairs,
            report.contacts,
            report.sweep.swaps,
            report.rendered
        );
        self.frame_index += 1;
        report
    }

    fn deliver(scene: &mut Scene, notifications: &mut NotificationCenter) -> usize {
        scene.drain_events().iter().map(|event| notifications.notify(event)).sum()
    }

    fn dispatch_input(&self, scene: &mut Scene, ids: &[EntityId], delta_time: f32) {
        for &id in ids {
            let Some(entity) = scene.slot_mut(id) else {
                continue;
            };
            if !entity.participates(Capabilities::INPUT) {
                continue;
            }
            if let Some(controller) = entity.components.input.as_mut() {
                controller.handle_input(&mut entity.transform, &self.input, delta_time);
            }
            scene.commit(id);
        }
    }

    fn animate(scene: &mut Scene, ids: &[EntityId], delta_time: f32) {
        for &id in ids {
            let Some(entity) = scene.slot_mut(id) else {
                continue;
            };
            if !entity.participates(Capabilities::ANIMATION) {
                continue;
            }
            let status = entity
                .components
                .animation
                .as_mut()
                .map(|animation| animation.animate(&mut entity.transform, delta_time));
            scene.commit(id);
            if status == Some(AnimationStatus::Finished) {
                log::debug!("Animation finished on {}", id);
                scene.queue_event(Event::from_sender(EventKind::AnimationFinished, id));
            }
        }

        // Emitters follow the already animated world position
        for &id in ids {
            let Some(origin) = scene.world_position(id) else {
                continue;
            };
            let Some(entity) = scene.slot_mut(id) else {
                continue;
            };
            if !entity.participates(Capabilities::PARTICLES) {
                continue;
            }
            if let Some(emitter) = entity.components.particles.as_mut() {
                emitter.update(origin, delta_time);
            }
        }
    }

    fn integrate(scene: &mut Scene, ids: &[EntityId], gravity: Vec3, delta_time: f32) {
        for &id in ids {
            let Some(entity) = scene.slot_mut(id) else {
                continue;
            };
            if !entity.participates(Capabilities::RIGID_BODY) {
                continue;
            }
            if let Some(body) = entity.components.rigid_body {
                body.integrate(&mut entity.transform, gravity, delta_time);
            }
            scene.commit(id);
        }
    }

    fn trigger_audio(scene: &mut Scene, ids: &[EntityId], audio: &mut AudioMixer) {
        for &id in ids {
            let Some(entity) = scene.slot_mut(id) else {
                continue;
            };
            if !entity.participates(Capabilities::AUDIO) {
                continue;
            }
            if let Some((synth, params)) = entity.components.audio.as_mut().and_then(|a| a.take_trigger()) {
                audio.play(synth, params, Some(id));
            }
        }
    }

    fn apply_deferred(&mut self, scene: &mut Scene, notifications: &mut NotificationCenter, audio: &mut AudioMixer) {
        if std::mem::take(&mut self.reset_requested) {
            scene.reset_to_initial();
            notifications.clear_timers();
            audio.stop_all();
        }
        if let Some(paused) = self.pause_request.take() {
            if paused != self.paused {
                log::info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }
            self.paused = paused;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_fixed() {
        let mut sorted = FrameStage::ORDER;
        sorted.sort();
        assert_eq!(sorted, FrameStage::ORDER);
        assert_eq!(FrameStage::ORDER.first(), Some(&FrameStage::PollInput));
        assert_eq!(FrameStage::ORDER.last(), Some(&FrameStage::ProcessTimers));
    }

    #[test]
    fn test_pausable_stages() {
        let pausable: Vec<_> = FrameStage::ORDER.into_iter().filter(|s| s.pausable()).collect();
        assert_eq!(
            pausable,
            vec![
                FrameStage::Animate,
                FrameStage::UpdateColliders,
                FrameStage::BroadPhase,
                FrameStage::NarrowPhase,
                FrameStage::Integrate,
            ]
        );
    }

    #[test]
    fn test_requests_are_deferred() {
        let mut scheduler = FrameScheduler::new();
        scheduler.request_pause(true);
        assert!(!scheduler.is_paused());
        scheduler.request_quit();
        assert_eq!(scheduler.frame_index(), 0);
    }
}
