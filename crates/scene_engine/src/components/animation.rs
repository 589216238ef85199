//! Animation components

use crate::foundation::math::Vec3;
use crate::scene::TransformNode;

/// Outcome of one animation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStatus {
    /// Still playing
    Running,
    /// Completed during this step; reported exactly once
    Finished,
    /// Completed earlier, nothing left to do
    Idle,
}

/// Time-driven change of a transform node
pub trait Animation {
    /// Called once when the owning entity is initialized
    fn init(&mut self, _node: &TransformNode) {}

    /// Advance by `delta_time` seconds
    fn animate(&mut self, node: &mut TransformNode, delta_time: f32) -> AnimationStatus;

    /// Rewind to the initial state
    fn reset(&mut self) {}
}

/// Continuous rotation about a fixed axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    /// Rotation axis (need not be normalized)
    pub axis: Vec3,
    /// Radians per second
    pub rate: f32,
}

impl Spin {
    /// Spin about `axis` at `rate` radians per second
    pub fn new(axis: Vec3, rate: f32) -> Self {
        Self { axis, rate }
    }
}

impl Animation for Spin {
    fn animate(&mut self, node: &mut TransformNode, delta_time: f32) -> AnimationStatus {
        node.rotate(self.rate * delta_time, self.axis);
        AnimationStatus::Running
    }
}

/// Linear translation by `offset` over `duration` seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    offset: Vec3,
    duration: f32,
    elapsed: f32,
    done: bool,
}

impl Tween {
    /// Move by `offset` over `duration` seconds; a non-positive duration
    /// jumps on the first step
    pub fn new(offset: Vec3, duration: f32) -> Self {
        Self {
            offset,
            duration: duration.max(0.0),
            elapsed: 0.0,
            done: false,
        }
    }

    /// Fraction of the tween completed, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return if self.done { 1.0 } else { 0.0 };
        }
        (self.elapsed / self.duration).min(1.0)
    }
}

impl Animation for Tween {
    fn animate(&mut self, node: &mut TransformNode, delta_time: f32) -> AnimationStatus {
        if self.done {
            return AnimationStatus::Idle;
        }

        let before = self.progress();
        self.elapsed += delta_time.max(0.0);
        let after = if self.duration <= 0.0 { 1.0 } else { self.progress() };
        node.translate(self.offset * (after - before));

        if after >= 1.0 {
            self.done = true;
            AnimationStatus::Finished
        } else {
            AnimationStatus::Running
        }
    }

    fn reset(&mut self) {
        self.elapsed = 0.0;
        self.done = false;
    }
}
