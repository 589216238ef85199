//! Input snapshot and sources
//!
//! Window-system polling happens outside the engine. An [`InputSource`]
//! turns whatever the host collected into one [`InputState`] per frame,
//! which every input controller then reads.

use std::collections::{HashSet, VecDeque};

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// W key
    W,
    /// A key
    A,
    /// S key
    S,
    /// D key
    D,
    /// Q key
    Q,
    /// E key
    E,
    /// R key
    R,
    /// P key
    P,
    /// Space key
    Space,
    /// Left shift key
    LeftShift,
    /// Escape key
    Escape,
}

/// Input collected for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pressed: HashSet<KeyCode>,
    mouse_delta: (f32, f32),
    quit_requested: bool,
}

impl InputState {
    /// Mark a key as held
    pub fn press(&mut self, key: KeyCode) {
        self.pressed.insert(key);
    }

    /// Mark a key as released
    pub fn release(&mut self, key: KeyCode) {
        self.pressed.remove(&key);
    }

    /// Whether a key is held this frame
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Mouse motion since the previous frame
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// Record mouse motion since the previous frame
    pub fn set_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta = (dx, dy);
    }

    /// Ask the frame loop to stop
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    /// Whether the window was closed or Escape pressed
    pub fn quit_requested(&self) -> bool {
        self.quit_requested || self.is_key_pressed(KeyCode::Escape)
    }
}

/// Produces one input snapshot per frame
pub trait InputSource {
    /// Poll the host for this frame's input
    fn poll(&mut self) -> InputState;
}

/// No input at all, for headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInput;

impl InputSource for NullInput {
    fn poll(&mut self) -> InputState {
        InputState::default()
    }
}

/// Replays prepared snapshots, then reports no input
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    frames: VecDeque<InputState>,
}

impl ScriptedInput {
    /// Replay `frames` in order
    pub fn new(frames: impl IntoIterator<Item = InputState>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Append a frame
    pub fn push(&mut self, state: InputState) {
        self.frames.push_back(state);
    }

    /// Frames not yet replayed
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputState {
        self.frames.pop_front().unwrap_or_default()
    }
}
