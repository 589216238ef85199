//! Audio boundary
//!
//! The frame thread never touches the voice list. It sends commands through
//! a bounded lock-free channel; the host audio callback owns the voices,
//! drains pending commands without blocking and synthesizes into its buffer.

pub mod mixer;
pub mod synth;

pub use mixer::{audio_channel, AudioCommand, AudioMixer, AudioStream};
pub use synth::{Synthesizer, ToneSynth, VoiceParams};

use serde::{Deserialize, Serialize};

/// Audio output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output samples per second
    pub sample_rate: u32,
    /// Gain applied to the mixed output, clamped to `[0, 1]`
    pub master_volume: f32,
    /// Commands that may be queued between two callbacks
    pub command_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            master_volume: 1.0,
            command_capacity: 64,
        }
    }
}
