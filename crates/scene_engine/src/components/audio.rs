//! Audio source component

use crate::audio::{Synthesizer, VoiceParams};
use std::sync::Arc;

/// Sound an entity can play through the mixer
///
/// Playback is requested with [`AudioSource::trigger`] and handed to the
/// audio stream during the render stage.
#[derive(Clone)]
pub struct AudioSource {
    synth: Arc<dyn Synthesizer>,
    /// Voice shaping for every playback
    pub params: VoiceParams,
    /// Trigger automatically on every confirmed collision
    pub play_on_collision: bool,
    triggered: bool,
}

impl AudioSource {
    /// Source playing `synth` with `params`
    pub fn new(synth: Arc<dyn Synthesizer>, params: VoiceParams) -> Self {
        Self {
            synth,
            params,
            play_on_collision: false,
            triggered: false,
        }
    }

    /// Trigger on collisions (builder pattern)
    pub fn on_collision(mut self) -> Self {
        self.play_on_collision = true;
        self
    }

    /// Request playback at the next render stage
    pub fn trigger(&mut self) {
        self.triggered = true;
    }

    /// Whether playback is pending
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Consume a pending trigger, returning what to play
    pub(crate) fn take_trigger(&mut self) -> Option<(Arc<dyn Synthesizer>, VoiceParams)> {
        if std::mem::take(&mut self.triggered) {
            Some((Arc::clone(&self.synth), self.params))
        } else {
            None
        }
    }
}

impl std::fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSource")
            .field("params", &self.params)
            .field("play_on_collision", &self.play_on_collision)
            .field("triggered", &self.triggered)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneSynth;

    #[test]
    fn test_trigger_is_consumed_once() {
        let mut source = AudioSource::new(Arc::new(ToneSynth::new(440.0)), VoiceParams::default());
        assert!(source.take_trigger().is_none());

        source.trigger();
        assert!(source.is_triggered());
        assert!(source.take_trigger().is_some());
        assert!(source.take_trigger().is_none());
    }
}
