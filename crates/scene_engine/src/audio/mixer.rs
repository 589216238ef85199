//! Lock-free handoff between the frame thread and the audio callback

use super::{AudioConfig, Synthesizer, VoiceParams};
use crate::scene::EntityId;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::Arc;

/// Request sent from the frame thread to the audio callback
pub enum AudioCommand {
    /// Start a new voice
    Play {
        /// Sample generator
        synth: Arc<dyn Synthesizer>,
        /// Voice shaping
        params: VoiceParams,
        /// Entity the voice belongs to, for targeted stops
        source: Option<EntityId>,
    },
    /// Stop every voice started by an entity
    Stop(EntityId),
    /// Stop every voice
    StopAll,
    /// Change the output gain
    SetMasterVolume(f32),
}

/// Frame-thread side: queues commands, never blocks
pub struct AudioMixer {
    sender: Sender<AudioCommand>,
    dropped: u64,
}

/// Callback side: owns the active voices
pub struct AudioStream {
    receiver: Receiver<AudioCommand>,
    voices: Vec<Voice>,
    sample_rate: u32,
    master_volume: f32,
}

struct Voice {
    synth: Arc<dyn Synthesizer>,
    params: VoiceParams,
    source: Option<EntityId>,
    cursor: u64,
}

/// Create a connected mixer/stream pair
pub fn audio_channel(config: &AudioConfig) -> (AudioMixer, AudioStream) {
    let (sender, receiver) = bounded(config.command_capacity.max(1));
    let mixer = AudioMixer { sender, dropped: 0 };
    let stream = AudioStream {
        receiver,
        voices: Vec::new(),
        sample_rate: config.sample_rate,
        master_volume: config.master_volume.clamp(0.0, 1.0),
    };
    (mixer, stream)
}

impl AudioMixer {
    /// Queue a voice; returns false if the command was dropped
    pub fn play(&mut self, synth: Arc<dyn Synthesizer>, params: VoiceParams, source: Option<EntityId>) -> bool {
        self.send(AudioCommand::Play { synth, params, source })
    }

    /// Stop the voices of one entity
    pub fn stop(&mut self, source: EntityId) -> bool {
        self.send(AudioCommand::Stop(source))
    }

    /// Stop every voice
    pub fn stop_all(&mut self) -> bool {
        self.send(AudioCommand::StopAll)
    }

    /// Change the output gain
    pub fn set_master_volume(&mut self, volume: f32) -> bool {
        self.send(AudioCommand::SetMasterVolume(volume))
    }

    /// Commands lost to a full channel or a dropped stream
    pub fn dropped_commands(&self) -> u64 {
        self.dropped
    }

    fn send(&mut self, command: AudioCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::warn!("Audio command queue full, dropping command");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                log::debug!("Audio stream gone, dropping command");
                false
            }
        }
    }
}

impl AudioStream {
    /// Fill `output` with the mix of all active voices
    ///
    /// Called from the host audio callback. Returns the number of voices
    /// still playing afterwards.
    pub fn fill(&mut self, output: &mut [f32]) -> usize {
        self.drain_commands();

        output.fill(0.0);
        let sample_rate = self.sample_rate;
        self.voices
            .retain_mut(|voice| !voice.synth.generate(output, &mut voice.cursor, sample_rate, &voice.params));

        if self.master_volume < 1.0 {
            for sample in output.iter_mut() {
                *sample *= self.master_volume;
            }
        }
        self.voices.len()
    }

    /// Voices currently playing
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Output samples per second
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.receiver.try_recv() {
            match command {
                AudioCommand::Play { synth, params, source } => self.voices.push(Voice {
                    synth,
                    params,
                    source,
                    cursor: 0,
                }),
                AudioCommand::Stop(entity) => self.voices.retain(|voice| voice.source != Some(entity)),
                AudioCommand::StopAll => self.voices.clear(),
                AudioCommand::SetMasterVolume(volume) => self.master_volume = volume.clamp(0.0, 1.0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneSynth;

    fn short_voice() -> VoiceParams {
        VoiceParams {
            volume: 1.0,
            duration: 0.01,
            fade_in: 0.0,
            fade_out: 0.0,
        }
    }

    fn config(capacity: usize) -> AudioConfig {
        AudioConfig {
            sample_rate: 1000,
            master_volume: 1.0,
            command_capacity: capacity,
        }
    }

    #[test]
    fn test_voice_plays_until_complete() {
        let (mut mixer, mut stream) = audio_channel(&config(8));
        assert!(mixer.play(Arc::new(ToneSynth::new(100.0)), short_voice(), None));

        let mut buffer = [0.0; 4];
        assert_eq!(stream.fill(&mut buffer), 1);
        assert!(buffer.iter().any(|s| *s != 0.0));
        assert_eq!(stream.fill(&mut buffer), 1);
        // 10 samples total: the third buffer completes the voice
        assert_eq!(stream.fill(&mut buffer), 0);
    }

    #[test]
    fn test_full_queue_drops_command() {
        let (mut mixer, _stream) = audio_channel(&config(1));
        assert!(mixer.stop_all());
        assert!(!mixer.stop_all());
        assert_eq!(mixer.dropped_commands(), 1);
    }

    #[test]
    fn test_targeted_stop() {
        let (mut mixer, mut stream) = audio_channel(&config(8));
        let synth: Arc<dyn Synthesizer> = Arc::new(ToneSynth::new(100.0));
        let long = VoiceParams {
            duration: 10.0,
            ..short_voice()
        };
        mixer.play(Arc::clone(&synth), long, Some(EntityId::new(1)));
        mixer.play(Arc::clone(&synth), long, Some(EntityId::new(2)));

        let mut buffer = [0.0; 4];
        assert_eq!(stream.fill(&mut buffer), 2);
        mixer.stop(EntityId::new(1));
        assert_eq!(stream.fill(&mut buffer), 1);
    }

    #[test]
    fn test_stream_runs_on_another_thread() {
        let (mut mixer, mut stream) = audio_channel(&config(8));
        mixer.set_master_volume(0.5);
        mixer.play(Arc::new(ToneSynth::new(100.0)), short_voice(), None);

        let handle = std::thread::spawn(move || {
            let mut buffer = [0.0; 32];
            stream.fill(&mut buffer)
        });
        assert_eq!(handle.join().ok(), Some(0));
    }

    #[test]
    fn test_silence_without_voices() {
        let (_mixer, mut stream) = audio_channel(&config(8));
        let mut buffer = [1.0; 8];
        assert_eq!(stream.fill(&mut buffer), 0);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }
}
