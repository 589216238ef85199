//! Synthesizer contract and a reference tone generator

use crate::foundation::math::constants::PI;
use serde::{Deserialize, Serialize};

/// Shaping of one playing voice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParams {
    /// Linear gain
    pub volume: f32,
    /// Seconds until the voice completes
    pub duration: f32,
    /// Seconds of linear fade at the start
    pub fade_in: f32,
    /// Seconds of linear fade before `duration`
    pub fade_out: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            volume: 0.5,
            duration: 0.25,
            fade_in: 0.01,
            fade_out: 0.05,
        }
    }
}

impl VoiceParams {
    /// Envelope gain at `time` seconds into the voice
    pub fn envelope(&self, time: f32) -> f32 {
        if time < 0.0 || time >= self.duration {
            return 0.0;
        }
        let attack = if self.fade_in > 0.0 { time / self.fade_in } else { 1.0 };
        let remaining = self.duration - time;
        let release = if self.fade_out > 0.0 { remaining / self.fade_out } else { 1.0 };
        attack.min(release).clamp(0.0, 1.0)
    }
}

/// Sample generator driven by an external frame cursor
///
/// Runs on the audio callback, so implementations must not block.
pub trait Synthesizer: Send + Sync {
    /// Add `output.len()` samples into `output` starting at `cursor`, advance
    /// `cursor` by that many samples and report whether the voice is complete
    /// (`cursor / sample_rate >= params.duration`).
    fn generate(&self, output: &mut [f32], cursor: &mut u64, sample_rate: u32, params: &VoiceParams) -> bool;
}

/// Sine wave at a fixed frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSynth {
    /// Hertz
    pub frequency: f32,
}

impl ToneSynth {
    /// Tone at `frequency` Hz
    pub fn new(frequency: f32) -> Self {
        Self { frequency }
    }
}

impl Synthesizer for ToneSynth {
    fn generate(&self, output: &mut [f32], cursor: &mut u64, sample_rate: u32, params: &VoiceParams) -> bool {
        let rate = f64::from(sample_rate.max(1));
        for (offset, sample) in output.iter_mut().enumerate() {
            let time = ((*cursor + offset as u64) as f64 / rate) as f32;
            if time >= params.duration {
                break;
            }
            let phase = 2.0 * PI * self.frequency * time;
            *sample += params.volume * params.envelope(time) * phase.sin();
        }
        *cursor += output.len() as u64;
        *cursor as f64 / rate >= f64::from(params.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_envelope_shape() {
        let params = VoiceParams {
            volume: 1.0,
            duration: 1.0,
            fade_in: 0.1,
            fade_out: 0.2,
        };
        assert_relative_eq!(params.envelope(0.05), 0.5, epsilon = 1e-5);
        assert_relative_eq!(params.envelope(0.5), 1.0);
        assert_relative_eq!(params.envelope(0.9), 0.5, epsilon = 1e-5);
        assert_eq!(params.envelope(1.0), 0.0);
    }

    #[test]
    fn test_generate_advances_cursor_and_completes() {
        let synth = ToneSynth::new(440.0);
        let params = VoiceParams {
            duration: 0.01,
            ..Default::default()
        };
        let mut cursor = 0;
        let mut buffer = vec![0.0; 64];

        // 1000 Hz: the voice lasts 10 samples
        assert!(!synth.generate(&mut buffer[..8], &mut cursor, 1000, &params));
        assert_eq!(cursor, 8);
        assert!(synth.generate(&mut buffer[8..16], &mut cursor, 1000, &params));
        assert_eq!(cursor, 16);
        assert!(buffer[10..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_generate_is_additive() {
        let synth = ToneSynth::new(100.0);
        let params = VoiceParams {
            volume: 1.0,
            duration: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
        };
        let mut single = vec![0.0; 32];
        synth.generate(&mut single, &mut 0, 8000, &params);

        let mut double = vec![0.0; 32];
        synth.generate(&mut double, &mut 0, 8000, &params);
        synth.generate(&mut double, &mut 0, 8000, &params);

        for (a, b) in single.iter().zip(&double) {
            assert_relative_eq!(a * 2.0, *b, epsilon = 1e-6);
        }
    }
}
