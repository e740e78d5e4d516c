use std::f64::consts::TAU;
use std::sync::Arc;

use crate::automation::ParamTimeline;
use crate::dsp::Lowpass;
use crate::tone::Waveform;
use crate::wavetable::Wavetable;

/// Oscillator source for one voice.
#[derive(Debug, Clone)]
pub enum Source {
    Primitive(Waveform),
    Table(Arc<Wavetable>),
}

impl Source {
    /// One sample at `phase` (cycles).
    pub fn sample(&self, phase: f64) -> f32 {
        match self {
            Source::Table(table) => table.sample(phase),
            Source::Primitive(w) => primitive_sample(*w, phase),
        }
    }
}

/// Naive (non-band-limited) primitive shapes, phase in cycles.
pub fn primitive_sample(waveform: Waveform, phase: f64) -> f32 {
    let p = phase.rem_euclid(1.0);
    let v = match waveform {
        // No table supplied: fall back to the fundamental alone.
        Waveform::Sine | Waveform::Harmonic => (TAU * p).sin(),
        Waveform::Square => {
            if p < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Sawtooth => 2.0 * p - 1.0,
        Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
    };
    v as f32
}

/// A fully scheduled pluck: oscillator → lowpass → gain, on the audio clock.
/// Each voice is independent; nothing else ever stops or retunes it.
#[derive(Debug, Clone)]
pub struct Voice {
    pub string: usize,
    /// Oscillator frequency, fixed for the life of the voice.
    pub frequency: f64,
    pub source: Source,
    pub filter_q: f64,
    pub cutoff: ParamTimeline,
    pub gain: ParamTimeline,
    /// Audio-clock start time (seconds).
    pub start: f64,
    /// Audio-clock stop time (seconds). The voice is dropped here.
    pub stop: f64,
}

/// A voice plus its oscillator and filter state while it renders.
pub struct VoiceState {
    voice: Voice,
    phase: f64,
    filter: Lowpass,
    finished: bool,
}

impl VoiceState {
    pub fn new(voice: Voice) -> Self {
        Self {
            voice,
            phase: 0.0,
            filter: Lowpass::new(),
            finished: false,
        }
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Mix this voice into `out`, whose first sample sits at audio time `t0`.
    pub fn render_add(&mut self, out: &mut [f32], t0: f64, sample_rate: f64) {
        if self.finished {
            return;
        }
        let dt = 1.0 / sample_rate;
        let phase_inc = self.voice.frequency * dt;

        for (j, sample) in out.iter_mut().enumerate() {
            let t = t0 + j as f64 * dt;
            if t < self.voice.start {
                continue;
            }
            if t >= self.voice.stop {
                self.finished = true;
                break;
            }

            let osc = self.voice.source.sample(self.phase) as f64;
            self.phase = (self.phase + phase_inc).fract();

            let cutoff = self.voice.cutoff.value_at(t);
            self.filter.set(cutoff, self.voice.filter_q, sample_rate);
            let filtered = self.filter.process(osc);

            *sample += (filtered * self.voice.gain.value_at(t)) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{compute_rms, goertzel_magnitude};
    use crate::wavetable::HarmonicSpectrum;

    fn test_voice(source: Source, frequency: f64, start: f64, stop: f64) -> Voice {
        let mut cutoff = ParamTimeline::new(350.0);
        cutoff
            .set_value_at_time(3000.0, start)
            .exponential_ramp_to_value_at_time(frequency + 0.1, stop);
        let mut gain = ParamTimeline::new(1.0);
        gain.set_value_at_time(0.0, start)
            .linear_ramp_to_value_at_time(0.8, start + 0.015)
            .exponential_ramp_to_value_at_time(0.001, stop);
        Voice {
            string: 3,
            frequency,
            source,
            filter_q: 1.0,
            cutoff,
            gain,
            start,
            stop,
        }
    }

    #[test]
    fn test_primitive_shapes() {
        assert!(primitive_sample(Waveform::Sine, 0.25) > 0.999);
        assert_eq!(primitive_sample(Waveform::Square, 0.1), 1.0);
        assert_eq!(primitive_sample(Waveform::Square, 0.6), -1.0);
        assert_eq!(primitive_sample(Waveform::Sawtooth, 0.0), -1.0);
        assert_eq!(primitive_sample(Waveform::Sawtooth, 0.5), 0.0);
        assert_eq!(primitive_sample(Waveform::Triangle, 0.5), 1.0);
        assert_eq!(primitive_sample(Waveform::Triangle, 0.0), -1.0);
    }

    #[test]
    fn test_silent_before_start() {
        let mut v = VoiceState::new(test_voice(Source::Primitive(Waveform::Sawtooth), 196.0, 0.1, 1.0));
        let mut out = vec![0.0f32; 4800]; // 0.0–0.1s at 48kHz
        v.render_add(&mut out, 0.0, 48000.0);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!v.is_finished());
    }

    #[test]
    fn test_finishes_at_stop() {
        let mut v = VoiceState::new(test_voice(Source::Primitive(Waveform::Sawtooth), 196.0, 0.0, 0.05));
        let mut out = vec![0.0f32; 4800];
        v.render_add(&mut out, 0.0, 48000.0);
        assert!(v.is_finished());
        assert!(out[..2400].iter().any(|&s| s != 0.0));
        assert!(out[2401..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_table_voice_sounds_at_its_frequency() {
        let table = Arc::new(Wavetable::from_spectrum(&HarmonicSpectrum::plucked(32), 2048));
        let freq = 196.0;
        let mut v = VoiceState::new(test_voice(Source::Table(table), freq, 0.0, 2.0));
        let mut out = vec![0.0f32; 9600];
        v.render_add(&mut out, 0.0, 48000.0);

        let window = &out[960..];
        assert!(compute_rms(window) > 0.05);
        let fundamental = goertzel_magnitude(window, freq, 48000.0, window.len());
        let off = goertzel_magnitude(window, freq * 1.5, 48000.0, window.len());
        assert!(fundamental > 5.0 * off);
    }

    #[test]
    fn test_overlapping_voices_add() {
        let mut a = VoiceState::new(test_voice(Source::Primitive(Waveform::Sine), 220.0, 0.0, 1.0));
        let mut b = VoiceState::new(test_voice(Source::Primitive(Waveform::Sine), 220.0, 0.0, 1.0));
        let mut single = vec![0.0f32; 2400];
        let mut both = vec![0.0f32; 2400];
        a.render_add(&mut single, 0.0, 48000.0);
        let mut a2 = VoiceState::new(test_voice(Source::Primitive(Waveform::Sine), 220.0, 0.0, 1.0));
        a2.render_add(&mut both, 0.0, 48000.0);
        b.render_add(&mut both, 0.0, 48000.0);
        for (s, d) in single.iter().zip(both.iter()) {
            assert!((2.0 * s - d).abs() < 1e-5);
        }
    }
}
