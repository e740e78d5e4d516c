//! String synthesizer: (string, delay) trigger → scheduled voice + pulse.
//!
//! The player's chord, capo and tone arrive with every call; the synth only
//! keeps the two process-wide resources, the audio output and the harmonic
//! wavetable, each created at most once.

use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;

use crate::automation::ParamTimeline;
use crate::chords::{ChordLibrary, ChordShape, Fret};
use crate::config::SynthConfig;
use crate::output::{AudioOutput, OutputState};
use crate::pulse::{bounded_delay, PulseScheduler};
use crate::settings::PlayerConfig;
use crate::tone::{Tone, ToneProfile, Waveform};
use crate::tuning::string_frequency;
use crate::types::NUM_STRINGS;
use crate::voice::{Source, Voice};
use crate::wavetable::{HarmonicSpectrum, Wavetable};

/// What a successful pluck put on the audio clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledPluck {
    pub string: usize,
    pub frequency: f64,
    /// Audio-clock start (seconds).
    pub start: f64,
    /// Audio-clock stop (seconds).
    pub stop: f64,
    /// Wall-clock time the visual pulse is due.
    pub pulse_due: Instant,
}

pub struct StringSynth<O: AudioOutput> {
    config: SynthConfig,
    library: ChordLibrary,
    output: Option<O>,
    wavetable: Option<Arc<Wavetable>>,
    pulses: PulseScheduler,
}

impl<O: AudioOutput> StringSynth<O> {
    pub fn new(config: SynthConfig, library: ChordLibrary) -> Self {
        Self {
            config,
            library,
            output: None,
            wavetable: None,
            pulses: PulseScheduler::new(),
        }
    }

    /// Activate audio on a user gesture.
    ///
    /// `open` runs only the first time. Later calls resume the output if the
    /// platform suspended it and otherwise do nothing.
    pub fn init_audio<F>(&mut self, open: F) -> Result<(), String>
    where
        F: FnOnce() -> Result<O, String>,
    {
        if self.output.is_none() {
            let out = open()?;
            info!("Audio output active at {} Hz", out.sample_rate());
            self.output = Some(out);
        } else if let Some(out) = self.output.as_mut() {
            if out.state() == OutputState::Suspended {
                info!("Resuming suspended audio output");
                out.resume();
            }
        }

        if self.wavetable.is_none() {
            let spectrum = HarmonicSpectrum::plucked(self.config.harmonic_bins);
            let table = Wavetable::from_spectrum(&spectrum, self.config.wavetable_len);
            debug!(
                "Built harmonic wavetable: {} bins, {} samples",
                spectrum.len(),
                table.len()
            );
            self.wavetable = Some(Arc::new(table));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.output.is_some()
    }

    pub fn output(&self) -> Option<&O> {
        self.output.as_ref()
    }

    pub fn output_mut(&mut self) -> Option<&mut O> {
        self.output.as_mut()
    }

    pub fn wavetable(&self) -> Option<&Arc<Wavetable>> {
        self.wavetable.as_ref()
    }

    pub fn library(&self) -> &ChordLibrary {
        &self.library
    }

    /// Pluck `string` with the player's current chord, capo and tone.
    pub fn play_string(
        &mut self,
        string: usize,
        player: &PlayerConfig,
        delay: f64,
    ) -> Option<ScheduledPluck> {
        let shape = self.library.lookup(&player.chord);
        self.pluck(string, &shape, player.capo.get(), player.tone, delay)
    }

    /// Pluck `string` of `shape`. Returns None, scheduling nothing, when
    /// audio is not active, the string is muted, or the index is out of
    /// range.
    pub fn pluck(
        &mut self,
        string: usize,
        shape: &ChordShape,
        capo: u8,
        tone: Tone,
        delay: f64,
    ) -> Option<ScheduledPluck> {
        if string >= NUM_STRINGS {
            debug!("String {} out of range", string);
            return None;
        }
        let fret = match shape.get(string) {
            Fret::Fretted(f) => f,
            Fret::Muted => return None,
        };
        let output = self.output.as_mut()?;
        let delay = bounded_delay(delay).as_secs_f64();

        let frequency = string_frequency(string, fret, capo);
        let profile = tone.profile();
        let start = output.current_time() + delay;
        let stop = start + profile.duration;

        let source = match (profile.waveform, &self.wavetable) {
            (Waveform::Harmonic, Some(table)) => Source::Table(Arc::clone(table)),
            (w, _) => Source::Primitive(w),
        };

        let voice = Voice {
            string,
            frequency,
            source,
            filter_q: self.config.filter_q,
            cutoff: cutoff_sweep(&profile, frequency, start),
            gain: gain_envelope(&profile, &self.config, start),
            start,
            stop,
        };
        output.schedule(voice);

        let pulse_due = self.pulses.schedule(string, delay);
        debug!(
            "Pluck string {} fret {}+{} → {:.2} Hz ({}) @ {:.3}s",
            string, fret, capo, frequency, tone, start
        );

        Some(ScheduledPluck {
            string,
            frequency,
            start,
            stop,
            pulse_due,
        })
    }

    /// Pulses whose wall-clock time has come, earliest first.
    pub fn take_due_pulses(&mut self, now: Instant) -> Vec<usize> {
        self.pulses.take_due(now)
    }

    pub fn next_pulse_due(&self) -> Option<Instant> {
        self.pulses.next_due()
    }

    pub fn pending_pulses(&self) -> usize {
        self.pulses.len()
    }
}

/// Lowpass cutoff: starts bright, sweeps exponentially to just above the
/// note's own pitch by the end of the voice.
fn cutoff_sweep(profile: &ToneProfile, frequency: f64, start: f64) -> ParamTimeline {
    let mut t = ParamTimeline::new(profile.filter_start_hz);
    t.set_value_at_time(profile.filter_start_hz, start)
        .exponential_ramp_to_value_at_time(profile.filter_end_hz(frequency), start + profile.duration);
    t
}

/// Gain: silent, linear attack to peak, exponential decay to the floor.
fn gain_envelope(profile: &ToneProfile, config: &SynthConfig, start: f64) -> ParamTimeline {
    let mut t = ParamTimeline::new(0.0);
    t.set_value_at_time(0.0, start)
        .linear_ramp_to_value_at_time(profile.peak_gain, start + config.attack_secs)
        .exponential_ramp_to_value_at_time(config.envelope_floor, start + profile.duration);
    t
}
