use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Oscillator source shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// The cached harmonic wavetable (see `wavetable`).
    Harmonic,
}

/// Synthesis parameters that define one timbre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneProfile {
    pub waveform: Waveform,
    /// Lowpass cutoff at the moment of the pluck (Hz).
    pub filter_start_hz: f64,
    /// Cutoff the sweep ends at, added to the note's own frequency (Hz).
    pub filter_end_offset_hz: f64,
    /// Total voice length (seconds).
    pub duration: f64,
    /// Peak linear gain, 0.0–1.0.
    pub peak_gain: f64,
}

impl ToneProfile {
    /// Lowpass cutoff the sweep ends at for a note of `frequency`.
    pub fn filter_end_hz(&self, frequency: f64) -> f64 {
        self.filter_end_offset_hz + frequency
    }
}

/// The fixed tone registry. Unknown names resolve to `Tone::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Acoustic,
    /// Labelled "Rock" in the picker.
    Distortion,
}

impl Tone {
    pub const ALL: [Tone; 2] = [Tone::Acoustic, Tone::Distortion];

    /// Resolve a tone name; anything unrecognized falls back to the default.
    pub fn from_name(name: &str) -> Tone {
        match name.trim().to_ascii_lowercase().as_str() {
            "acoustic" => Tone::Acoustic,
            "distortion" | "rock" => Tone::Distortion,
            other => {
                warn!("Unknown tone {:?}, using {}", other, Tone::default().name());
                Tone::default()
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tone::Acoustic => "acoustic",
            Tone::Distortion => "distortion",
        }
    }

    /// Gains are balanced by ear: sawtooth is naturally loud, so the
    /// distortion tone peaks much lower than the acoustic wavetable.
    pub fn profile(&self) -> ToneProfile {
        match self {
            Tone::Acoustic => ToneProfile {
                waveform: Waveform::Harmonic,
                filter_start_hz: 3000.0,
                filter_end_offset_hz: 0.1,
                duration: 2.0,
                peak_gain: 0.8,
            },
            Tone::Distortion => ToneProfile {
                waveform: Waveform::Sawtooth,
                filter_start_hz: 6000.0,
                filter_end_offset_hz: 100.0,
                duration: 1.5,
                peak_gain: 0.15,
            },
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(Tone::from_name("acoustic"), Tone::Acoustic);
        assert_eq!(Tone::from_name("Distortion"), Tone::Distortion);
        assert_eq!(Tone::from_name("rock"), Tone::Distortion);
    }

    #[test]
    fn test_unknown_tone_falls_back() {
        // "clean" existed in older builds and may still be in saved settings
        assert_eq!(Tone::from_name("clean"), Tone::Acoustic);
        assert_eq!(Tone::from_name(""), Tone::Acoustic);
    }

    #[test]
    fn test_acoustic_profile() {
        let p = Tone::Acoustic.profile();
        assert_eq!(p.waveform, Waveform::Harmonic);
        assert_eq!(p.filter_start_hz, 3000.0);
        assert_eq!(p.duration, 2.0);
        assert!((p.filter_end_hz(196.0) - 196.1).abs() < 1e-9);
    }

    #[test]
    fn test_distortion_is_quieter_sawtooth() {
        let a = Tone::Acoustic.profile();
        let d = Tone::Distortion.profile();
        assert_eq!(d.waveform, Waveform::Sawtooth);
        assert!(d.peak_gain < a.peak_gain);
        for tone in Tone::ALL {
            let p = tone.profile();
            assert!(p.peak_gain > 0.0 && p.peak_gain <= 1.0);
            assert!(p.duration > 0.0);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Tone::Distortion).unwrap(), "\"distortion\"");
        let t: Tone = serde_json::from_str("\"acoustic\"").unwrap();
        assert_eq!(t, Tone::Acoustic);
    }
}
