//! Harmonic spectrum and single-cycle wavetable for the acoustic tone.
//!
//! The spectrum approximates a plucked string: a unit fundamental and a
//! fast-thinning series where harmonic `i` has amplitude `0.6 / i²`.
//! It is built once per synth and shared read-only by every voice.

use std::f64::consts::PI;

/// Frequency-domain description of one waveform cycle.
/// Bin 0 is DC and bin 1 the fundamental; `real` holds cosine terms and
/// `imag` sine terms.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicSpectrum {
    pub real: Vec<f32>,
    pub imag: Vec<f32>,
}

impl HarmonicSpectrum {
    /// The plucked-string spectrum with `bins` entries (DC included).
    pub fn plucked(bins: usize) -> Self {
        let real = vec![0.0f32; bins];
        let mut imag = vec![0.0f32; bins];
        for (i, amp) in imag.iter_mut().enumerate().skip(1) {
            *amp = if i == 1 { 1.0 } else { 0.6 / (i * i) as f32 };
        }
        Self { real, imag }
    }

    pub fn len(&self) -> usize {
        self.imag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imag.is_empty()
    }
}

/// One cycle of a periodic waveform, peak-normalized to 1.0.
#[derive(Debug, Clone)]
pub struct Wavetable {
    samples: Vec<f32>,
}

impl Wavetable {
    /// Additive synthesis of `spectrum` into a table of `len` samples.
    pub fn from_spectrum(spectrum: &HarmonicSpectrum, len: usize) -> Self {
        let len = len.max(2);
        let mut samples: Vec<f32> = (0..len)
            .map(|j| {
                let x = 2.0 * PI * j as f64 / len as f64;
                let mut acc = 0.0f64;
                for k in 1..spectrum.len() {
                    let a = spectrum.real[k] as f64;
                    let b = spectrum.imag[k] as f64;
                    acc += a * (k as f64 * x).cos() + b * (k as f64 * x).sin();
                }
                acc as f32
            })
            .collect();

        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak > 0.0 {
            for s in &mut samples {
                *s /= peak;
            }
        }
        Self { samples }
    }

    /// Read the table at `phase` (cycles, wrapped into 0.0–1.0) with linear
    /// interpolation.
    pub fn sample(&self, phase: f64) -> f32 {
        let n = self.samples.len();
        let pos = phase.rem_euclid(1.0) * n as f64;
        let i = (pos as usize) % n;
        let frac = (pos - pos.floor()) as f32;
        let s0 = self.samples[i];
        let s1 = self.samples[(i + 1) % n];
        s0 + (s1 - s0) * frac
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}
