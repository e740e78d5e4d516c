//! Shared DSP primitives: lowpass biquad, Goertzel single-bin magnitude, RMS,
//! and test signal generators.

use std::f64::consts::PI;

/// RBJ-cookbook lowpass biquad, transposed direct form II.
///
/// Resonance is given in dB, the way Web Audio's `BiquadFilterNode`
/// interprets Q for lowpass filters.
#[derive(Debug, Clone, Default)]
pub struct Lowpass {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Lowpass {
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            ..Default::default()
        }
    }

    /// Re-tune without clearing the filter state.
    pub fn set(&mut self, cutoff_hz: f64, q_db: f64, sample_rate: f64) {
        let nyquist = sample_rate / 2.0;
        let cutoff = cutoff_hz.clamp(10.0, nyquist * 0.99);
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let q = 10f64.powf(q_db / 20.0);
        let alpha = sin_w0 / (2.0 * q);

        let a0 = 1.0 + alpha;
        self.b0 = (1.0 - cos_w0) / 2.0 / a0;
        self.b1 = (1.0 - cos_w0) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos_w0 / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

/// Goertzel algorithm: compute magnitude of a single frequency bin.
/// Much cheaper than FFT when you only need specific frequencies.
pub fn goertzel_magnitude(samples: &[f32], freq: f64, sample_rate: f64, n: usize) -> f64 {
    let k = (freq * n as f64 / sample_rate).round();
    let w = 2.0 * PI * k / n as f64;
    let coeff = 2.0 * w.cos();
    let mut s1 = 0.0f64;
    let mut s2 = 0.0f64;
    for sample in samples.iter().take(n) {
        let s0 = *sample as f64 + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }
    (s1 * s1 + s2 * s2 - coeff * s1 * s2).abs().sqrt()
}

/// Root mean square of an audio buffer.
pub fn compute_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Test signal generators for unit tests.
#[cfg(test)]
pub mod test_helpers {
    use std::f64::consts::PI;

    /// Generate a mono sine wave.
    pub fn sine_wave(freq_hz: f64, amp: f64, sr: u32, ms: u32) -> Vec<f32> {
        let n = (sr as u64 * ms as u64 / 1000) as usize;
        (0..n)
            .map(|i| (amp * (2.0 * PI * freq_hz * i as f64 / sr as f64).sin()) as f32)
            .collect()
    }
}
