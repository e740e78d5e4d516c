use crate::voice::{Voice, VoiceState};

/// Sums every live voice into a mono buffer and owns the audio clock.
///
/// The clock is the count of frames rendered so far, so times scheduled
/// against it are sample-accurate regardless of when `add` was called.
pub struct Mixer {
    sample_rate: u32,
    frames: u64,
    voices: Vec<VoiceState>,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames: 0,
            voices: Vec::with_capacity(32),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Audio-clock time of the next frame to be rendered (seconds).
    pub fn time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn add(&mut self, voice: Voice) {
        self.voices.push(VoiceState::new(voice));
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Overwrite `out` with the next `out.len()` frames and advance the clock.
    /// Voices past their stop time are released.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let t0 = self.time();
        let sr = self.sample_rate as f64;
        for v in &mut self.voices {
            v.render_add(out, t0, sr);
        }
        self.frames += out.len() as u64;
        let now = self.time();
        self.voices
            .retain(|v| !v.is_finished() && v.voice().stop > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::ParamTimeline;
    use crate::tone::Waveform;
    use crate::voice::Source;

    fn flat_voice(start: f64, stop: f64) -> Voice {
        let mut gain = ParamTimeline::new(0.5);
        gain.set_value_at_time(0.5, start);
        let mut cutoff = ParamTimeline::new(20000.0);
        cutoff.set_value_at_time(20000.0, start);
        Voice {
            string: 0,
            frequency: 110.0,
            source: Source::Primitive(Waveform::Square),
            filter_q: 1.0,
            cutoff,
            gain,
            start,
            stop,
        }
    }

    #[test]
    fn test_clock_advances_by_frames() {
        let mut m = Mixer::new(48000);
        let mut buf = vec![0.0f32; 480];
        m.render(&mut buf);
        m.render(&mut buf);
        assert_eq!(m.frames(), 960);
        assert!((m.time() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_voices_released_at_stop() {
        let mut m = Mixer::new(48000);
        m.add(flat_voice(0.0, 0.01));
        m.add(flat_voice(0.0, 1.0));
        assert_eq!(m.active_voices(), 2);
        let mut buf = vec![0.0f32; 960];
        m.render(&mut buf);
        assert_eq!(m.active_voices(), 1);
    }

    #[test]
    fn test_future_voice_waits() {
        let mut m = Mixer::new(48000);
        m.add(flat_voice(0.5, 1.0));
        let mut buf = vec![0.0f32; 4800];
        m.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
        assert_eq!(m.active_voices(), 1);
    }
}
