//! The audio output boundary: a clock, a suspend/resume state, and a place
//! to hand scheduled voices.

use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;
use std::path::Path;

use crate::mixer::Mixer;
use crate::voice::Voice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Running,
    /// Clock stopped, e.g. the platform paused audio while backgrounded.
    Suspended,
}

pub trait AudioOutput {
    /// Current audio-clock time in seconds.
    fn current_time(&self) -> f64;
    fn state(&self) -> OutputState;
    fn resume(&mut self);
    /// Hand over a voice. It plays and releases itself on the audio clock.
    fn schedule(&mut self, voice: Voice);
    fn sample_rate(&self) -> u32;
}

/// Deterministic output that renders on demand into an in-memory buffer.
pub struct OfflineOutput {
    mixer: Mixer,
    state: OutputState,
    rendered: Vec<f32>,
}

/// Frames rendered per mixer call.
const BLOCK: usize = 128;

impl OfflineOutput {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            mixer: Mixer::new(sample_rate),
            state: OutputState::Running,
            rendered: Vec::new(),
        }
    }

    pub fn suspend(&mut self) {
        self.state = OutputState::Suspended;
    }

    /// Render `frames` more frames. A suspended output renders nothing and
    /// its clock stays put.
    pub fn render(&mut self, frames: usize) {
        if self.state == OutputState::Suspended {
            return;
        }
        let mut block = [0.0f32; BLOCK];
        let mut remaining = frames;
        while remaining > 0 {
            let n = remaining.min(BLOCK);
            self.mixer.render(&mut block[..n]);
            self.rendered.extend_from_slice(&block[..n]);
            remaining -= n;
        }
    }

    /// Render until the clock reaches `time` (seconds).
    pub fn render_until(&mut self, time: f64) {
        let target = (time * self.mixer.sample_rate() as f64).ceil() as u64;
        let frames = target.saturating_sub(self.mixer.frames());
        self.render(frames as usize);
    }

    pub fn rendered(&self) -> &[f32] {
        &self.rendered
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.active_voices()
    }

    /// Write everything rendered so far as a mono 32-bit float WAV.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        write_wav(path, &self.rendered, self.mixer.sample_rate())
    }
}

impl AudioOutput for OfflineOutput {
    fn current_time(&self) -> f64 {
        self.mixer.time()
    }

    fn state(&self) -> OutputState {
        self.state
    }

    fn resume(&mut self) {
        self.state = OutputState::Running;
    }

    fn schedule(&mut self, voice: Voice) {
        self.mixer.add(voice);
    }

    fn sample_rate(&self) -> u32 {
        self.mixer.sample_rate()
    }
}

pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    info!(
        "WAV: {:?}  {:.2}s  {} Hz",
        path,
        samples.len() as f64 / sample_rate as f64,
        sample_rate
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    #[test]
    fn test_render_until_advances_clock() {
        let mut out = OfflineOutput::new(48000);
        out.render_until(0.25);
        assert_eq!(out.rendered().len(), 12000);
        assert!((out.current_time() - 0.25).abs() < 1e-9);
        // Already there: no-op
        out.render_until(0.1);
        assert_eq!(out.rendered().len(), 12000);
    }

    #[test]
    fn test_suspended_clock_stands_still() {
        let mut out = OfflineOutput::new(48000);
        out.suspend();
        out.render(4800);
        assert_eq!(out.current_time(), 0.0);
        out.resume();
        out.render(4800);
        assert!((out.current_time() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_wav_export() {
        let dir = std::env::temp_dir().join(format!("strum-wav-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("silence.wav");

        let mut out = OfflineOutput::new(44100);
        out.render(441);
        out.write_wav(&path).unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 441);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
