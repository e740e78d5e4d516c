use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::mixer::Mixer;
use crate::output::{AudioOutput, OutputState};
use crate::voice::Voice;

/// Voices that can wait for the next callback before `schedule` drops them.
const VOICE_QUEUE: usize = 256;

/// Live playback via cpal.
///
/// Holds the cpal `Stream` alive. Drop this to stop playback.
/// Voices cross to the realtime callback over a bounded channel; the
/// callback owns the mixer and publishes the frame count as the audio clock.
pub struct CpalOutput {
    stream: Stream,
    voice_tx: Sender<Voice>,
    frames: Arc<AtomicU64>,
    sample_rate: u32,
    state: OutputState,
}

impl CpalOutput {
    /// Open the default output device and start streaming.
    pub fn open() -> Result<Self, String> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| "No default audio output device found".to_string())?;

        info!(
            "Audio output: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );

        let supported = device
            .default_output_config()
            .map_err(|e| format!("No supported output config: {e}"))?;

        let sample_rate = supported.sample_rate().0;
        let format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let channels = config.channels as usize;

        info!(
            "Playback config: {}Hz  {} ch  {:?}",
            sample_rate, channels, format
        );

        let (voice_tx, voice_rx) = crossbeam_channel::bounded::<Voice>(VOICE_QUEUE);
        let frames = Arc::new(AtomicU64::new(0));

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(
                &device, &config, channels, voice_rx, frames.clone(), sample_rate,
            )?,
            SampleFormat::I16 => build_stream::<i16>(
                &device, &config, channels, voice_rx, frames.clone(), sample_rate,
            )?,
            SampleFormat::U16 => build_stream::<u16>(
                &device, &config, channels, voice_rx, frames.clone(), sample_rate,
            )?,
            fmt => {
                return Err(format!(
                    "Unsupported sample format {fmt:?}. Use an F32, I16 or U16 device."
                ))
            }
        };

        stream.play().map_err(|e| e.to_string())?;

        Ok(Self {
            stream,
            voice_tx,
            frames,
            sample_rate,
            state: OutputState::Running,
        })
    }

    pub fn suspend(&mut self) {
        match self.stream.pause() {
            Ok(()) => self.state = OutputState::Suspended,
            Err(e) => warn!("Failed to pause output stream: {}", e),
        }
    }
}

impl AudioOutput for CpalOutput {
    fn current_time(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn state(&self) -> OutputState {
        self.state
    }

    fn resume(&mut self) {
        match self.stream.play() {
            Ok(()) => self.state = OutputState::Running,
            Err(e) => error!("Failed to resume output stream: {}", e),
        }
    }

    fn schedule(&mut self, voice: Voice) {
        // try_send: never block the input path on a stalled callback
        if self.voice_tx.try_send(voice).is_err() {
            warn!("Voice queue full, dropping pluck");
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    channels: usize,
    voice_rx: Receiver<Voice>,
    frames: Arc<AtomicU64>,
    sample_rate: u32,
) -> Result<Stream, String>
where
    T: SizedSample + FromSample<f32>,
{
    let mut mixer = Mixer::new(sample_rate);
    let mut mono: Vec<f32> = vec![0.0; 4096];
    let err_fn = |e: cpal::StreamError| error!("Audio stream error: {e}");

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for voice in voice_rx.try_iter() {
                    mixer.add(voice);
                }
                let n = data.len() / channels.max(1);
                if mono.len() < n {
                    mono.resize(n, 0.0);
                }
                mixer.render(&mut mono[..n]);
                for (frame, &s) in data.chunks_mut(channels.max(1)).zip(mono.iter()) {
                    let v = T::from_sample(s.clamp(-1.0, 1.0));
                    for out in frame.iter_mut() {
                        *out = v;
                    }
                }
                frames.store(mixer.frames(), Ordering::Release);
            },
            err_fn,
            None,
        )
        .map_err(|e| e.to_string())
}
