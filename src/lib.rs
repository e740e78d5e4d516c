pub mod automation;
pub mod chords;
pub mod config;
pub mod console_display;
pub mod coordinator;
pub mod dsp;
pub mod geometry;
pub mod gesture;
pub mod mixer;
pub mod output;
pub mod pulse;
pub mod settings;
pub mod simulator;
pub mod synth;
pub mod tone;
pub mod tuning;
pub mod types;
pub mod voice;
pub mod wavetable;

#[cfg(feature = "audio")]
pub mod audio_output;
