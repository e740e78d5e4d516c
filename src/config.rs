//! Tunable engine constants, loadable from a JSON file.
//!
//! Every field has a default; a config file only needs the keys it changes.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Normalized positions this close to 0 or 1 snap to the edge.
    pub edge_tolerance: f32,
    /// A pointer-down this close to a string center plucks it.
    pub tap_tolerance: f32,
    /// Delay (seconds) given to a crossing at progress 1.0.
    pub strum_spread_secs: f64,
}

/// Longest stagger a strum may spread over (seconds).
pub const MAX_STRUM_SPREAD_SECS: f64 = 1.0;

impl TrackerConfig {
    /// Pull out-of-range values back into range, warning for each one.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        Self {
            edge_tolerance: clamp_field(
                "edge_tolerance",
                self.edge_tolerance,
                0.0,
                0.5,
                defaults.edge_tolerance,
            ),
            tap_tolerance: clamp_field(
                "tap_tolerance",
                self.tap_tolerance,
                0.0,
                0.5,
                defaults.tap_tolerance,
            ),
            strum_spread_secs: clamp_field(
                "strum_spread_secs",
                self.strum_spread_secs,
                0.0,
                MAX_STRUM_SPREAD_SECS,
                defaults.strum_spread_secs,
            ),
        }
    }
}

/// `value` clamped to `lo..=hi`; NaN falls back to `default`.
fn clamp_field<T>(name: &str, value: T, lo: T, hi: T, default: T) -> T
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if value.partial_cmp(&value).is_none() {
        warn!("Config {} is not a number; using {}", name, default);
        default
    } else if value < lo {
        warn!("Config {} = {} below {}; clamped", name, value, lo);
        lo
    } else if value > hi {
        warn!("Config {} = {} above {}; clamped", name, value, hi);
        hi
    } else {
        value
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: 0.05,
            tap_tolerance: 0.05,
            strum_spread_secs: 0.04,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Linear attack from silence to peak gain (seconds).
    pub attack_secs: f64,
    /// Lowpass resonance, in dB as Web Audio interprets it.
    pub filter_q: f64,
    /// Target of the exponential gain decay. Exponential ramps cannot reach 0.
    pub envelope_floor: f64,
    /// Bins in the harmonic spectrum, including DC.
    pub harmonic_bins: usize,
    /// Samples in one cycle of the harmonic wavetable.
    pub wavetable_len: usize,
    /// How long a string shows as vibrating after a pulse (ms).
    pub pulse_ms: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            attack_secs: 0.015,
            filter_q: 1.0,
            envelope_floor: 0.001,
            harmonic_bins: 32,
            wavetable_len: 2048,
            pulse_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tracker: TrackerConfig,
    pub synth: SynthConfig,
    pub sample_rate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            synth: SynthConfig::default(),
            sample_rate: 48000,
        }
    }
}

impl EngineConfig {
    pub fn clamped(self) -> Self {
        Self {
            tracker: self.tracker.clamped(),
            ..self
        }
    }

    /// Load from a JSON file. Returns None if file is absent or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(c) => {
                info!("Loaded engine config from {:?}", path);
                Some(Self::clamped(c))
            }
            Err(e) => {
                warn!("Failed to parse engine config {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)?;
        info!("Engine config saved to {:?}", path);
        Ok(())
    }
}
