//! Visual pulses on the wall clock.
//!
//! Pulses are timed independently of the audio clock: the two clocks can
//! drift, and a late flash is harmless where a late note is not.

use log::warn;
use std::time::{Duration, Instant};

use crate::types::NUM_STRINGS;

/// Latest a pulse may be queued. Longer delays are clamped to this.
pub const MAX_PULSE_DELAY: Duration = Duration::from_secs(3600);

/// `delay` seconds as a wall-clock wait in `0..=MAX_PULSE_DELAY`.
/// Negative and NaN delays are immediate.
pub fn bounded_delay(delay: f64) -> Duration {
    match Duration::try_from_secs_f64(delay.max(0.0)) {
        Ok(d) if d <= MAX_PULSE_DELAY => d,
        _ => {
            warn!("Delay {}s out of range; clamped to {:?}", delay, MAX_PULSE_DELAY);
            MAX_PULSE_DELAY
        }
    }
}

/// The visual layer's callback.
pub trait PulseSink {
    fn pulse(&mut self, string: usize);
}

/// Pending pulses, released when their due time passes.
#[derive(Debug, Default)]
pub struct PulseScheduler {
    pending: Vec<(Instant, usize)>,
}

impl PulseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a pulse `delay` seconds from now. Returns its due time.
    pub fn schedule(&mut self, string: usize, delay: f64) -> Instant {
        let due = Instant::now() + bounded_delay(delay);
        self.schedule_at(string, due);
        due
    }

    pub fn schedule_at(&mut self, string: usize, due: Instant) {
        self.pending.push((due, string));
    }

    /// Remove and return every pulse due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<usize> {
        let mut due: Vec<(Instant, usize)> = Vec::new();
        self.pending.retain(|&(at, s)| {
            if at <= now {
                due.push((at, s));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(at, _)| at);
        due.into_iter().map(|(_, s)| s).collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|&(at, _)| at).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Per-string "vibrating" display state. A pulse on a string that is
/// already vibrating restarts its animation.
#[derive(Debug, Clone)]
pub struct StringVisuals {
    until: [Option<Instant>; NUM_STRINGS],
    duration: Duration,
}

impl StringVisuals {
    pub fn new(duration: Duration) -> Self {
        Self {
            until: [None; NUM_STRINGS],
            duration,
        }
    }

    pub fn pulse_at(&mut self, string: usize, now: Instant) {
        if let Some(slot) = self.until.get_mut(string) {
            *slot = Some(now + self.duration);
        }
    }

    pub fn is_vibrating(&self, string: usize, now: Instant) -> bool {
        matches!(self.until.get(string), Some(Some(until)) if now < *until)
    }

    pub fn vibrating(&self, now: Instant) -> [bool; NUM_STRINGS] {
        let mut out = [false; NUM_STRINGS];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.is_vibrating(i, now);
        }
        out
    }
}

impl Default for StringVisuals {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

impl PulseSink for StringVisuals {
    fn pulse(&mut self, string: usize) {
        self.pulse_at(string, Instant::now());
    }
}
