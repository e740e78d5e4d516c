use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::chords::categorize;
use crate::pulse::StringVisuals;
use crate::settings::Capo;
use crate::tone::Tone;
use crate::tuning::hz_to_note_name;
use crate::types::*;

/// Width of the drawn strings, in characters.
const STRING_WIDTH: usize = 40;

/// What the dashboard shows, rebuilt from the StrumEvent stream.
pub struct DisplayState {
    chord: String,
    capo: Capo,
    tone: Tone,
    /// Frequency of the last pluck per string.
    last_hz: [Option<f64>; NUM_STRINGS],
    visuals: StringVisuals,
    plucks: u64,
}

impl DisplayState {
    pub fn new(pulse: Duration) -> Self {
        Self {
            chord: crate::chords::DEFAULT_CHORD.to_string(),
            capo: Capo::default(),
            tone: Tone::default(),
            last_hz: [None; NUM_STRINGS],
            visuals: StringVisuals::new(pulse),
            plucks: 0,
        }
    }

    pub fn apply(&mut self, event: &StrumEvent, now: Instant) {
        match event {
            StrumEvent::Pluck { string, frequency, .. } => {
                if let Some(slot) = self.last_hz.get_mut(*string) {
                    *slot = Some(*frequency);
                }
                self.plucks += 1;
            }
            StrumEvent::Pulse { string } => self.visuals.pulse_at(*string, now),
            StrumEvent::Config { chord, capo, tone } => {
                self.chord = chord.clone();
                self.capo = Capo::new(*capo);
                self.tone = *tone;
            }
        }
    }

    /// Draw the strings high e at the top, as a player looking down sees them.
    pub fn render(&self, now: Instant) -> String {
        let vibrating = self.visuals.vibrating(now);
        let mut out = String::new();
        out.push_str("╔══════════════════════════════════════════════════════════╗\n");
        out.push_str(&format!(
            "║  Chord: {:<6} Capo: {:<4} Tone: {:<11} Plucks: {:<6}║\n",
            self.chord,
            self.capo.to_string(),
            self.tone.name(),
            self.plucks
        ));
        out.push_str(&format!(
            "║  Group: {:<49}║\n",
            categorize(&self.chord).label()
        ));
        out.push_str("╠══════════════════════════════════════════════════════════╣\n");
        for i in (0..NUM_STRINGS).rev() {
            let line = if vibrating[i] {
                "≈".repeat(STRING_WIDTH)
            } else {
                "─".repeat(STRING_WIDTH)
            };
            let note = self.last_hz[i]
                .map(hz_to_note_name)
                .unwrap_or_else(|| "---".to_string());
            out.push_str(&format!("║ {:>5} {} {:>6}   ║\n", STRING_NAMES[i], line, note));
        }
        out.push_str("╚══════════════════════════════════════════════════════════╝\n");
        out
    }
}

/// Renders a live ASCII view of the six strings.
pub struct ConsoleDisplay {
    rx: Receiver<StrumEvent>,
    update_hz: u32,
    state: DisplayState,
}

impl ConsoleDisplay {
    pub fn new(rx: Receiver<StrumEvent>, update_hz: u32, pulse: Duration) -> Self {
        Self {
            rx,
            update_hz,
            state: DisplayState::new(pulse),
        }
    }

    pub fn run(&mut self) {
        let period = Duration::from_millis(if self.update_hz == 0 {
            50
        } else {
            (1000 / self.update_hz).max(1) as u64
        });
        let mut stdout = io::stdout();
        let mut next_draw = Instant::now();

        loop {
            match self.rx.recv_timeout(period) {
                Ok(event) => self.state.apply(&event, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            let now = Instant::now();
            if now < next_draw {
                continue;
            }
            next_draw = now + period;

            // Clear screen and move cursor home
            print!("\x1b[2J\x1b[H{}", self.state.render(now));
            let _ = stdout.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shows_config_and_notes() {
        let mut s = DisplayState::new(Duration::from_millis(200));
        let now = Instant::now();
        s.apply(
            &StrumEvent::Config {
                chord: "Am".into(),
                capo: 3,
                tone: Tone::Distortion,
            },
            now,
        );
        s.apply(
            &StrumEvent::Pluck {
                string: 3,
                frequency: 196.0,
                start: 0.0,
                stop: 1.5,
            },
            now,
        );
        let text = s.render(now);
        assert!(text.contains("Chord: Am"));
        assert!(text.contains("Capo: +3"));
        assert!(text.contains("distortion"));
        assert!(text.contains("G3"));
        assert!(text.contains("Group: minor"));
    }

    #[test]
    fn test_render_groups_sharp_chords() {
        let mut s = DisplayState::new(Duration::from_millis(200));
        let now = Instant::now();
        s.apply(
            &StrumEvent::Config {
                chord: "F#m".into(),
                capo: 0,
                tone: Tone::Acoustic,
            },
            now,
        );
        assert!(s.render(now).contains("Group: sharp/flat"));
        assert!(DisplayState::new(Duration::from_millis(200))
            .render(now)
            .contains("Group: natural"));
    }

    #[test]
    fn test_pulse_highlights_until_expired() {
        let mut s = DisplayState::new(Duration::from_millis(200));
        let now = Instant::now();
        s.apply(&StrumEvent::Pulse { string: 0 }, now);
        assert_eq!(s.render(now).matches('≈').count(), STRING_WIDTH);
        assert_eq!(
            s.render(now + Duration::from_millis(250)).matches('≈').count(),
            0
        );
    }
}
