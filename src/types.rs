use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Layout;
use crate::tone::Tone;

// ─── Strings ────────────────────────────────────────────────────────────────

/// A guitar always has exactly six strings. Index 0 is the low E.
pub const NUM_STRINGS: usize = 6;

/// Display names, low to high.
pub const STRING_NAMES: [&str; NUM_STRINGS] = ["6:E2", "5:A2", "4:D3", "3:G3", "2:B3", "1:E4"];

// ─── Pointer input ──────────────────────────────────────────────────────────

/// Identity of one pointer. Touch pointers carry the platform's touch id;
/// the mouse is a single synthetic pointer sharing the same state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerId {
    Touch(u64),
    Mouse,
}

impl PointerId {
    /// Whether a move from an untracked pointer starts tracking it.
    /// Touches can report a move before their down registers; a mouse move
    /// without a held button is just hovering.
    pub fn seeds_on_move(&self) -> bool {
        matches!(self, PointerId::Touch(_))
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerId::Touch(id) => write!(f, "touch#{}", id),
            PointerId::Mouse => write!(f, "mouse"),
        }
    }
}

/// One raw pointer sample in viewport (client) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub id: PointerId,
    pub x: f32,
    pub y: f32,
}

impl PointerSample {
    pub fn touch(id: u64, x: f32, y: f32) -> Self {
        Self { id: PointerId::Touch(id), x, y }
    }

    pub fn mouse(x: f32, y: f32) -> Self {
        Self { id: PointerId::Mouse, x, y }
    }
}

// ─── Triggers ───────────────────────────────────────────────────────────────

/// A string crossing detected along one pointer's travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub string: usize,
    /// Fractional position of the crossing along the travel segment, 0.0–1.0.
    pub progress: f32,
}

/// Request to pluck one string after `delay` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StringTrigger {
    pub string: usize,
    pub delay: f64,
}

impl StringTrigger {
    pub fn immediate(string: usize) -> Self {
        Self { string, delay: 0.0 }
    }
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// Everything the input and settings layers can tell the coordinator.
#[derive(Debug, Clone)]
pub enum InputEvent {
    PointerDown(PointerSample),
    PointerMove(PointerSample),
    PointerUp(PointerId),
    /// Viewport resize, orientation change, or first layout.
    Layout(Layout),
    /// Start button: activate audio output on a user gesture.
    Activate,
    SelectChord(String),
    /// Add or remove a chord on the chord bar.
    ToggleChord(String),
    SelectTone(Tone),
    CapoUp,
    CapoDown,
}

/// Notifications broadcast by the coordinator to display consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StrumEvent {
    /// A voice was scheduled on the audio clock.
    Pluck {
        string: usize,
        frequency: f64,
        /// Audio-clock time the voice starts (seconds).
        start: f64,
        /// Audio-clock time the voice stops (seconds).
        stop: f64,
    },
    /// The visual layer should flash this string now.
    Pulse { string: usize },
    /// Chord, capo or tone changed.
    Config {
        chord: String,
        capo: u8,
        tone: Tone,
    },
}

impl fmt::Display for StrumEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrumEvent::Pluck { string, frequency, start, .. } => write!(
                f,
                "pluck {:<5} {:>7.2} Hz @ {:.3}s",
                STRING_NAMES[*string], frequency, start
            ),
            StrumEvent::Pulse { string } => write!(f, "pulse {}", STRING_NAMES[*string]),
            StrumEvent::Config { chord, capo, tone } => {
                write!(f, "chord={} capo={} tone={}", chord, capo, tone.name())
            }
        }
    }
}
