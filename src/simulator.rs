use crossbeam_channel::Sender;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

use crate::geometry::{Layout, Orientation, Viewport};
use crate::tone::Tone;
use crate::types::*;

/// An input event stamped with its offset from the start of the script.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    /// Seconds since the script started.
    pub at: f64,
    pub event: InputEvent,
}

/// Generates scripted pointer gestures over a virtual string layout, so the
/// whole pipeline can run without a touchscreen.
pub struct Simulator {
    layout: Layout,
    /// Interval between pointer-move samples (ms), like a touch digitizer.
    sample_ms: u32,
    next_touch: u64,
    /// Length of the last expanded script, trailing holds included (s).
    script_secs: f64,
}

impl Simulator {
    pub fn new(layout: Layout, sample_ms: u32) -> Self {
        Self {
            layout,
            sample_ms: sample_ms.max(1),
            next_touch: 1,
            script_secs: 0.0,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Expand gestures into timed events. The first event is always the
    /// initial layout.
    pub fn script(&mut self, gestures: &[Gesture]) -> Vec<TimedEvent> {
        let mut out = vec![TimedEvent {
            at: 0.0,
            event: InputEvent::Layout(self.layout),
        }];
        let mut t = 0.0;
        for g in gestures {
            self.expand(g, &mut t, &mut out);
        }
        self.script_secs = t;
        out
    }

    /// Duration of the last script, including any trailing hold.
    pub fn script_secs(&self) -> f64 {
        self.script_secs
    }

    /// Play gestures in real time into `tx`. Blocks the calling thread.
    pub fn run(&mut self, gestures: &[Gesture], tx: &Sender<InputEvent>) {
        info!("Simulator starting ({} gestures)...", gestures.len());
        let mut elapsed = 0.0;
        for te in self.script(gestures) {
            if te.at > elapsed {
                thread::sleep(Duration::from_secs_f64(te.at - elapsed));
                elapsed = te.at;
            }
            if tx.send(te.event).is_err() {
                info!("Coordinator gone; simulator stopping");
                return;
            }
        }
        // Trailing holds let the last notes ring
        if self.script_secs > elapsed {
            thread::sleep(Duration::from_secs_f64(self.script_secs - elapsed));
        }
        info!("Simulator sequence complete");
    }

    fn expand(&mut self, gesture: &Gesture, t: &mut f64, out: &mut Vec<TimedEvent>) {
        match gesture {
            Gesture::Hold { ms } => {
                *t += *ms as f64 / 1000.0;
            }

            Gesture::Strum { from, to, ms, mouse } => {
                info!("  strum {:.2} → {:.2} over {}ms", from, to, ms);
                let id = self.pointer(*mouse);
                let cross = self.cross_axis_point();
                let ticks = (*ms / self.sample_ms).max(1);
                let dt = self.sample_ms as f64 / 1000.0;

                out.push(self.at(*t, InputEvent::PointerDown(self.sample(id, *from, cross))));
                for i in 1..=ticks {
                    *t += dt;
                    let s = i as f32 / ticks as f32;
                    let along = lerp(*from, *to, smoothstep(s));
                    out.push(self.at(*t, InputEvent::PointerMove(self.sample(id, along, cross))));
                }
                out.push(self.at(*t, InputEvent::PointerUp(id)));
            }

            Gesture::Tap { string } => {
                let id = self.pointer(false);
                info!("  tap {}", STRING_NAMES[*string % NUM_STRINGS]);
                let (x, y) = self
                    .layout
                    .string_point(*string % NUM_STRINGS, self.cross_axis_point());
                out.push(self.at(*t, InputEvent::PointerDown(PointerSample { id, x, y })));
                *t += self.sample_ms as f64 / 1000.0;
                out.push(self.at(*t, InputEvent::PointerUp(id)));
            }

            Gesture::Chord { name } => {
                info!("  chord {}", name);
                out.push(self.at(*t, InputEvent::SelectChord(name.clone())));
            }

            Gesture::Tone { tone } => {
                info!("  tone {}", tone);
                out.push(self.at(*t, InputEvent::SelectTone(*tone)));
            }

            Gesture::CapoUp => out.push(self.at(*t, InputEvent::CapoUp)),
            Gesture::CapoDown => out.push(self.at(*t, InputEvent::CapoDown)),

            Gesture::Rotate => {
                let vp = self.layout.viewport;
                self.layout = Layout::evenly_spaced(Viewport::new(vp.height, vp.width));
                info!("  rotate to {:?}", self.layout.viewport.orientation());
                out.push(self.at(*t, InputEvent::Layout(self.layout)));
            }
        }
    }

    fn at(&self, t: f64, event: InputEvent) -> TimedEvent {
        TimedEvent { at: t, event }
    }

    fn pointer(&mut self, mouse: bool) -> PointerId {
        if mouse {
            return PointerId::Mouse;
        }
        let id = self.next_touch;
        self.next_touch += 1;
        PointerId::Touch(id)
    }

    /// Middle of the screen on the axis strums don't travel along.
    fn cross_axis_point(&self) -> f32 {
        let vp = self.layout.viewport;
        match vp.orientation() {
            Orientation::Landscape => vp.width / 2.0,
            Orientation::Portrait => vp.height / 2.0,
        }
    }

    fn sample(&self, id: PointerId, along: f32, cross: f32) -> PointerSample {
        let (x, y) = self.layout.point_at(along, cross);
        PointerSample { id, x, y }
    }
}

// ─── Gesture types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gesture {
    Hold { ms: u32 },
    /// Swipe between two normalized positions along the strum axis.
    Strum { from: f32, to: f32, ms: u32, mouse: bool },
    /// Touch down on a string's center and lift.
    Tap { string: usize },
    Chord { name: String },
    Tone { tone: Tone },
    CapoUp,
    CapoDown,
    /// Swap viewport width and height.
    Rotate,
}

impl Gesture {
    /// Low E to high e.
    pub fn down_strum(ms: u32) -> Self {
        Gesture::Strum { from: 0.0, to: 1.0, ms, mouse: false }
    }

    /// High e to low E.
    pub fn up_strum(ms: u32) -> Self {
        Gesture::Strum { from: 1.0, to: 0.0, ms, mouse: false }
    }
}

/// Named scripts selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Down,
    Up,
    Taps,
    Demo,
}

impl Script {
    /// Resolve a script name; unknown names fall back to the demo.
    pub fn from_name(name: &str) -> Script {
        match name.trim().to_ascii_lowercase().as_str() {
            "down" => Script::Down,
            "up" => Script::Up,
            "taps" => Script::Taps,
            "demo" => Script::Demo,
            other => {
                warn!("Unknown script {:?}, running the demo", other);
                Script::Demo
            }
        }
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        match self {
            Script::Down => vec![Gesture::down_strum(30), Gesture::Hold { ms: 2000 }],
            Script::Up => vec![Gesture::up_strum(30), Gesture::Hold { ms: 2000 }],
            Script::Taps => {
                let mut g: Vec<Gesture> = (0..NUM_STRINGS)
                    .flat_map(|s| [Gesture::Tap { string: s }, Gesture::Hold { ms: 250 }])
                    .collect();
                g.push(Gesture::Hold { ms: 2000 });
                g
            }
            Script::Demo => demo_sequence(),
        }
    }
}

/// A short progression exercising strums both ways, taps, chord and capo
/// changes, the second tone, the mouse, and a rotation. About 9 seconds.
fn demo_sequence() -> Vec<Gesture> {
    vec![
        Gesture::Hold { ms: 100 },

        // C: down, up, down
        Gesture::down_strum(40),
        Gesture::Hold { ms: 450 },
        Gesture::up_strum(30),
        Gesture::Hold { ms: 250 },
        Gesture::down_strum(40),
        Gesture::Hold { ms: 500 },

        // G, strummed with the mouse
        Gesture::Chord { name: "G".into() },
        Gesture::Strum { from: 0.0, to: 1.0, ms: 60, mouse: true },
        Gesture::Hold { ms: 700 },

        // Am, picked arpeggio
        Gesture::Chord { name: "Am".into() },
        Gesture::Tap { string: 1 },
        Gesture::Hold { ms: 200 },
        Gesture::Tap { string: 3 },
        Gesture::Hold { ms: 200 },
        Gesture::Tap { string: 4 },
        Gesture::Hold { ms: 200 },
        Gesture::Tap { string: 5 },
        Gesture::Hold { ms: 400 },

        // D (low E muted) with capo 2
        Gesture::Chord { name: "D".into() },
        Gesture::CapoUp,
        Gesture::CapoUp,
        Gesture::down_strum(50),
        Gesture::Hold { ms: 800 },

        // Rock tone, portrait
        Gesture::CapoDown,
        Gesture::CapoDown,
        Gesture::Tone { tone: Tone::Distortion },
        Gesture::Rotate,
        Gesture::Chord { name: "E".into() },
        Gesture::down_strum(30),
        Gesture::Hold { ms: 300 },
        Gesture::up_strum(30),
        Gesture::Hold { ms: 300 },
        Gesture::down_strum(30),
        Gesture::Hold { ms: 1600 },
    ]
}

// ─── Math helpers ───────────────────────────────────────────────────────────

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Smooth interpolation (ease in/out)
fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
