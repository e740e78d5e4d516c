//! Chord shapes and the standard chord library.
//!
//! A shape holds one entry per string, low E first. Shapes are immutable;
//! the trigger path only ever reads them.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::NUM_STRINGS;

/// Name of the chord used when a lookup misses.
pub const DEFAULT_CHORD: &str = "C";

/// What the fretting hand does on one string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fret {
    /// Sounded at this fret (0 = open).
    Fretted(u8),
    /// Not sounded.
    Muted,
}

impl Fret {
    pub fn fret(&self) -> Option<u8> {
        match self {
            Fret::Fretted(n) => Some(*n),
            Fret::Muted => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordShape(pub [Fret; NUM_STRINGS]);

impl ChordShape {
    /// Build from the compact notation used in chord charts: -1 means muted.
    pub fn from_frets(frets: [i8; NUM_STRINGS]) -> Self {
        let mut out = [Fret::Muted; NUM_STRINGS];
        for (slot, &f) in out.iter_mut().zip(frets.iter()) {
            if f >= 0 {
                *slot = Fret::Fretted(f as u8);
            }
        }
        Self(out)
    }

    pub fn get(&self, string: usize) -> Fret {
        self.0.get(string).copied().unwrap_or(Fret::Muted)
    }

    pub fn is_muted(&self, string: usize) -> bool {
        self.get(string) == Fret::Muted
    }
}

impl fmt::Display for ChordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|fret| match fret {
                Fret::Fretted(n) => n.to_string(),
                Fret::Muted => "x".to_string(),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Display grouping for the chord picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordCategory {
    Natural,
    Minor,
    SharpOrFlat,
}

impl ChordCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ChordCategory::Natural => "natural",
            ChordCategory::Minor => "minor",
            ChordCategory::SharpOrFlat => "sharp/flat",
        }
    }
}

/// Sharps and flats win over minor; "b" after the root is a flat.
pub fn categorize(name: &str) -> ChordCategory {
    if name.contains('#') || name.chars().skip(1).any(|c| c == 'b') {
        ChordCategory::SharpOrFlat
    } else if name.contains('m') && !name.contains("maj") {
        ChordCategory::Minor
    } else {
        ChordCategory::Natural
    }
}

/// Maps chord names to shapes.
#[derive(Debug, Clone)]
pub struct ChordLibrary {
    shapes: BTreeMap<String, ChordShape>,
}

impl ChordLibrary {
    pub fn new(shapes: BTreeMap<String, ChordShape>) -> Self {
        Self { shapes }
    }

    /// The shape for `name`, or the default chord's shape if unknown.
    pub fn lookup(&self, name: &str) -> ChordShape {
        if let Some(shape) = self.shapes.get(name) {
            return *shape;
        }
        debug!("Unknown chord {:?}, falling back to {}", name, DEFAULT_CHORD);
        self.shapes
            .get(DEFAULT_CHORD)
            .copied()
            .unwrap_or_else(|| ChordShape::from_frets([3, 3, 2, 0, 1, 0]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// All chord names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.shapes.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Default for ChordLibrary {
    fn default() -> Self {
        standard_library()
    }
}

/// Open-position chord shapes for standard tuning.
///
/// Format: [low E, A, D, G, B, high e], -1 = muted.
pub fn standard_library() -> ChordLibrary {
    let table: &[(&str, [i8; NUM_STRINGS])] = &[
        // Major
        ("C", [3, 3, 2, 0, 1, 0]),
        ("D", [-1, 0, 0, 2, 3, 2]),
        ("E", [0, 2, 2, 1, 0, 0]),
        ("F", [1, 3, 3, 2, 1, 1]),
        ("G", [3, 2, 0, 0, 0, 3]),
        ("A", [-1, 0, 2, 2, 2, 0]),
        ("B", [-1, 2, 4, 4, 4, 2]),
        // Minor
        ("Cm", [-1, 3, 5, 5, 4, 3]),
        ("Dm", [-1, 0, 0, 2, 3, 1]),
        ("Em", [0, 2, 2, 0, 0, 0]),
        ("Fm", [1, 3, 3, 1, 1, 1]),
        ("Gm", [3, 5, 5, 3, 3, 3]),
        ("Am", [-1, 0, 2, 2, 1, 0]),
        ("Bm", [-1, 2, 4, 4, 3, 2]),
        // Dominant 7th
        ("C7", [-1, 3, 2, 3, 1, 0]),
        ("D7", [-1, 0, 0, 2, 1, 2]),
        ("E7", [0, 2, 0, 1, 0, 0]),
        ("F7", [1, 3, 1, 2, 1, 1]),
        ("G7", [3, 2, 0, 0, 0, 1]),
        ("A7", [-1, 0, 2, 0, 2, 0]),
        ("B7", [-1, 2, 1, 2, 0, 2]),
        // Major 7th
        ("Cmaj7", [-1, 3, 2, 0, 0, 0]),
        ("Fmaj7", [-1, -1, 3, 2, 1, 0]),
        ("Gmaj7", [3, 2, 0, 0, 0, 2]),
        ("Amaj7", [-1, 0, 2, 1, 2, 0]),
        // Minor 7th
        ("Am7", [-1, 0, 2, 0, 1, 0]),
        ("Dm7", [-1, 0, 0, 2, 1, 1]),
        ("Em7", [0, 2, 2, 0, 3, 0]),
        ("Bm7", [-1, 2, 0, 2, 0, 2]),
        // Sharps & flats
        ("Bb", [-1, 1, 3, 3, 3, 1]),
        ("Eb", [-1, 6, 8, 8, 8, 6]),
        ("F#", [2, 4, 4, 3, 2, 2]),
        ("F#m", [2, 4, 4, 2, 2, 2]),
        ("C#m", [-1, 4, 6, 6, 5, 4]),
        ("Ab", [4, 6, 6, 5, 4, 4]),
    ];

    let shapes = table
        .iter()
        .map(|(name, frets)| (name.to_string(), ChordShape::from_frets(*frets)))
        .collect();
    ChordLibrary::new(shapes)
}
