//! Player-facing state: capo, selected chord and tone, the chord bar, and
//! saved presets.
//!
//! The trigger path never reads any of this implicitly; callers pass a
//! `PlayerConfig` into each pluck.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

use crate::chords::DEFAULT_CHORD;
use crate::tone::Tone;

pub const MAX_CAPO: u8 = 12;

/// Uniform semitone shift, always within 0–12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Capo(u8);

impl Capo {
    /// Out-of-range values clamp to 12.
    pub fn new(semitones: u8) -> Self {
        Self(semitones.min(MAX_CAPO))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn increment(&mut self) {
        if self.0 < MAX_CAPO {
            self.0 += 1;
        }
    }

    pub fn decrement(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }
}

impl From<u8> for Capo {
    fn from(v: u8) -> Self {
        Capo::new(v)
    }
}

impl From<Capo> for u8 {
    fn from(c: Capo) -> u8 {
        c.0
    }
}

impl fmt::Display for Capo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "0")
        } else {
            write!(f, "+{}", self.0)
        }
    }
}

/// Everything a pluck needs besides the string index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub chord: String,
    pub capo: Capo,
    pub tone: Tone,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            chord: DEFAULT_CHORD.to_string(),
            capo: Capo::default(),
            tone: Tone::default(),
        }
    }
}

pub const DEFAULT_CHORD_BAR: [&str; 6] = ["C", "G", "Am", "Em", "D", "F"];

/// The chords on the chord bar, in display order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSet {
    chords: Vec<String>,
}

impl ChordSet {
    pub fn new(chords: Vec<String>) -> Self {
        let mut set = Self { chords: Vec::new() };
        for c in chords {
            if !set.contains(&c) {
                set.chords.push(c);
            }
        }
        set.ensure_non_empty();
        set
    }

    pub fn chords(&self) -> &[String] {
        &self.chords
    }

    pub fn first(&self) -> &str {
        // ensure_non_empty keeps at least one entry
        self.chords.first().map(|s| s.as_str()).unwrap_or(DEFAULT_CHORD)
    }

    pub fn contains(&self, chord: &str) -> bool {
        self.chords.iter().any(|c| c == chord)
    }

    /// Add `chord` if absent, remove it if present. Removing the last chord
    /// leaves the default chord on the bar.
    pub fn toggle(&mut self, chord: &str) {
        if self.contains(chord) {
            self.chords.retain(|c| c != chord);
        } else {
            self.chords.push(chord.to_string());
        }
        self.ensure_non_empty();
    }

    /// Keep `current` valid: reset it to the first chord if it left the bar.
    pub fn reconcile(&self, current: &mut String) {
        if !self.contains(current) {
            *current = self.first().to_string();
        }
    }

    fn ensure_non_empty(&mut self) {
        if self.chords.is_empty() {
            self.chords.push(DEFAULT_CHORD.to_string());
        }
    }
}

impl Default for ChordSet {
    fn default() -> Self {
        Self::new(DEFAULT_CHORD_BAR.iter().map(|s| s.to_string()).collect())
    }
}

/// A saved chord bar with its capo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub chords: Vec<String>,
    #[serde(default)]
    pub capo: Capo,
}

/// Older saves stored only the chord list.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPreset {
    Full(Preset),
    Legacy(Vec<String>),
}

impl From<StoredPreset> for Preset {
    fn from(s: StoredPreset) -> Self {
        match s {
            StoredPreset::Full(p) => p,
            StoredPreset::Legacy(chords) => Preset {
                chords,
                capo: Capo::default(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetStore {
    presets: BTreeMap<String, Preset>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save under `name` (trimmed). Blank names are ignored.
    pub fn save(&mut self, name: &str, chords: &ChordSet, capo: Capo) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.presets.insert(
            name.to_string(),
            Preset {
                chords: chords.chords().to_vec(),
                capo,
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    /// Apply a preset: replaces the chord bar and capo.
    pub fn load(&self, name: &str) -> Option<(ChordSet, Capo)> {
        let p = self.presets.get(name)?;
        Some((ChordSet::new(p.chords.clone()), p.capo))
    }

    pub fn delete(&mut self, name: &str) -> bool {
        self.presets.remove(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, StoredPreset> = serde_json::from_str(data)?;
        Ok(Self {
            presets: raw.into_iter().map(|(k, v)| (k, v.into())).collect(),
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.presets)
    }

    /// Load from a JSON file. Returns None if file is absent or malformed.
    pub fn load_file(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        match Self::from_json(&data) {
            Ok(store) => {
                info!("Loaded {} presets from {:?}", store.presets.len(), path);
                Some(store)
            }
            Err(e) => {
                warn!("Failed to parse presets {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        std::fs::write(path, json)?;
        info!("Presets saved to {:?}", path);
        Ok(())
    }
}
