use crate::types::NUM_STRINGS;

/// Open-string pitches in standard tuning (Hz), low E to high e.
///   E2 82.41  A2 110.00  D3 146.83  G3 196.00  B3 246.94  E4 329.63
pub const STANDARD_TUNING: [f64; NUM_STRINGS] = [82.41, 110.0, 146.83, 196.0, 246.94, 329.63];

/// Sounding pitch of a fretted string with a capo.
///
/// frequency = open_hz * 2^((fret + capo) / 12)
///
/// Equal-tempered, applied the same way for every tone.
pub fn string_frequency(string: usize, fret: u8, capo: u8) -> f64 {
    let semitones = fret as f64 + capo as f64;
    STANDARD_TUNING[string] * 2.0_f64.powf(semitones / 12.0)
}

/// Convert MIDI note number (fractional) to Hz. A4 = MIDI 69 = 440 Hz.
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

/// Convert Hz to MIDI note number (fractional).
pub fn hz_to_midi(hz: f64) -> f64 {
    69.0 + 12.0 * (hz / 440.0).log2()
}

/// Nearest note name with octave and cent deviation, e.g. "G3" or "A4-12".
pub fn hz_to_note_name(hz: f64) -> String {
    if hz < 20.0 {
        return "---".to_string();
    }
    let midi = hz_to_midi(hz);
    let note_num = midi.round() as i32;
    let cents = ((midi - note_num as f64) * 100.0).round() as i32;

    let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let name = note_names[note_num.rem_euclid(12) as usize];
    let octave = note_num.div_euclid(12) - 1;

    if cents == 0 {
        format!("{}{}", name, octave)
    } else if cents > 0 {
        format!("{}{}+{}", name, octave, cents)
    } else {
        format!("{}{}{}", name, octave, cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_hz_roundtrip() {
        assert!((midi_to_hz(69.0) - 440.0).abs() < 0.01);
        assert!((hz_to_midi(440.0) - 69.0).abs() < 0.001);
        // Low E2 is MIDI 40
        assert!((hz_to_midi(STANDARD_TUNING[0]) - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_open_string_is_base_frequency() {
        for s in 0..NUM_STRINGS {
            assert_eq!(string_frequency(s, 0, 0), STANDARD_TUNING[s]);
        }
    }

    #[test]
    fn test_pitch_law() {
        for s in 0..NUM_STRINGS {
            for fret in 0..=15u8 {
                for capo in 0..=12u8 {
                    let expected =
                        STANDARD_TUNING[s] * 2.0_f64.powf((fret + capo) as f64 / 12.0);
                    assert!((string_frequency(s, fret, capo) - expected).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_pitch_monotonic_in_fret_and_capo() {
        for s in 0..NUM_STRINGS {
            for n in 0..12u8 {
                assert!(string_frequency(s, n + 1, 0) > string_frequency(s, n, 0));
                assert!(string_frequency(s, 0, n + 1) > string_frequency(s, 0, n));
            }
        }
    }

    #[test]
    fn test_twelve_frets_is_octave() {
        let f = string_frequency(1, 12, 0);
        assert!((f - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(hz_to_note_name(440.0), "A4");
        assert_eq!(hz_to_note_name(string_frequency(3, 0, 0)), "G3");
        assert_eq!(hz_to_note_name(10.0), "---");
    }
}
