// Scale resolution: key selector to a spelled seven-note diatonic scale.
//
// Keys are addressed by their position on the circle of fifths, sharps first
// and flats after:
//
//   sel:   0  1  2  3  4  5  6   7  8   9   10  11  12
//   key:   C  G  D  A  E  B  F#  F  Bb  Eb  Ab  Db  Gb
//
// The spelling walk starts at the tonic's letter and takes seven letters in
// A..G order, marking the letters that carry an accidental. Sharp keys take
// their accidentals from the front of the order-of-sharps (F C G D A E B),
// flat keys from the back of it (so Bb gets E and B flattened). F is the one
// single-letter flat key.
//
// This module also owns the immutable note-name to MIDI-number table (one
// octave from middle C, every enharmonic spelling a scale can produce) and
// the octave-shift helper used by the bar composer. Both are plain statics:
// safe to share across concurrent generation calls.

use crate::error::{Result, SongError};
use serde::Serialize;
use std::fmt;

/// Circle-of-fifths key table indexed by key selector.
pub const KEYS: [&str; 13] = [
    "C", "G", "D", "A", "E", "B", "F#", "F", "Bb", "Eb", "Ab", "Db", "Gb",
];

/// Highest valid key selector.
pub const MAX_KEY_SELECTOR: u8 = (KEYS.len() - 1) as u8;

/// Order in which sharps are added to a key signature. Flats are the same
/// letters read from the other end.
const SHARP_ORDER: [char; 7] = ['F', 'C', 'G', 'D', 'A', 'E', 'B'];

/// Natural letters in the cycle used for the spelling walk.
const LETTERS: [char; 7] = ['A', 'B', 'C', 'D', 'E', 'F', 'G'];

/// Note name to MIDI key, C4 = 60. Covers every spelling a resolved scale
/// can contain, including B#, Cb, E# and Fb.
const NOTE_MIDI: [(&str, u8); 21] = [
    ("B#", 60),
    ("C", 60),
    ("C#", 61),
    ("Db", 61),
    ("D", 62),
    ("D#", 63),
    ("Eb", 63),
    ("E", 64),
    ("Fb", 64),
    ("E#", 65),
    ("F", 65),
    ("F#", 66),
    ("Gb", 66),
    ("G", 67),
    ("G#", 68),
    ("Ab", 68),
    ("A", 69),
    ("A#", 70),
    ("Bb", 70),
    ("B", 71),
    ("Cb", 71),
];

/// A spelled diatonic scale. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scale {
    notes: [&'static str; 7],
    accidentals: u8,
    use_flats: bool,
}

impl Scale {
    /// Resolve the scale for a circle-of-fifths key selector (0..=12).
    pub fn resolve(selector: u8) -> Result<Scale> {
        let tonic = *KEYS.get(selector as usize).ok_or_else(|| {
            SongError::invalid(
                "key",
                selector,
                format!("key selector must be in 0..={MAX_KEY_SELECTOR}"),
            )
        })?;

        let (count, use_flats) = if tonic.as_bytes().get(1) == Some(&b'b') {
            ((selector as usize + 1) % 7, true)
        } else if tonic == "F" {
            (1, true)
        } else {
            (selector as usize % 7, false)
        };

        let accidentals = if use_flats {
            &SHARP_ORDER[7 - count..]
        } else {
            &SHARP_ORDER[..count]
        };
        let suffix = if use_flats { 'b' } else { '#' };

        let tonic_letter = tonic.chars().next().unwrap_or('C');
        let start = LETTERS
            .iter()
            .position(|&l| l == tonic_letter)
            .ok_or_else(|| SongError::InvariantViolation(format!("bad tonic '{tonic}'")))?;

        let mut notes = [""; 7];
        for (i, note) in notes.iter_mut().enumerate() {
            let letter = LETTERS[(start + i) % 7];
            let spelled = if accidentals.contains(&letter) {
                format!("{letter}{suffix}")
            } else {
                letter.to_string()
            };
            *note = canonical_name(&spelled)?;
        }

        let scale = Scale {
            notes,
            accidentals: count as u8,
            use_flats,
        };
        scale.check()?;
        Ok(scale)
    }

    /// The seven note names, tonic first.
    pub fn notes(&self) -> &[&'static str; 7] {
        &self.notes
    }

    /// Note name of a scale degree (wraps modulo 7).
    pub fn note(&self, degree: usize) -> &'static str {
        self.notes[degree % 7]
    }

    pub fn tonic(&self) -> &'static str {
        self.notes[0]
    }

    /// Number of sharps or flats in the key signature.
    pub fn accidentals(&self) -> u8 {
        self.accidentals
    }

    pub fn use_flats(&self) -> bool {
        self.use_flats
    }

    /// Signed accidental count as used by the SMF key-signature meta event:
    /// positive for sharps, negative for flats.
    pub fn key_signature(&self) -> i8 {
        let count = self.accidentals as i8;
        if self.use_flats { -count } else { count }
    }

    /// MIDI key of a scale degree in the middle-C octave.
    pub fn midi_key(&self, degree: usize) -> Result<u8> {
        midi_key(self.note(degree))
    }

    /// Seven distinct letters and an accidental count no larger than seven.
    fn check(&self) -> Result<()> {
        let mut letters: Vec<u8> = self.notes.iter().map(|n| n.as_bytes()[0]).collect();
        letters.sort_unstable();
        letters.dedup();
        if letters.len() != 7 {
            return Err(SongError::InvariantViolation(format!(
                "scale {self} does not contain seven distinct letters"
            )));
        }
        if self.accidentals > 7 {
            return Err(SongError::InvariantViolation(format!(
                "scale {self} claims {} accidentals",
                self.accidentals
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notes.join(" "))
    }
}

/// MIDI key (C4 octave) for a spelled note name.
pub fn midi_key(name: &str) -> Result<u8> {
    NOTE_MIDI
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, key)| key)
        .ok_or_else(|| SongError::InvariantViolation(format!("no MIDI key for note '{name}'")))
}

fn canonical_name(name: &str) -> Result<&'static str> {
    NOTE_MIDI
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(n, _)| n)
        .ok_or_else(|| SongError::InvariantViolation(format!("unspellable note '{name}'")))
}

/// Shift a key by whole octaves, folding back into 0..=127 one octave at a
/// time when the shift would leave the MIDI range.
pub fn octave_shift(key: u8, octaves: i8) -> u8 {
    let mut shifted = key as i16 + 12 * octaves as i16;
    while shifted > 127 {
        shifted -= 12;
    }
    while shifted < 0 {
        shifted += 12;
    }
    shifted as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major() {
        let scale = Scale::resolve(0).unwrap();
        assert_eq!(scale.notes(), &["C", "D", "E", "F", "G", "A", "B"]);
        assert_eq!(scale.accidentals(), 0);
        assert!(!scale.use_flats());
        assert_eq!(scale.key_signature(), 0);
    }

    #[test]
    fn every_selector_matches_circle_of_fifths() {
        let expected: [(&str, u8, bool); 13] = [
            ("C", 0, false),
            ("G", 1, false),
            ("D", 2, false),
            ("A", 3, false),
            ("E", 4, false),
            ("B", 5, false),
            ("F#", 6, false),
            ("F", 1, true),
            ("Bb", 2, true),
            ("Eb", 3, true),
            ("Ab", 4, true),
            ("Db", 5, true),
            ("Gb", 6, true),
        ];
        for (sel, &(tonic, count, flats)) in expected.iter().enumerate() {
            let scale = Scale::resolve(sel as u8).unwrap();
            assert_eq!(scale.tonic(), tonic, "selector {sel}");
            assert_eq!(scale.accidentals(), count, "selector {sel}");
            assert_eq!(scale.use_flats(), flats, "selector {sel}");
            assert_eq!(scale.use_flats(), sel >= 7, "selector {sel}");

            let marked = scale
                .notes()
                .iter()
                .filter(|n| n.ends_with('#') || n.ends_with('b'))
                .count();
            assert_eq!(marked, count as usize, "selector {sel}: {scale}");

            let mut letters: Vec<char> =
                scale.notes().iter().map(|n| n.chars().next().unwrap()).collect();
            letters.sort();
            letters.dedup();
            assert_eq!(letters.len(), 7, "selector {sel}");
        }
    }

    #[test]
    fn sharp_and_flat_spellings() {
        assert_eq!(
            Scale::resolve(6).unwrap().notes(),
            &["F#", "G#", "A#", "B", "C#", "D#", "E#"]
        );
        assert_eq!(
            Scale::resolve(7).unwrap().notes(),
            &["F", "G", "A", "Bb", "C", "D", "E"]
        );
        assert_eq!(
            Scale::resolve(12).unwrap().notes(),
            &["Gb", "Ab", "Bb", "Cb", "Db", "Eb", "F"]
        );
        assert_eq!(Scale::resolve(12).unwrap().key_signature(), -6);
    }

    #[test]
    fn out_of_range_selector_is_invalid_input() {
        let err = Scale::resolve(13).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn midi_table_covers_enharmonics() {
        assert_eq!(midi_key("C").unwrap(), 60);
        assert_eq!(midi_key("B#").unwrap(), 60);
        assert_eq!(midi_key("Cb").unwrap(), 71);
        assert_eq!(midi_key("E#").unwrap(), midi_key("F").unwrap());
        assert_eq!(midi_key("Fb").unwrap(), midi_key("E").unwrap());
        assert!(midi_key("H").is_err());
    }

    #[test]
    fn every_scale_note_has_a_midi_key() {
        for sel in 0..=MAX_KEY_SELECTOR {
            let scale = Scale::resolve(sel).unwrap();
            for degree in 0..7 {
                let key = scale.midi_key(degree).unwrap();
                assert!((60..=71).contains(&key));
            }
        }
    }

    #[test]
    fn octave_shift_stays_in_midi_range() {
        assert_eq!(octave_shift(60, 0), 60);
        assert_eq!(octave_shift(60, 2), 84);
        assert_eq!(octave_shift(60, -4), 12);
        assert_eq!(octave_shift(71, 5), 119);
        assert_eq!(octave_shift(60, 6), 120);
        assert_eq!(octave_shift(71, 6), 119);
        assert_eq!(octave_shift(5, -1), 5);
    }
}
