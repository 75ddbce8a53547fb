// Diatonic modes and per-degree chord labels.
//
// The seven modes are rotations of one major-scale quality pattern:
//
//   Ionian      M m m M M m °
//   Dorian        m m M M m ° M
//   Phrygian        m M M m ° M m
//   ...
//
// Rotating the base tables by the mode index gives, for each scale degree,
// its roman numeral (lower-cased unless the triad is major), triad quality
// and seventh-chord quality. The chord chart joins those labels with a
// resolved scale's note names ("C∆7 (I)").
//
// Informational only: nothing here feeds the MIDI byte stream. The CLI's
// `--modes` flag prints the charts and generation logs the Ionian chart at
// debug level.

use crate::error::{Result, SongError};
use crate::scale::Scale;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven diatonic modes, in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Major scale: starts on degree I.
    Ionian = 0,
    Dorian = 1,
    Phrygian = 2,
    Lydian = 3,
    Mixolydian = 4,
    /// Natural minor: starts on degree VI.
    Aeolian = 5,
    Locrian = 6,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Ionian,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Locrian,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Result<Mode> {
        Mode::ALL
            .get(index)
            .copied()
            .ok_or_else(|| SongError::invalid("mode", index, "mode index must be in 0..=6"))
    }

    pub fn from_name(name: &str) -> Result<Mode> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| SongError::invalid("mode", name, "unknown mode name"))
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Ionian => "Ionian",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Aeolian => "Aeolian",
            Mode::Locrian => "Locrian",
        }
    }

    /// Degree labels for this mode: the base tables rotated by the mode index.
    pub fn scale_degrees(self) -> ScaleDegrees {
        ScaleDegrees::rotate(self.index())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Triad quality of a scale degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriadQuality {
    Major,
    Minor,
    Diminished,
}

impl TriadQuality {
    pub fn code(self) -> &'static str {
        match self {
            TriadQuality::Major => "M",
            TriadQuality::Minor => "m",
            TriadQuality::Diminished => "°",
        }
    }
}

/// Seventh-chord quality of a scale degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeventhQuality {
    MajorSeventh,
    MinorSeventh,
    Dominant,
    Diminished,
}

impl SeventhQuality {
    pub fn code(self) -> &'static str {
        match self {
            SeventhQuality::MajorSeventh => "∆7",
            SeventhQuality::MinorSeventh => "-7",
            SeventhQuality::Dominant => "7",
            SeventhQuality::Diminished => "°7",
        }
    }
}

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII°"];

const TRIADS: [TriadQuality; 7] = [
    TriadQuality::Major,
    TriadQuality::Minor,
    TriadQuality::Minor,
    TriadQuality::Major,
    TriadQuality::Major,
    TriadQuality::Minor,
    TriadQuality::Diminished,
];

const SEVENTHS: [SeventhQuality; 7] = [
    SeventhQuality::MajorSeventh,
    SeventhQuality::MinorSeventh,
    SeventhQuality::MinorSeventh,
    SeventhQuality::MajorSeventh,
    SeventhQuality::Dominant,
    SeventhQuality::MinorSeventh,
    SeventhQuality::Diminished,
];

/// Three parallel per-degree label sequences for one rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleDegrees {
    pub numerals: [String; 7],
    pub triads: [TriadQuality; 7],
    pub sevenths: [SeventhQuality; 7],
}

impl ScaleDegrees {
    /// Rotate the base tables so that position `start` (mod 7) becomes the
    /// first degree.
    pub fn rotate(start: usize) -> ScaleDegrees {
        let numerals = std::array::from_fn(|i| {
            let pos = (start + i) % 7;
            if TRIADS[pos] == TriadQuality::Major {
                NUMERALS[pos].to_string()
            } else {
                NUMERALS[pos].to_lowercase()
            }
        });
        ScaleDegrees {
            numerals,
            triads: std::array::from_fn(|i| TRIADS[(start + i) % 7]),
            sevenths: std::array::from_fn(|i| SEVENTHS[(start + i) % 7]),
        }
    }
}

/// One entry per degree: `<note><seventh> (<numeral>)`.
pub fn chord_chart(scale: &Scale, mode: Mode) -> Vec<String> {
    let degrees = mode.scale_degrees();
    (0..7)
        .map(|i| {
            format!(
                "{}{} ({})",
                scale.note(i),
                degrees.sevenths[i].code(),
                degrees.numerals[i]
            )
        })
        .collect()
}

/// All seven mode charts for a scale, one block per mode.
pub fn describe_modes(scale: &Scale) -> String {
    let mut out = String::new();
    for mode in Mode::ALL {
        out.push_str(mode.name());
        out.push('\n');
        out.push_str(&chord_chart(scale, mode).join(" | "));
        out.push('\n');
    }
    out
}
