// Snippet data model: what the bar composer produces and the MIDI writer
// consumes.
//
// A snippet is a list of bars. Each bar is a `BarTracks`: one or more
// parallel layers (a single chord or bass layer, or kick/snare/hi-hat for
// drums), each layer a `BarEvents` of exactly sixteen sixteenth-note slots.
// A slot is a `BarEvent`: the keys struck together, their duration in ticks,
// and a velocity. A rest is an empty key set at velocity 0.
//
// Slot counts are checked at construction. A snippet lives for one
// generation call and is dropped once serialized.

use crate::error::{Result, SongError};
use crate::rhythm::SLOTS_PER_BAR;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MIDI file resolution.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Duration of every slot.
pub const TICKS_PER_SIXTEENTH: u32 = TICKS_PER_QUARTER as u32 / 4;

/// General-MIDI percussion channel (channel 10, zero-based 9).
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Channel used by every pitched part.
pub const MELODIC_CHANNEL: u8 = 0;

/// One playable moment within a bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarEvent {
    /// MIDI keys struck together. Empty for a rest.
    pub keys: Vec<u8>,
    /// Duration in ticks; always one sixteenth.
    pub duration: u32,
    /// 0 for a rest.
    pub velocity: u8,
}

impl BarEvent {
    pub fn rest() -> Self {
        BarEvent {
            keys: Vec::new(),
            duration: TICKS_PER_SIXTEENTH,
            velocity: 0,
        }
    }

    pub fn note(keys: Vec<u8>, velocity: u8) -> Self {
        BarEvent {
            keys,
            duration: TICKS_PER_SIXTEENTH,
            velocity,
        }
    }

    pub fn is_sounding(&self) -> bool {
        !self.keys.is_empty() && self.velocity > 0
    }
}

/// Sixteen slots of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarEvents(Vec<BarEvent>);

impl BarEvents {
    pub fn new(slots: Vec<BarEvent>) -> Result<Self> {
        if slots.len() != SLOTS_PER_BAR {
            return Err(SongError::InvariantViolation(format!(
                "bar layer has {} slots, expected {SLOTS_PER_BAR}",
                slots.len()
            )));
        }
        Ok(BarEvents(slots))
    }

    pub fn slots(&self) -> &[BarEvent] {
        &self.0
    }

    pub fn slot(&self, index: usize) -> Option<&BarEvent> {
        self.0.get(index)
    }

    pub fn sounding_count(&self) -> usize {
        self.0.iter().filter(|e| e.is_sounding()).count()
    }
}

/// Parallel layers sounding together within one bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarTracks {
    layers: Vec<BarEvents>,
}

impl BarTracks {
    pub fn new(layers: Vec<BarEvents>) -> Result<Self> {
        if layers.is_empty() {
            return Err(SongError::InvariantViolation("bar has no layers".into()));
        }
        Ok(BarTracks { layers })
    }

    pub fn layers(&self) -> &[BarEvents] {
        &self.layers
    }
}

/// General-MIDI instrument assignment for a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instrument {
    /// Written into the instrument-name meta event.
    pub name: &'static str,
    /// Zero-based General-MIDI program number.
    pub program: u8,
    pub channel: u8,
}

impl Instrument {
    pub const ELECTRIC_GUITAR_JAZZ: Instrument = Instrument {
        name: "Electric Guitar (jazz)",
        program: 26,
        channel: MELODIC_CHANNEL,
    };
    pub const DISTORTION_GUITAR: Instrument = Instrument {
        name: "Distortion Guitar",
        program: 30,
        channel: MELODIC_CHANNEL,
    };
    pub const ELECTRIC_BASS_FINGER: Instrument = Instrument {
        name: "Electric Bass (finger)",
        program: 33,
        channel: MELODIC_CHANNEL,
    };
    pub const SYNTH_DRUM: Instrument = Instrument {
        name: "Synth Drum",
        program: 118,
        channel: PERCUSSION_CHANNEL,
    };

    pub fn is_percussion(&self) -> bool {
        self.channel == PERCUSSION_CHANNEL
    }
}

/// Which part to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Chords,
    Drums,
    Bass,
    Melody,
}

impl ContentType {
    /// Indexed the way the web form numbers them.
    pub const ALL: [ContentType; 4] = [
        ContentType::Chords,
        ContentType::Drums,
        ContentType::Bass,
        ContentType::Melody,
    ];

    pub fn from_index(index: i64) -> Result<ContentType> {
        usize::try_from(index)
            .ok()
            .and_then(|i| ContentType::ALL.get(i).copied())
            .ok_or_else(|| SongError::invalid("type", index, "content type index must be in 0..=3"))
    }

    pub fn name(self) -> &'static str {
        match self {
            ContentType::Chords => "chords",
            ContentType::Drums => "drums",
            ContentType::Bass => "bass",
            ContentType::Melody => "melody",
        }
    }

    pub fn instrument(self) -> Instrument {
        match self {
            ContentType::Chords => Instrument::ELECTRIC_GUITAR_JAZZ,
            ContentType::Drums => Instrument::SYNTH_DRUM,
            ContentType::Bass => Instrument::ELECTRIC_BASS_FINGER,
            ContentType::Melody => Instrument::DISTORTION_GUITAR,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentType {
    type Err = SongError;

    /// Accepts the lowercase name or the numeric index.
    fn from_str(s: &str) -> Result<ContentType> {
        let s = s.trim();
        if let Ok(index) = s.parse::<i64>() {
            return ContentType::from_index(index);
        }
        ContentType::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SongError::invalid("type", s, "expected chords, drums, bass or melody"))
    }
}

/// An instrument plus its bars, played in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongSnippet {
    pub instrument: Instrument,
    pub bars: Vec<BarTracks>,
}

impl SongSnippet {
    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    /// Re-check every layer of every bar. Run before serialization.
    pub fn check(&self) -> Result<()> {
        if self.bars.is_empty() {
            return Err(SongError::InvariantViolation("snippet has no bars".into()));
        }
        for (b, bar) in self.bars.iter().enumerate() {
            if bar.layers().is_empty() {
                return Err(SongError::InvariantViolation(format!("bar {b} has no layers")));
            }
            for layer in bar.layers() {
                if layer.slots().len() != SLOTS_PER_BAR {
                    return Err(SongError::InvariantViolation(format!(
                        "bar {b} has a layer of {} slots",
                        layer.slots().len()
                    )));
                }
                for event in layer.slots() {
                    if event.duration != TICKS_PER_SIXTEENTH {
                        return Err(SongError::InvariantViolation(format!(
                            "bar {b} has an event lasting {} ticks",
                            event.duration
                        )));
                    }
                    if event.velocity > 127 || event.keys.iter().any(|&k| k > 127) {
                        return Err(SongError::InvariantViolation(format!(
                            "bar {b} has an event outside 7-bit MIDI range: {event:?}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_bar() -> BarEvents {
        BarEvents::new(vec![BarEvent::rest(); SLOTS_PER_BAR]).unwrap()
    }

    #[test]
    fn rest_is_silent() {
        let rest = BarEvent::rest();
        assert!(!rest.is_sounding());
        assert_eq!(rest.velocity, 0);
        assert_eq!(rest.duration, 120);
        assert!(BarEvent::note(vec![60], 90).is_sounding());
        assert!(!BarEvent::note(vec![60], 0).is_sounding());
    }

    #[test]
    fn layer_must_be_sixteen_slots() {
        let err = BarEvents::new(vec![BarEvent::rest(); 15]).unwrap_err();
        assert!(matches!(err, SongError::InvariantViolation(_)));
        assert_eq!(quiet_bar().slots().len(), 16);
    }

    #[test]
    fn bar_needs_a_layer() {
        assert!(BarTracks::new(Vec::new()).is_err());
        assert_eq!(BarTracks::new(vec![quiet_bar()]).unwrap().layers().len(), 1);
    }

    #[test]
    fn content_type_parsing() {
        assert_eq!("drums".parse::<ContentType>().unwrap(), ContentType::Drums);
        assert_eq!("Melody".parse::<ContentType>().unwrap(), ContentType::Melody);
        assert_eq!("2".parse::<ContentType>().unwrap(), ContentType::Bass);
        assert_eq!("0".parse::<ContentType>().unwrap(), ContentType::Chords);
        assert!("4".parse::<ContentType>().unwrap_err().is_invalid_input());
        assert!("-1".parse::<ContentType>().is_err());
        assert!("kazoo".parse::<ContentType>().is_err());
    }

    #[test]
    fn only_drums_use_the_percussion_channel() {
        for content in ContentType::ALL {
            let instrument = content.instrument();
            assert_eq!(instrument.is_percussion(), content == ContentType::Drums);
        }
        assert_eq!(ContentType::Drums.instrument().channel, 9);
    }

    #[test]
    fn snippet_check_flags_bad_events() {
        let mut slots = vec![BarEvent::rest(); SLOTS_PER_BAR];
        slots[3] = BarEvent::note(vec![200], 90);
        let snippet = SongSnippet {
            instrument: Instrument::DISTORTION_GUITAR,
            bars: vec![BarTracks::new(vec![BarEvents::new(slots).unwrap()]).unwrap()],
        };
        assert!(matches!(
            snippet.check().unwrap_err(),
            SongError::InvariantViolation(_)
        ));
    }
}
