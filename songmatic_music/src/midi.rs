// MIDI output from song snippets.
//
// Renders a `SongSnippet` as a single-track Standard MIDI File (SMF Format 0)
// at 480 ticks per quarter note, entirely in memory. The track opens with a
// header at delta 0 (4/4 time signature, tempo, key signature, instrument
// name, program change) and then walks every bar slot by slot:
//
// - Percussion channel: each sounding kit hit is a note-on immediately
//   followed by its note-off, both at delta 0. After the slot's layers a
//   key-0 note-off carrying one sixteenth of delta advances the clock, so
//   the track stays on the sixteenth grid even through silent slots.
// - Melodic channels: note-ons for every key of every sounding event, then
//   note-offs where the first carries the event's duration and the rest
//   delta 0. Silent slots add their sixteenth to the delta of whatever event
//   comes next (or to end-of-track).
//
// Uses the `midly` crate for encoding and, in `SmfSummary`, for reading a
// file back.

use crate::error::{Result, SongError};
use crate::rhythm::SLOTS_PER_BAR;
use crate::scale::Scale;
use crate::snippet::{BarEvent, SongSnippet, TICKS_PER_QUARTER, TICKS_PER_SIXTEENTH};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

/// Beats per bar and the denominator's power of two (4/4).
const METER_NUMERATOR: u8 = 4;
const METER_DENOMINATOR_POW2: u8 = 2;
/// MIDI clocks per metronome click and 32nd notes per quarter.
const CLOCKS_PER_CLICK: u8 = 24;
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;

/// Largest value the 24-bit tempo meta event can carry.
const MAX_MICROS_PER_QUARTER: u32 = 0xFF_FFFF;

/// Microseconds per quarter note for a tempo in BPM. Tempos too slow for the
/// 24-bit tempo field are rejected rather than wrapped.
pub fn micros_per_quarter(tempo_bpm: u16) -> Result<u32> {
    if tempo_bpm == 0 {
        return Err(SongError::invalid("tempo", tempo_bpm, "tempo must be positive"));
    }
    let micros = 60_000_000 / tempo_bpm as u32;
    if micros > MAX_MICROS_PER_QUARTER {
        return Err(SongError::invalid(
            "tempo",
            tempo_bpm,
            format!("{micros} us per quarter does not fit the 24-bit tempo field"),
        ));
    }
    Ok(micros)
}

/// Encode a snippet to SMF bytes.
pub fn write_midi_bytes(snippet: &SongSnippet, tempo_bpm: u16, scale: &Scale) -> Result<Vec<u8>> {
    let smf = snippet_to_smf(snippet, tempo_bpm, scale)?;
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok(buf)
}

/// Convert a snippet to an in-memory SMF.
pub fn snippet_to_smf(snippet: &SongSnippet, tempo_bpm: u16, scale: &Scale) -> Result<Smf<'static>> {
    snippet.check()?;
    let tempo = micros_per_quarter(tempo_bpm)?;
    let instrument = snippet.instrument;
    let channel = u4::new(instrument.channel);

    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));
    let mut track: Track<'static> = Vec::new();

    track.push(at(
        0,
        TrackEventKind::Meta(MetaMessage::TimeSignature(
            METER_NUMERATOR,
            METER_DENOMINATOR_POW2,
            CLOCKS_PER_CLICK,
            THIRTY_SECONDS_PER_QUARTER,
        )),
    ));
    track.push(at(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo)))));
    track.push(at(
        0,
        TrackEventKind::Meta(MetaMessage::KeySignature(scale.key_signature(), false)),
    ));
    track.push(at(
        0,
        TrackEventKind::Meta(MetaMessage::InstrumentName(instrument.name.as_bytes())),
    ));
    track.push(at(
        0,
        TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(instrument.program),
            },
        },
    ));

    // Ticks of silence not yet attached to an event.
    let mut pending: u32 = 0;

    for bar in &snippet.bars {
        for slot in 0..SLOTS_PER_BAR {
            let sounding: Vec<&BarEvent> = bar
                .layers()
                .iter()
                .filter_map(|layer| layer.slot(slot))
                .filter(|event| event.is_sounding())
                .collect();

            if instrument.is_percussion() {
                for event in &sounding {
                    for &key in &event.keys {
                        track.push(at(0, note_on(channel, key, event.velocity)));
                    }
                    for &key in &event.keys {
                        track.push(at(0, note_off(channel, key)));
                    }
                }
                track.push(at(TICKS_PER_SIXTEENTH, note_off(channel, 0)));
            } else if sounding.is_empty() {
                pending += TICKS_PER_SIXTEENTH;
            } else {
                for event in &sounding {
                    for &key in &event.keys {
                        track.push(at(
                            std::mem::take(&mut pending),
                            note_on(channel, key, event.velocity),
                        ));
                    }
                }
                let mut delta = sounding[0].duration;
                for event in &sounding {
                    for &key in &event.keys {
                        track.push(at(delta, note_off(channel, key)));
                        delta = 0;
                    }
                }
            }
        }
    }

    track.push(at(pending, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    smf.tracks.push(track);

    Ok(smf)
}

fn at(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note_on(channel: u4, key: u8, velocity: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel,
        message: MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(velocity),
        },
    }
}

fn note_off(channel: u4, key: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel,
        message: MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(0),
        },
    }
}

/// What a reader sees in a generated file. Built by parsing the bytes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmfSummary {
    pub track_count: usize,
    pub ticks_per_quarter: Option<u16>,
    pub micros_per_quarter: Option<u32>,
    /// (numerator, denominator power of two)
    pub time_signature: Option<(u8, u8)>,
    /// (signed accidentals, minor)
    pub key_signature: Option<(i8, bool)>,
    pub instrument_name: Option<String>,
    pub programs: Vec<u8>,
    pub channels: Vec<u8>,
    pub note_ons: usize,
    pub note_offs: usize,
    /// Total track length in ticks.
    pub length_ticks: u64,
}

impl SmfSummary {
    pub fn parse(bytes: &[u8]) -> Result<SmfSummary> {
        let smf = Smf::parse(bytes).map_err(|e| SongError::Midi(e.to_string()))?;
        let mut summary = SmfSummary {
            track_count: smf.tracks.len(),
            ticks_per_quarter: match smf.header.timing {
                Timing::Metrical(tpq) => Some(tpq.as_int()),
                Timing::Timecode(..) => None,
            },
            micros_per_quarter: None,
            time_signature: None,
            key_signature: None,
            instrument_name: None,
            programs: Vec::new(),
            channels: Vec::new(),
            note_ons: 0,
            note_offs: 0,
            length_ticks: 0,
        };

        for track in &smf.tracks {
            let mut ticks: u64 = 0;
            for event in track {
                ticks += event.delta.as_int() as u64;
                match event.kind {
                    TrackEventKind::Meta(MetaMessage::Tempo(t)) => {
                        summary.micros_per_quarter = Some(t.as_int());
                    }
                    TrackEventKind::Meta(MetaMessage::TimeSignature(num, den, _, _)) => {
                        summary.time_signature = Some((num, den));
                    }
                    TrackEventKind::Meta(MetaMessage::KeySignature(acc, minor)) => {
                        summary.key_signature = Some((acc, minor));
                    }
                    TrackEventKind::Meta(MetaMessage::InstrumentName(name)) => {
                        summary.instrument_name = Some(String::from_utf8_lossy(name).into_owned());
                    }
                    TrackEventKind::Midi { channel, message } => {
                        let ch = channel.as_int();
                        if !summary.channels.contains(&ch) {
                            summary.channels.push(ch);
                        }
                        match message {
                            MidiMessage::ProgramChange { program } => {
                                summary.programs.push(program.as_int());
                            }
                            MidiMessage::NoteOn { vel, .. } if vel.as_int() > 0 => {
                                summary.note_ons += 1;
                            }
                            MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. } => {
                                summary.note_offs += 1;
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
            summary.length_ticks = summary.length_ticks.max(ticks);
        }
        Ok(summary)
    }
}
