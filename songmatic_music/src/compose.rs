// Bar composer: fills bars with chords, bass lines, melodies or drum hits.
//
// All four builders share one shape. Per bar and per layer, draw a rhythm
// with the part's bias; every slot the rhythm switches on gets content, every
// other slot is a rest. Pitched parts pick a degree from the note walk,
// look the note up in the middle-C octave and shift it by a weighted random
// octave:
//
//   chords  root + degrees d+3 and d+5 (each its own octave); jazz adds
//           d+ext from the extension table. Bias: every quarter.
//   bass    one note, two octaves down and up to two more. Bias: beat one.
//   melody  one note, root octave or up to two above. Bias: every quarter.
//   drums   kick (1 & 3), snare (2 & 4) and closed hi-hat (every quarter)
//           as three layers of fixed kit keys.
//
// Velocities come from the per-layer ranges in `ComposerConfig`.

use crate::config::VelocityRange;
use crate::error::{Result, SongError};
use crate::generator::Generator;
use crate::rhythm::{RhythmBias, SLOTS_PER_BAR};
use crate::scale::{Scale, midi_key, octave_shift};
use crate::snippet::{BarEvent, BarEvents, BarTracks, ContentType, Instrument, SongSnippet};

/// General-MIDI kit keys.
pub const KICK: u8 = 35;
pub const SNARE: u8 = 38;
pub const CLOSED_HI_HAT: u8 = 42;

/// Degrees stacked on the chosen root, counted in scale steps.
const CHORD_TONE_OFFSETS: [usize; 2] = [3, 5];

/// Fixed drop applied to every bass note before the random extra drop.
const BASS_OCTAVE_DROP: i8 = -2;

pub const CHORD_BIAS: RhythmBias = RhythmBias::EVERY_QUARTER;
pub const BASS_BIAS: RhythmBias = RhythmBias::BEAT_ONE;
pub const MELODY_BIAS: RhythmBias = RhythmBias::EVERY_QUARTER;
pub const KICK_BIAS: RhythmBias = RhythmBias::BEATS_ONE_AND_THREE;
pub const SNARE_BIAS: RhythmBias = RhythmBias::BEATS_TWO_AND_FOUR;
pub const HI_HAT_BIAS: RhythmBias = RhythmBias::EVERY_QUARTER;

/// Compose `bars` bars of the requested part.
pub fn compose(
    content: ContentType,
    scale: &Scale,
    bars: usize,
    jazz: bool,
    generator: &mut Generator,
) -> Result<SongSnippet> {
    let snippet = match content {
        ContentType::Chords => compose_chords(scale, bars, jazz, generator)?,
        ContentType::Drums => compose_drums(bars, generator)?,
        ContentType::Bass => compose_bass(scale, bars, generator)?,
        ContentType::Melody => compose_melody(scale, bars, generator)?,
    };
    log::debug!(
        "composed {} bars of {content} ({} sounding slots)",
        snippet.bar_count(),
        snippet
            .bars
            .iter()
            .flat_map(|b| b.layers())
            .map(|l| l.sounding_count())
            .sum::<usize>()
    );
    Ok(snippet)
}

pub fn compose_chords(
    scale: &Scale,
    bars: usize,
    jazz: bool,
    generator: &mut Generator,
) -> Result<SongSnippet> {
    build_snippet(Instrument::ELECTRIC_GUITAR_JAZZ, bars, generator, |g| {
        let layer = onset_layer(g, CHORD_BIAS, |g| chord_event(scale, jazz, g))?;
        BarTracks::new(vec![layer])
    })
}

pub fn compose_bass(scale: &Scale, bars: usize, generator: &mut Generator) -> Result<SongSnippet> {
    build_snippet(Instrument::ELECTRIC_BASS_FINGER, bars, generator, |g| {
        let layer = onset_layer(g, BASS_BIAS, |g| {
            let (_, note) = g.select_note(scale);
            let octave = BASS_OCTAVE_DROP - g.random_octave();
            let key = octave_shift(midi_key(note)?, octave);
            let range = g.config().bass_velocity;
            Ok(BarEvent::note(vec![key], g.velocity(range)))
        })?;
        BarTracks::new(vec![layer])
    })
}

pub fn compose_melody(
    scale: &Scale,
    bars: usize,
    generator: &mut Generator,
) -> Result<SongSnippet> {
    build_snippet(Instrument::DISTORTION_GUITAR, bars, generator, |g| {
        let layer = onset_layer(g, MELODY_BIAS, |g| {
            let (_, note) = g.select_note(scale);
            let octave = g.random_octave();
            let key = octave_shift(midi_key(note)?, octave);
            let range = g.config().melody_velocity;
            Ok(BarEvent::note(vec![key], g.velocity(range)))
        })?;
        BarTracks::new(vec![layer])
    })
}

pub fn compose_drums(bars: usize, generator: &mut Generator) -> Result<SongSnippet> {
    build_snippet(Instrument::SYNTH_DRUM, bars, generator, |g| {
        let kick_range = g.config().kick_velocity;
        let snare_range = g.config().snare_velocity;
        let hihat_range = g.config().hihat_velocity;
        let kick = kit_layer(g, KICK_BIAS, KICK, kick_range)?;
        let snare = kit_layer(g, SNARE_BIAS, SNARE, snare_range)?;
        let hihat = kit_layer(g, HI_HAT_BIAS, CLOSED_HI_HAT, hihat_range)?;
        BarTracks::new(vec![kick, snare, hihat])
    })
}

fn chord_event(scale: &Scale, jazz: bool, g: &mut Generator) -> Result<BarEvent> {
    let (degree, _) = g.select_note(scale);
    let mut keys = Vec::with_capacity(4);

    let root_octave = g.random_octave();
    keys.push(octave_shift(scale.midi_key(degree)?, root_octave));
    for offset in CHORD_TONE_OFFSETS {
        let octave = g.random_octave();
        keys.push(octave_shift(scale.midi_key(degree + offset)?, octave));
    }

    let range = g.config().chord_velocity;
    let velocity = g.velocity(range);

    if jazz {
        let extension = g.random_extension();
        let octave = g.random_octave();
        keys.push(octave_shift(scale.midi_key(degree + extension)?, octave));
    }

    Ok(BarEvent::note(keys, velocity))
}

/// One layer: sounding events on the rhythm's onsets, rests elsewhere.
fn onset_layer(
    g: &mut Generator,
    bias: RhythmBias,
    mut on_slot: impl FnMut(&mut Generator) -> Result<BarEvent>,
) -> Result<BarEvents> {
    let rhythm = g.rhythm(bias);
    let mut slots = vec![BarEvent::rest(); SLOTS_PER_BAR];
    for slot in rhythm.onsets() {
        slots[slot] = on_slot(g)?;
    }
    BarEvents::new(slots)
}

fn kit_layer(
    g: &mut Generator,
    bias: RhythmBias,
    key: u8,
    range: VelocityRange,
) -> Result<BarEvents> {
    onset_layer(g, bias, |g| Ok(BarEvent::note(vec![key], g.velocity(range))))
}

fn build_snippet(
    instrument: Instrument,
    bars: usize,
    generator: &mut Generator,
    mut bar: impl FnMut(&mut Generator) -> Result<BarTracks>,
) -> Result<SongSnippet> {
    if bars == 0 {
        return Err(SongError::invalid("bars", bars, "a snippet needs at least one bar"));
    }
    let bars = (0..bars)
        .map(|_| bar(generator))
        .collect::<Result<Vec<_>>>()?;
    let snippet = SongSnippet { instrument, bars };
    snippet.check()?;
    Ok(snippet)
}
