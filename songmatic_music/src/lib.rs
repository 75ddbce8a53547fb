// Songmatic snippet generator
//
// Builds short MIDI snippets (chords, bass line, melody or drum pattern)
// in a chosen major key. Rhythms come from random 16-bit patterns OR'd with
// per-part biases so downbeats land where a listener expects them. Pitches
// come from a smooth 1-D gradient-noise walk over the scale's seven
// degrees, which keeps melodic motion mostly stepwise.
//
// Architecture:
// - scale.rs: Circle-of-fifths key resolution, note spelling, MIDI keys
// - mode.rs: The seven diatonic modes with their triad/seventh qualities
// - rhythm.rs: 16-slot onset patterns and the bias masks OR'd into them
// - noise.rs: Seeded multi-octave gradient noise
// - generator.rs: Per-request context (PRNG, noise walk, composer config)
// - config.rs: Composer tuning (velocities, weight tables), JSON loadable
// - snippet.rs: Bar/slot data model, instruments, content types
// - compose.rs: Bar composers for each content type
// - midi.rs: Single-track SMF writer plus a structural reader for checks
// - params.rs: Request validation, lenient defaults, output filename
// - error.rs: Error taxonomy
//
// Output is deterministic given a seed. `generate_snippet` is the single
// entry point a front end needs.

pub mod compose;
pub mod config;
pub mod error;
pub mod generator;
pub mod midi;
pub mod mode;
pub mod noise;
pub mod params;
pub mod rhythm;
pub mod scale;
pub mod snippet;

use error::Result;
use generator::Generator;
use params::{MIDI_MIME_TYPE, SongParams};
use scale::Scale;

/// A finished snippet ready to hand to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    pub bytes: Vec<u8>,
    /// `<contenttype>_<tempo>_<tonic>.midi`
    pub filename: String,
    /// Always `audio/midi`.
    pub mime: &'static str,
}

/// Compose and encode one snippet. Either the whole file comes back or an
/// error does.
pub fn generate_snippet(params: &SongParams, generator: &mut Generator) -> Result<MidiFile> {
    let scale = Scale::resolve(params.key)?;
    log::info!(
        "generating {} bars of {} in {} at {} BPM{}",
        params.bars,
        params.content,
        scale.tonic(),
        params.tempo,
        if params.jazz { " (jazz)" } else { "" }
    );
    log::debug!(
        "scale {scale}; ionian chart {}",
        mode::chord_chart(&scale, mode::Mode::Ionian).join(" ")
    );

    let snippet = compose::compose(params.content, &scale, params.bars, params.jazz, generator)?;
    let bytes = midi::write_midi_bytes(&snippet, params.tempo, &scale)?;
    log::debug!("encoded {} bytes", bytes.len());

    Ok(MidiFile {
        bytes,
        filename: params.filename(&scale),
        mime: MIDI_MIME_TYPE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippet::ContentType;

    #[test]
    fn same_seed_same_bytes() {
        let params = SongParams::new(5, 100, ContentType::Melody, 4, false).unwrap();
        let a = generate_snippet(&params, &mut Generator::new(11)).unwrap();
        let b = generate_snippet(&params, &mut Generator::new(11)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mime, "audio/midi");
        assert_eq!(&a.bytes[..4], b"MThd");
    }

    #[test]
    fn different_seeds_differ() {
        let params = SongParams::new(0, 120, ContentType::Chords, 8, true).unwrap();
        let a = generate_snippet(&params, &mut Generator::new(1)).unwrap();
        let b = generate_snippet(&params, &mut Generator::new(2)).unwrap();
        assert_ne!(a.bytes, b.bytes);
    }
}
