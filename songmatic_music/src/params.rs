// Request parameters: validation, defaults and output naming.
//
// Callers hand over up to five primitive values: key selector, tempo,
// content type, bar count and the jazz flag. There are two ways in.
// `SongParams::new` validates strictly and returns `InvalidInput` for
// anything out of range. `SongParams::resolve` takes raw optional strings
// (as a query string would supply them) and replaces each missing or bad
// value with a default, logging a warning for every bad one:
//
//   key     random selector in 0..=12
//   tempo   random BPM in 60..=150
//   type    chords
//   bars    4
//   jazz    false
//
// Defaults draw from the request's own `Generator`, so a seeded request
// resolves the same way every time.

use crate::error::{Result, SongError};
use crate::generator::Generator;
use crate::scale::{MAX_KEY_SELECTOR, Scale};
use crate::snippet::ContentType;
use serde::{Deserialize, Serialize};

pub const MIN_TEMPO: u16 = 60;
pub const MAX_TEMPO: u16 = 150;
pub const DEFAULT_BARS: usize = 4;
pub const MAX_BARS: usize = 64;
pub const DEFAULT_CONTENT: ContentType = ContentType::Chords;

pub const MIDI_MIME_TYPE: &str = "audio/midi";

/// Validated generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongParams {
    /// Circle-of-fifths key selector, 0..=12.
    pub key: u8,
    /// Beats per minute, 60..=150.
    pub tempo: u16,
    pub content: ContentType,
    /// 1..=64.
    pub bars: usize,
    /// Add a fourth extension tone to chords.
    pub jazz: bool,
}

/// Unvalidated request values, as strings straight from the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawParams<'a> {
    pub key: Option<&'a str>,
    pub tempo: Option<&'a str>,
    pub content: Option<&'a str>,
    pub bars: Option<&'a str>,
    pub jazz: Option<&'a str>,
}

impl SongParams {
    pub fn new(key: i64, tempo: i64, content: ContentType, bars: i64, jazz: bool) -> Result<Self> {
        Ok(SongParams {
            key: check_key(key)?,
            tempo: check_tempo(tempo)?,
            content,
            bars: check_bars(bars)?,
            jazz,
        })
    }

    /// Resolve raw values, substituting defaults for missing or invalid ones.
    pub fn resolve(raw: &RawParams<'_>, generator: &mut Generator) -> SongParams {
        let key = match raw.key.map(|s| parse_int("key", s).and_then(check_key)) {
            Some(Ok(key)) => key,
            other => {
                let key = generator.random_key_selector();
                note_fallback(other, format!("random key {key}"));
                key
            }
        };
        let tempo = match raw.tempo.map(|s| parse_int("tempo", s).and_then(check_tempo)) {
            Some(Ok(tempo)) => tempo,
            other => {
                let tempo = generator.random_tempo();
                note_fallback(other, format!("random tempo {tempo}"));
                tempo
            }
        };
        let content = match raw.content.map(str::parse::<ContentType>) {
            Some(Ok(content)) => content,
            other => {
                note_fallback(other, DEFAULT_CONTENT.to_string());
                DEFAULT_CONTENT
            }
        };
        let bars = match raw.bars.map(|s| parse_int("bars", s).and_then(check_bars)) {
            Some(Ok(bars)) => bars,
            other => {
                note_fallback(other, format!("{DEFAULT_BARS} bars"));
                DEFAULT_BARS
            }
        };
        let jazz = match raw.jazz.map(parse_flag) {
            Some(Ok(jazz)) => jazz,
            other => {
                note_fallback(other, "no jazz extensions".to_string());
                false
            }
        };
        SongParams {
            key,
            tempo,
            content,
            bars,
            jazz,
        }
    }

    /// `<contenttype>_<tempo>_<tonic>.midi`
    pub fn filename(&self, scale: &Scale) -> String {
        format!("{}_{}_{}.midi", self.content, self.tempo, scale.tonic())
    }
}

fn note_fallback<T>(outcome: Option<Result<T>>, substitute: String) {
    match outcome {
        Some(Err(e)) => log::warn!("{e}; using {substitute}"),
        _ => log::debug!("parameter absent; using {substitute}"),
    }
}

fn parse_int(field: &'static str, s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|e| SongError::invalid(field, s, e.to_string()))
}

fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SongError::invalid("jazz", s, "expected true or false")),
    }
}

fn check_key(key: i64) -> Result<u8> {
    u8::try_from(key)
        .ok()
        .filter(|&k| k <= MAX_KEY_SELECTOR)
        .ok_or_else(|| {
            SongError::invalid("key", key, format!("key selector must be in 0..={MAX_KEY_SELECTOR}"))
        })
}

fn check_tempo(tempo: i64) -> Result<u16> {
    u16::try_from(tempo)
        .ok()
        .filter(|t| (MIN_TEMPO..=MAX_TEMPO).contains(t))
        .ok_or_else(|| {
            SongError::invalid("tempo", tempo, format!("tempo must be in {MIN_TEMPO}..={MAX_TEMPO} BPM"))
        })
}

fn check_bars(bars: i64) -> Result<usize> {
    usize::try_from(bars)
        .ok()
        .filter(|b| (1..=MAX_BARS).contains(b))
        .ok_or_else(|| SongError::invalid("bars", bars, format!("bar count must be in 1..={MAX_BARS}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_params_accept_the_documented_ranges() {
        let p = SongParams::new(0, 120, ContentType::Chords, 2, false).unwrap();
        assert_eq!(p.key, 0);
        assert_eq!(p.tempo, 120);
        assert_eq!(p.bars, 2);
        assert!(SongParams::new(12, 60, ContentType::Drums, 64, true).is_ok());
        assert!(SongParams::new(12, 150, ContentType::Drums, 1, true).is_ok());
    }

    #[test]
    fn strict_params_reject_out_of_range() {
        for (key, tempo, bars) in [(13, 120, 4), (-1, 120, 4), (0, 59, 4), (0, 151, 4), (0, 120, 0), (0, 120, 65)] {
            let err = SongParams::new(key, tempo, ContentType::Bass, bars, false).unwrap_err();
            assert!(err.is_invalid_input(), "{key} {tempo} {bars}");
        }
    }

    #[test]
    fn resolve_keeps_good_values() {
        let raw = RawParams {
            key: Some("7"),
            tempo: Some(" 98 "),
            content: Some("melody"),
            bars: Some("3"),
            jazz: Some("true"),
        };
        let p = SongParams::resolve(&raw, &mut Generator::new(1));
        assert_eq!(
            p,
            SongParams {
                key: 7,
                tempo: 98,
                content: ContentType::Melody,
                bars: 3,
                jazz: true,
            }
        );
    }

    #[test]
    fn resolve_substitutes_defaults() {
        let raw = RawParams {
            key: Some("C sharp"),
            tempo: Some("999"),
            content: Some("kazoo"),
            bars: Some("-2"),
            jazz: Some("maybe"),
        };
        let p = SongParams::resolve(&raw, &mut Generator::new(2));
        assert!(p.key <= 12);
        assert!((MIN_TEMPO..=MAX_TEMPO).contains(&p.tempo));
        assert_eq!(p.content, ContentType::Chords);
        assert_eq!(p.bars, DEFAULT_BARS);
        assert!(!p.jazz);

        let empty = SongParams::resolve(&RawParams::default(), &mut Generator::new(2));
        assert_eq!(empty.bars, DEFAULT_BARS);
        assert_eq!(empty.content, ContentType::Chords);
    }

    #[test]
    fn resolve_is_reproducible_for_a_seed() {
        let a = SongParams::resolve(&RawParams::default(), &mut Generator::new(40));
        let b = SongParams::resolve(&RawParams::default(), &mut Generator::new(40));
        assert_eq!(a, b);
    }

    #[test]
    fn numeric_content_type_index() {
        let raw = RawParams {
            content: Some("1"),
            ..RawParams::default()
        };
        let p = SongParams::resolve(&raw, &mut Generator::new(3));
        assert_eq!(p.content, ContentType::Drums);
    }

    #[test]
    fn filename_format() {
        let p = SongParams::new(0, 120, ContentType::Chords, 2, false).unwrap();
        assert_eq!(p.filename(&Scale::resolve(0).unwrap()), "chords_120_C.midi");
        let p = SongParams::new(8, 75, ContentType::Bass, 2, false).unwrap();
        assert_eq!(p.filename(&Scale::resolve(8).unwrap()), "bass_75_Bb.midi");
    }
}
