// Data-driven composer configuration.
//
// Every tunable the bar composer and note selector read lives in
// `ComposerConfig`: per-layer velocity ranges, the weighted octave and
// chord-extension tables, the degree-preference table, and the noise curve
// parameters. `Default` reproduces the stock Songmatic feel; a JSON file can
// override any subset of fields (missing fields keep their defaults).
//
// Weighted tables are expressed by repetition: `[0, 0, 0, 1]` picks 0 three
// times as often as 1.
//
// `validate()` runs before a `Generator` accepts a config, so composition
// code can index these tables without re-checking them.

use crate::error::{Result, SongError};
use crate::noise::NoiseParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Half-open velocity range `[min, max)` for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityRange {
    pub min: u8,
    /// Exclusive; at most 128.
    pub max: u8,
}

impl VelocityRange {
    pub const fn new(min: u8, max: u8) -> Self {
        VelocityRange { min, max }
    }

    /// Sounding notes must never draw velocity 0 (that is a note-off) and
    /// must stay inside 7-bit MIDI range.
    fn check(&self, layer: &str) -> Result<()> {
        if self.min == 0 || self.min >= self.max || self.max > 128 {
            return Err(SongError::Config(format!(
                "{layer} velocity range [{}, {}) must be non-empty and within [1, 128)",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub chord_velocity: VelocityRange,
    pub bass_velocity: VelocityRange,
    pub melody_velocity: VelocityRange,
    pub kick_velocity: VelocityRange,
    pub snare_velocity: VelocityRange,
    pub hihat_velocity: VelocityRange,

    /// Weighted octave offsets for chord tones and melody notes. Bass uses
    /// the negated pick below its fixed two-octave drop.
    pub octave_weights: Vec<i8>,
    /// Weighted scale-degree offsets for the fourth chord tone in jazz mode.
    /// 7 lands back on the root an octave choice away.
    pub chord_extensions: Vec<usize>,
    /// Table the noise height indexes into; entries are scale degrees 0..7.
    pub degree_preferences: Vec<usize>,

    pub noise: NoiseParams,
    /// Cursor advance per note selection.
    pub note_step: f64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            chord_velocity: VelocityRange::new(50, 110),
            bass_velocity: VelocityRange::new(80, 110),
            melody_velocity: VelocityRange::new(80, 110),
            kick_velocity: VelocityRange::new(70, 110),
            snare_velocity: VelocityRange::new(60, 90),
            hihat_velocity: VelocityRange::new(50, 80),
            octave_weights: vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 2],
            chord_extensions: vec![2, 4, 6, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7],
            degree_preferences: (0..7).collect(),
            noise: NoiseParams::default(),
            note_step: 0.01,
        }
    }
}

impl ComposerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ComposerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.chord_velocity.check("chord")?;
        self.bass_velocity.check("bass")?;
        self.melody_velocity.check("melody")?;
        self.kick_velocity.check("kick")?;
        self.snare_velocity.check("snare")?;
        self.hihat_velocity.check("hi-hat")?;

        if self.octave_weights.is_empty() {
            return Err(SongError::Config("octave_weights is empty".into()));
        }
        if let Some(o) = self.octave_weights.iter().find(|o| !(-4..=4).contains(*o)) {
            return Err(SongError::Config(format!(
                "octave offset {o} outside -4..=4"
            )));
        }
        if self.chord_extensions.is_empty() {
            return Err(SongError::Config("chord_extensions is empty".into()));
        }
        if self.degree_preferences.is_empty() {
            return Err(SongError::Config("degree_preferences is empty".into()));
        }
        if let Some(d) = self.degree_preferences.iter().find(|&&d| d >= 7) {
            return Err(SongError::Config(format!(
                "degree preference {d} is not a scale degree"
            )));
        }
        if !(self.note_step.is_finite() && self.note_step > 0.0) {
            return Err(SongError::Config(format!(
                "note_step {} must be positive",
                self.note_step
            )));
        }
        let noise = &self.noise;
        if noise.octaves == 0 || noise.alpha.is_nan() || noise.alpha <= 0.0 || !noise.beta.is_finite() {
            return Err(SongError::Config(format!(
                "noise parameters {noise:?} are unusable"
            )));
        }
        Ok(())
    }
}
