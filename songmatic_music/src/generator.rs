// Per-request generation context.
//
// A `Generator` owns everything mutable that one snippet needs: the PRNG,
// the gradient-noise curve built from it, the note-walk cursor and the
// composer config. Build one per request and drop it afterwards; nothing is
// process-global, so concurrent requests cannot observe each other and a
// fixed seed replays the same snippet.
//
// Note selection walks the cursor along the noise curve. Each call reads the
// curve's height at the cursor, scales |height| by 100, indexes the
// degree-preference table modulo its length, and steps the cursor forward.
// Because the curve is smooth, consecutive picks tend to repeat or move to
// nearby table entries instead of jumping at random.

use crate::config::{ComposerConfig, VelocityRange};
use crate::error::Result;
use crate::noise::GradientNoise;
use crate::params::{MAX_TEMPO, MIN_TEMPO};
use crate::rhythm::{Rhythm, RhythmBias, generate_rhythm};
use crate::scale::{MAX_KEY_SELECTOR, Scale};
use songmatic_prng::SongRng;

pub struct Generator {
    rng: SongRng,
    noise: GradientNoise,
    cursor: f64,
    config: ComposerConfig,
}

impl Generator {
    /// Context with the default composer config.
    pub fn new(seed: u64) -> Self {
        Self::build(seed, ComposerConfig::default())
    }

    /// Context with a caller-supplied config, validated first.
    pub fn with_config(seed: u64, config: ComposerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(seed, config))
    }

    fn build(seed: u64, config: ComposerConfig) -> Self {
        let mut rng = SongRng::new(seed);
        let noise = GradientNoise::new(&mut rng, config.noise);
        let cursor = rng.next_f64();
        log::debug!(
            "generator seeded with {seed}, walk starts at {cursor:.4}, noise bound {:.3}",
            noise.amplitude_bound()
        );
        Generator {
            rng,
            noise,
            cursor,
            config,
        }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Current position of the note walk on the noise curve.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Next scale degree (0..7) from the noise walk.
    pub fn next_degree(&mut self) -> usize {
        let height = (self.noise.sample(self.cursor).abs() * 100.0) as usize;
        let prefs = &self.config.degree_preferences;
        let degree = prefs[height % prefs.len()];
        self.cursor += self.config.note_step;
        degree
    }

    /// Next degree together with its note name in `scale`.
    pub fn select_note(&mut self, scale: &Scale) -> (usize, &'static str) {
        let degree = self.next_degree();
        (degree, scale.note(degree))
    }

    pub fn rhythm(&mut self, bias: RhythmBias) -> Rhythm {
        generate_rhythm(&mut self.rng, bias)
    }

    /// Uniform velocity in `[min, max)`.
    pub fn velocity(&mut self, range: VelocityRange) -> u8 {
        self.rng.range_u8(range.min, range.max)
    }

    /// Weighted octave offset from `octave_weights`.
    pub fn random_octave(&mut self) -> i8 {
        self.rng.pick(&self.config.octave_weights).copied().unwrap_or(0)
    }

    /// Weighted degree offset for a jazz extension tone.
    pub fn random_extension(&mut self) -> usize {
        self.rng
            .pick(&self.config.chord_extensions)
            .copied()
            .unwrap_or(7)
    }

    /// Uniform tempo in the accepted BPM range.
    pub fn random_tempo(&mut self) -> u16 {
        self.rng.range_u64(MIN_TEMPO as u64, MAX_TEMPO as u64 + 1) as u16
    }

    /// Uniform circle-of-fifths key selector.
    pub fn random_key_selector(&mut self) -> u8 {
        self.rng.range_u8_inclusive(0, MAX_KEY_SELECTOR)
    }
}

/// Seed for callers that want a fresh snippet per run rather than a replay.
/// Drawn from OS entropy; generation itself only ever uses `SongRng`.
pub fn entropy_seed() -> u64 {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaying_a_seed_replays_degrees() {
        let mut a = Generator::new(1234);
        let mut b = Generator::new(1234);
        let seq_a: Vec<usize> = (0..200).map(|_| a.next_degree()).collect();
        let seq_b: Vec<usize> = (0..200).map(|_| b.next_degree()).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().all(|&d| d < 7));
    }

    #[test]
    fn cursor_starts_in_unit_interval_and_steps() {
        let mut g = Generator::new(77);
        let start = g.cursor();
        assert!((0.0..1.0).contains(&start));
        for _ in 0..10 {
            g.next_degree();
        }
        assert!((g.cursor() - (start + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn walk_tends_to_repeat_neighbouring_degrees() {
        // A smooth curve sampled at small steps should repeat its previous
        // degree far more often than the 1-in-7 of independent draws.
        let mut g = Generator::new(9);
        let seq: Vec<usize> = (0..2000).map(|_| g.next_degree()).collect();
        let repeats = seq.windows(2).filter(|w| w[0] == w[1]).count();
        assert!(
            repeats as f64 / (seq.len() - 1) as f64 > 1.0 / 7.0,
            "only {repeats} repeats"
        );
    }

    #[test]
    fn select_note_names_the_degree() {
        let scale = Scale::resolve(3).unwrap();
        let mut g = Generator::new(5);
        for _ in 0..50 {
            let (degree, name) = g.select_note(&scale);
            assert_eq!(scale.note(degree), name);
        }
    }

    #[test]
    fn draws_respect_config_ranges() {
        let mut g = Generator::new(42);
        let range = g.config().kick_velocity;
        for _ in 0..1000 {
            let v = g.velocity(range);
            assert!(v >= range.min && v < range.max);
            let o = g.random_octave();
            assert!((0..=2).contains(&o));
            assert!([2, 4, 6, 7].contains(&g.random_extension()));
            assert!((MIN_TEMPO..=MAX_TEMPO).contains(&g.random_tempo()));
            assert!(g.random_key_selector() <= 12);
        }
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = ComposerConfig::default();
        config.chord_extensions.clear();
        assert!(Generator::with_config(1, config).is_err());
    }

    #[test]
    fn entropy_seeds_vary() {
        let seeds: std::collections::HashSet<u64> = (0..8).map(|_| entropy_seed()).collect();
        assert!(seeds.len() > 1);
    }

    #[test]
    fn generator_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Generator>();
    }
}
