// Deterministic, portable pseudo-random number generator for Songmatic.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. Every
// random decision made while generating a snippet (rhythm masks, velocities,
// octave and extension picks, the noise tables behind the note walk) draws
// from one `SongRng` owned by that generation call. Nothing here is global:
// two requests never share a generator, and replaying a seed replays the
// snippet exactly.
//
// Do not use floating-point arithmetic in the core generator. The float
// helpers only rescale integer output.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG, the sole source of randomness for snippet generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SongRng {
    s: [u64; 4],
}

impl SongRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `u16` from the upper 16 bits of a `u64`. Used for
    /// sixteen-slot rhythm masks.
    pub fn next_u16(&mut self) -> u16 {
        (self.next_u64() >> 48) as u16
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Generate a uniform random `u8` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_u8(&mut self, low: u8, high: u8) -> u8 {
        self.range_u64(low as u64, high as u64) as u8
    }

    /// Generate a uniform random `u8` in `[low, high]`.
    ///
    /// Panics if `low > high`.
    pub fn range_u8_inclusive(&mut self, low: u8, high: u8) -> u8 {
        assert!(low <= high, "range_u8_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as u8
    }

    /// Pick one element uniformly. Weighted tables are expressed by
    /// repeating entries, e.g. `[0, 0, 0, 1]`.
    ///
    /// Returns `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.range_usize(0, items.len()))
    }
}

/// SplitMix64, used only to expand a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = SongRng::new(42);
        let mut b = SongRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = SongRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn next_u16_covers_high_and_low_bits() {
        let mut rng = SongRng::new(7);
        let mut or_all = 0u16;
        let mut and_all = u16::MAX;
        for _ in 0..1000 {
            let v = rng.next_u16();
            or_all |= v;
            and_all &= v;
        }
        assert_eq!(or_all, u16::MAX);
        assert_eq!(and_all, 0);
    }

    #[test]
    fn range_u8_within_bounds() {
        let mut rng = SongRng::new(888);
        for _ in 0..10_000 {
            let v = rng.range_u8(60, 80);
            assert!((60..80).contains(&v), "range_u8 out of range: {v}");
        }
    }

    #[test]
    fn range_u8_inclusive_reaches_both_ends() {
        let mut rng = SongRng::new(31);
        let mut saw_low = false;
        let mut saw_high = false;
        for _ in 0..10_000 {
            let v = rng.range_u8_inclusive(60, 62);
            assert!((60..=62).contains(&v));
            saw_low |= v == 60;
            saw_high |= v == 62;
        }
        assert!(saw_low && saw_high);
    }

    #[test]
    fn pick_respects_repetition_weights() {
        let mut rng = SongRng::new(99);
        let table = [0u8, 0, 0, 1];
        let n = 10_000;
        let zeros = (0..n)
            .filter(|_| *rng.pick(&table).unwrap() == 0)
            .count();
        let pct = zeros as f64 / n as f64;
        assert!((0.70..0.80).contains(&pct), "expected ~75%, got {pct}");
    }

    #[test]
    fn pick_empty_is_none() {
        let mut rng = SongRng::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = SongRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SongRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
