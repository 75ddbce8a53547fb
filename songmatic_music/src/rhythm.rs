// Onset masks for one bar at sixteenth-note resolution.
//
// A rhythm is a 16-bit mask, bit 0 being the first sixteenth of the bar:
//
//   slot:  1 e + a 2 e + a 3 e + a 4 e + a
//   bit:   0 1 2 3 4 5 6 7 8 9 A B C D E F
//
// Generation draws a uniform 16-bit value and ORs a bias set into it. The
// bias only ever adds onsets, so a part biased to beats 1 & 3 always hits
// beats 1 & 3 and may hit anything else as well.

use serde::{Deserialize, Serialize};
use songmatic_prng::SongRng;
use std::ops::BitOr;

/// Sixteenth-note slots per bar.
pub const SLOTS_PER_BAR: usize = 16;

/// Named set of slots forced on regardless of the random draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhythmBias(u16);

impl RhythmBias {
    pub const NONE: RhythmBias = RhythmBias(0);
    /// Downbeat only.
    pub const BEAT_ONE: RhythmBias = RhythmBias(0x0001);
    pub const BEATS_ONE_AND_THREE: RhythmBias = RhythmBias(0x0101);
    /// Backbeat.
    pub const BEATS_TWO_AND_FOUR: RhythmBias = RhythmBias(0x1010);
    pub const EVERY_QUARTER: RhythmBias = RhythmBias(0x1111);
    pub const EVERY_EIGHTH: RhythmBias = RhythmBias(0x5555);

    pub const ALL: [RhythmBias; 6] = [
        RhythmBias::NONE,
        RhythmBias::BEAT_ONE,
        RhythmBias::BEATS_ONE_AND_THREE,
        RhythmBias::BEATS_TWO_AND_FOUR,
        RhythmBias::EVERY_QUARTER,
        RhythmBias::EVERY_EIGHTH,
    ];

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for RhythmBias {
    type Output = RhythmBias;

    fn bitor(self, rhs: RhythmBias) -> RhythmBias {
        RhythmBias(self.0 | rhs.0)
    }
}

/// Onset mask for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rhythm(u16);

impl Rhythm {
    pub fn from_bits(bits: u16) -> Rhythm {
        Rhythm(bits)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    /// True if the given sixteenth (0..16) carries an onset.
    pub fn is_on(self, slot: usize) -> bool {
        slot < SLOTS_PER_BAR && (self.0 >> slot) & 1 == 1
    }

    /// Slots that carry an onset, in bar order.
    pub fn onsets(self) -> impl Iterator<Item = usize> {
        (0..SLOTS_PER_BAR).filter(move |&slot| self.is_on(slot))
    }

    pub fn contains(self, bias: RhythmBias) -> bool {
        self.0 & bias.bits() == bias.bits()
    }
}

/// Draw a random onset mask with every bias slot forced on.
pub fn generate_rhythm(rng: &mut SongRng, bias: RhythmBias) -> Rhythm {
    Rhythm(rng.next_u16() | bias.bits())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bias_bits_always_present() {
        let mut rng = SongRng::new(2024);
        for bias in RhythmBias::ALL {
            for _ in 0..500 {
                let rhythm = generate_rhythm(&mut rng, bias);
                assert_eq!(rhythm.bits() & bias.bits(), bias.bits());
                assert!(rhythm.contains(bias));
            }
        }
    }

    #[test]
    fn quarter_bias_covers_each_beat() {
        let onsets: Vec<usize> = Rhythm::from_bits(RhythmBias::EVERY_QUARTER.bits())
            .onsets()
            .collect();
        assert_eq!(onsets, vec![0, 4, 8, 12]);
    }

    #[test]
    fn named_biases_compose() {
        assert_eq!(
            RhythmBias::BEATS_ONE_AND_THREE | RhythmBias::BEATS_TWO_AND_FOUR,
            RhythmBias::EVERY_QUARTER
        );
        assert_eq!(
            RhythmBias::BEAT_ONE | RhythmBias::BEATS_ONE_AND_THREE,
            RhythmBias::BEATS_ONE_AND_THREE
        );
        assert!(Rhythm::from_bits(RhythmBias::EVERY_EIGHTH.bits()).contains(RhythmBias::EVERY_QUARTER));
    }

    #[test]
    fn slot_zero_is_the_downbeat() {
        let rhythm = Rhythm::from_bits(RhythmBias::BEAT_ONE.bits());
        assert!(rhythm.is_on(0));
        assert!(!rhythm.is_on(1));
        assert!(!rhythm.is_on(16));
    }

    #[test]
    fn unbiased_draws_vary() {
        let mut rng = SongRng::new(3);
        let a = generate_rhythm(&mut rng, RhythmBias::NONE);
        let b = generate_rhythm(&mut rng, RhythmBias::NONE);
        let c = generate_rhythm(&mut rng, RhythmBias::NONE);
        assert!(a != b || b != c);
    }
}
