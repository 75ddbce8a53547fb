// Seeded one-dimensional gradient (Perlin) noise.
//
// The note selector walks a cursor along this curve and reads a scale degree
// off its local height, so neighbouring calls land on related degrees instead
// of independent draws. Each lattice point gets a random slope in [-1, 1);
// between lattice points the two slopes are blended with the s-curve
// t²(3 - 2t). Several octaves are summed, octave i sampled at x·betaⁱ and
// weighted by 1/alphaⁱ.
//
// Tables are built from the caller's `SongRng`, so the curve is owned by one
// generation call and reproducible from its seed.

use serde::{Deserialize, Serialize};
use songmatic_prng::SongRng;

const TABLE_SIZE: usize = 256;
const TABLE_MASK: usize = TABLE_SIZE - 1;

/// Offset added before lattice lookup so small negative inputs still land on
/// positive lattice coordinates.
const LATTICE_OFFSET: f64 = 4096.0;

/// Octave summation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Weight divisor between successive octaves.
    pub alpha: f64,
    /// Frequency multiplier between successive octaves.
    pub beta: f64,
    /// Number of octaves summed.
    pub octaves: u32,
}

impl Default for NoiseParams {
    fn default() -> Self {
        NoiseParams {
            alpha: 2.0,
            beta: 2.0,
            octaves: 3,
        }
    }
}

/// Seeded 1-D gradient noise function.
#[derive(Debug, Clone)]
pub struct GradientNoise {
    perm: [u8; TABLE_SIZE],
    gradients: [f64; TABLE_SIZE],
    params: NoiseParams,
}

impl GradientNoise {
    pub fn new(rng: &mut SongRng, params: NoiseParams) -> Self {
        let mut gradients = [0.0; TABLE_SIZE];
        for g in gradients.iter_mut() {
            *g = (rng.range_usize(0, 2 * TABLE_SIZE) as f64 - TABLE_SIZE as f64)
                / TABLE_SIZE as f64;
        }

        // Fisher-Yates shuffle of the identity permutation.
        let mut perm: [u8; TABLE_SIZE] = std::array::from_fn(|i| i as u8);
        for i in (1..TABLE_SIZE).rev() {
            let j = rng.range_usize(0, i + 1);
            perm.swap(i, j);
        }

        GradientNoise {
            perm,
            gradients,
            params,
        }
    }

    /// Octave-summed noise at `x`.
    pub fn sample(&self, x: f64) -> f64 {
        let mut weight = 1.0;
        let mut px = x;
        let mut sum = 0.0;
        for _ in 0..self.params.octaves {
            sum += self.single(px) / weight;
            weight *= self.params.alpha;
            px *= self.params.beta;
        }
        sum
    }

    /// Upper bound on `|sample(x)|`: each octave contributes at most
    /// 1/alphaⁱ.
    pub fn amplitude_bound(&self) -> f64 {
        (0..self.params.octaves)
            .map(|i| 1.0 / self.params.alpha.powi(i as i32))
            .sum()
    }

    fn single(&self, x: f64) -> f64 {
        let t = x + LATTICE_OFFSET;
        let floor = t.floor();
        let b0 = (floor as i64 as usize) & TABLE_MASK;
        let b1 = (b0 + 1) & TABLE_MASK;
        let r0 = t - floor;
        let r1 = r0 - 1.0;

        let u = r0 * self.gradients[self.perm[b0] as usize];
        let v = r1 * self.gradients[self.perm[b1] as usize];
        lerp(s_curve(r0), u, v)
    }
}

#[inline]
fn s_curve(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}
