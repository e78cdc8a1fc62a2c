//! Deterministic RNG wrapper, distribution helpers and seed derivation.

use std::f64::consts::PI;
use std::hash::Hasher;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use siphasher::sip::SipHasher13;

/// Deterministic RNG handle used by walkers and samplers.
///
/// The handle wraps `StdRng` and adds the continuous distributions the walk
/// types draw from. A master `seed: u64` must be provided by the caller.
/// Substreams are derived by hashing `(master_seed, substream_id)` with
/// SipHash-1-3 configured with fixed zero keys, so a run with the same seeds
/// replays identically on every platform.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Creates a new RNG handle from a master seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Returns a mutable reference to the underlying RNG for advanced usage.
    pub fn inner_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform number in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform number in `(0, 1)`.
    pub fn uniform_pos(&mut self) -> f64 {
        loop {
            let u = self.uniform();
            if u > 0.0 {
                return u;
            }
        }
    }

    /// Uniform index in `0..n`. Returns 0 for `n == 0`.
    pub fn below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Normally distributed number with mean zero and standard deviation `sigma`.
    pub fn gaussian(&mut self, sigma: f64) -> f64 {
        let u1 = self.uniform_pos();
        let u2 = self.uniform();
        sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Cauchy distributed number with scale `gamma`.
    pub fn cauchy(&mut self, gamma: f64) -> f64 {
        let u = self.uniform_pos();
        gamma * (PI * (u - 0.5)).tan()
    }

    /// Exponentially distributed number with mean `mu`.
    pub fn exponential(&mut self, mu: f64) -> f64 {
        -mu * (-self.uniform()).ln_1p()
    }

    /// Symmetric Lévy alpha-stable number with scale `c` and index `alpha` in `(0, 2]`.
    ///
    /// Uses the Chambers-Mallows-Stuck construction. `alpha == 1` is Cauchy and
    /// `alpha == 2` is Gaussian with variance `2 c^2`.
    pub fn levy(&mut self, c: f64, alpha: f64) -> f64 {
        let u = PI * (self.uniform_pos() - 0.5);
        if alpha == 1.0 {
            return c * u.tan();
        }
        let mut v = 0.0;
        while v == 0.0 {
            v = self.exponential(1.0);
        }
        if alpha == 2.0 {
            return c * 2.0 * u.sin() * v.sqrt();
        }
        let t = (alpha * u).sin() / u.cos().powf(1.0 / alpha);
        let s = (((1.0 - alpha) * u).cos() / v).powf((1.0 - alpha) / alpha);
        c * t * s
    }

    /// Vector of `n` uniform numbers in `[0, 1)`.
    pub fn uniform_vec(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.uniform()).collect()
    }

    /// Vector of `n` standard normal numbers.
    pub fn gaussian_vec(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.gaussian(1.0)).collect()
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Derives the deterministic seed for a specific substream.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}
