// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Randomness owned by one curve builder.
///
/// `random` draws from a seeded generator. `hash` and `noise` are pure
/// functions of the seed and an index, with `hash` keeping its own cursor so
/// successive calls in a script are stable across rebuilds.
#[derive(Clone, Debug)]
pub struct Randomness {
    seed: u64,
    rng: StdRng,
    hash_index: u64,
}

impl Randomness {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            hash_index: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restarts every sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Restarts the hash cursor only; the generator keeps its state.
    pub fn rewind(&mut self) {
        self.hash_index = 0;
    }

    /// Uniform value in `[0, 1)`.
    pub fn random(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform value in `[low, high)`; returns `low` for an empty range.
    pub fn random_range(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Next value of the deterministic hash sequence, in `[0, 1)`.
    pub fn hash(&mut self) -> f64 {
        let value = self.hash_at(self.hash_index);
        self.hash_index += 1;
        value
    }

    /// Deterministic hash of `index` under this seed, in `[0, 1)`.
    pub fn hash_at(&self, index: u64) -> f64 {
        unit(splitmix(self.seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    /// Smooth 1D value noise in `[0, 1]`, with lattice points at integers.
    pub fn noise(&self, x: f64) -> f64 {
        if !x.is_finite() {
            return 0.5;
        }
        let cell = x.floor();
        let f = x - cell;
        let a = self.lattice(cell as i64);
        let b = self.lattice(cell as i64 + 1);
        let smooth = f * f * (3.0 - 2.0 * f);
        a + (b - a) * smooth
    }

    fn lattice(&self, i: i64) -> f64 {
        unit(splitmix(self.seed.rotate_left(17) ^ i as u64))
    }
}

fn splitmix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn unit(bits: u64) -> f64 {
    (bits >> 11) as f64 / (1_u64 << 53) as f64
}
