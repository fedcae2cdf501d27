//! Seeded randomness helpers.
//!
//! Configured ranges are user data; `min > max` is tolerated by swapping the
//! bounds rather than panicking inside `gen_range`.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Inclusive numeric range read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Bounds ordered low-to-high
    pub fn ordered(&self) -> (f32, f32) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    pub fn sample(&self, rng: &mut StdRng) -> f32 {
        rand_range(rng, self.min, self.max)
    }

    pub fn lerp(&self, t: f32) -> f32 {
        let (lo, hi) = self.ordered();
        lo + (hi - lo) * t
    }
}

/// Uniform value between `a` and `b` in either order
pub fn rand_range(rng: &mut StdRng, a: f32, b: f32) -> f32 {
    let (lo, hi) = (a.min(b), a.max(b));
    if (hi - lo).abs() <= f32::EPSILON || !lo.is_finite() || !hi.is_finite() {
        return lo;
    }
    rng.gen_range(lo..hi)
}

/// Uniform point inside a disk of `radius` (sqrt keeps density uniform)
pub fn point_in_disk(rng: &mut StdRng, radius: f32) -> Vec2 {
    let r = radius * rng.gen::<f32>().sqrt();
    let theta = rng.gen::<f32>() * TAU;
    Vec2::new(theta.cos(), theta.sin()) * r
}

/// Per-effect RNG derived from the scene seed and the effect name
pub fn derived_rng(seed: u64, name: &str) -> StdRng {
    // FNV-1a over the name, folded into the scene seed
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in name.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    StdRng::seed_from_u64(seed ^ hash)
}
