// Deterministic, portable pseudo-random source for harmony generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Hand-rolled so the output stream is identical on every platform and never
// changes underneath a caller who pinned a seed.
//
// Every random decision the engine makes (root pick, quality pick, polychord
// pick, alternative roots) goes through the `RandomSource` trait rather than
// an ambient global. `ChordRng` is the production implementation; tests can
// supply a stub that overrides `range_usize` to pin exact outcomes. `choose`
// is the single "pick one of N" primitive built on top of it.
//
// **Critical constraint: determinism.** `next_u64` must produce identical
// output given the same prior state, regardless of platform, compiler
// version, or optimization level. No floating point in the core generator.

use serde::{Deserialize, Serialize};

/// Anything that can feed the engine's random choices.
///
/// Only `next_u64` is required. The provided methods derive everything else
/// from it, so a stub that overrides `range_usize` controls every `choose`.
pub trait RandomSource {
    /// Next raw 64-bit value in the stream.
    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `[low, high)` via rejection sampling.
    ///
    /// Panics if `low >= high`.
    fn range_u64(&mut self, low: u64, high: u64) -> u64 {
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

    /// Uniform `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }
}

/// Pick one candidate uniformly. `None` only for an empty slice.
pub fn choose<'a, T, R: RandomSource + ?Sized>(rng: &mut R, candidates: &'a [T]) -> Option<&'a T> {
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.range_usize(0, candidates.len());
    candidates.get(idx)
}

/// Xoshiro256++ generator, the engine's default `RandomSource`.
///
/// Callers own their instance and pass it down by `&mut`; two generators
/// created from the same seed walk the same sequence of chord choices.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChordRng {
    s: [u64; 4],
}

impl ChordRng {
    /// Create a new generator seeded from a `u64`.
    ///
    /// SplitMix64 expands the seed into the 256-bit internal state.
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

    /// Seed from the wall clock, for callers that did not ask for a seed.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5eed);
        Self::new(nanos ^ u64::from(std::process::id()).rotate_left(32))
    }
}

impl RandomSource for ChordRng {
    fn next_u64(&mut self) -> u64 {
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
}

/// SplitMix64, used only to expand a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
