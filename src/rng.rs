use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// Source of randomness injected into emotion dynamics and attribute seeding.
pub trait RandomSource {
    /// Uniform value in `[0, 1)`.
    fn uniform(&mut self) -> f32;

    /// Uniform integer in `range`. An empty range yields its start.
    fn int_in(&mut self, range: RangeInclusive<u32>) -> u32;

    /// Uniform index in `0..len`; `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize;

    /// Index drawn proportionally to `weights`. Falls back to 0 when the
    /// weights are unusable.
    fn weighted(&mut self, weights: &[f32]) -> usize {
        let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
        if !(total > 0.0) {
            return 0;
        }

        let mut acc = 0.0;
        let target = self.uniform() * total;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            acc += w;
            if target < acc {
                return i;
            }
        }

        weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
    }
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    #[inline]
    fn uniform(&mut self) -> f32 {
        (**self).uniform()
    }

    #[inline]
    fn int_in(&mut self, range: RangeInclusive<u32>) -> u32 {
        (**self).int_in(range)
    }

    #[inline]
    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }

    #[inline]
    fn weighted(&mut self, weights: &[f32]) -> usize {
        (**self).weighted(weights)
    }
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    #[inline]
    fn uniform(&mut self) -> f32 {
        (**self).uniform()
    }

    #[inline]
    fn int_in(&mut self, range: RangeInclusive<u32>) -> u32 {
        (**self).int_in(range)
    }

    #[inline]
    fn index(&mut self, len: usize) -> usize {
        (**self).index(len)
    }

    #[inline]
    fn weighted(&mut self, weights: &[f32]) -> usize {
        (**self).weighted(weights)
    }
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }

    pub fn into_inner(self) -> R {
        self.0
    }
}

impl RngSource<StdRng> {
    /// Reproducible source, mainly for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl Default for RngSource<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    #[inline]
    fn uniform(&mut self) -> f32 {
        self.0.random::<f32>()
    }

    #[inline]
    fn int_in(&mut self, range: RangeInclusive<u32>) -> u32 {
        if range.is_empty() {
            return *range.start();
        }

        self.0.random_range(range)
    }

    #[inline]
    fn index(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }

    fn weighted(&mut self, weights: &[f32]) -> usize {
        match WeightedIndex::<f32>::new(weights) {
            Ok(dist) => self.0.sample(&dist),
            Err(_) => 0,
        }
    }
}

/// Replays pre-recorded draws, for asserting exact transition sequences.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct Scripted {
    pub uniforms: std::collections::VecDeque<f32>,
    pub ints: std::collections::VecDeque<u32>,
    pub indexes: std::collections::VecDeque<usize>,
}

#[cfg(test)]
impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_uniform(mut self, v: f32) -> Self {
        self.uniforms.push_back(v);
        self
    }

    pub fn then_int(mut self, v: u32) -> Self {
        self.ints.push_back(v);
        self
    }

    pub fn then_index(mut self, v: usize) -> Self {
        self.indexes.push_back(v);
        self
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn uniform(&mut self) -> f32 {
        self.uniforms.pop_front().expect("scripted uniform exhausted")
    }

    fn int_in(&mut self, range: RangeInclusive<u32>) -> u32 {
        let v = self.ints.pop_front().expect("scripted int exhausted");
        assert!(range.contains(&v), "scripted int {} outside {:?}", v, range);
        v
    }

    fn index(&mut self, len: usize) -> usize {
        let v = self.indexes.pop_front().expect("scripted index exhausted");
        assert!(v < len, "scripted index {} outside 0..{}", v, len);
        v
    }
}
