use super::error::SamplingError;
use crate::core::geometry::cosine_weighted_directions;
use nalgebra::Vector3;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

/// Source of every random draw a trace makes.
///
/// Draws are requested in fixed-size blocks so that a seeded implementation reproduces the
/// same batch regardless of how the geometry stage is scheduled.
pub trait RandomSource {
    /// `n` samples from `U[low, high)`.
    fn uniform(&mut self, low: f64, high: f64, n: usize) -> Vec<f64>;

    fn normal(&mut self, mean: f64, sigma: f64, n: usize) -> Result<Vec<f64>, SamplingError>;

    /// `size` indices in `0..k`, each drawn with probability proportional to `weights`.
    fn weighted_choice(
        &mut self,
        k: usize,
        size: usize,
        weights: &[f64],
    ) -> Result<Vec<usize>, SamplingError>;
}

/// [`RandomSource`] backed by a seedable [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self, low: f64, high: f64, n: usize) -> Vec<f64> {
        if high <= low {
            return vec![low; n];
        }
        (0..n).map(|_| self.rng.gen_range(low..high)).collect()
    }

    fn normal(&mut self, mean: f64, sigma: f64, n: usize) -> Result<Vec<f64>, SamplingError> {
        if !(sigma.is_finite() && sigma >= 0.0) {
            return Err(SamplingError::InvalidSigma(sigma));
        }
        let dist = Normal::new(mean, sigma).map_err(|_| SamplingError::InvalidSigma(sigma))?;
        Ok((0..n).map(|_| dist.sample(&mut self.rng)).collect())
    }

    fn weighted_choice(
        &mut self,
        k: usize,
        size: usize,
        weights: &[f64],
    ) -> Result<Vec<usize>, SamplingError> {
        if weights.len() != k {
            return Err(SamplingError::WeightCountMismatch {
                expected: k,
                found: weights.len(),
            });
        }
        let dist = WeightedIndex::new(weights)?;
        Ok((0..size).map(|_| dist.sample(&mut self.rng)).collect())
    }
}

/// `n` cosine-weighted directions in the local `+Z` hemisphere.
pub fn sample_cosine_weighted<R: RandomSource + ?Sized>(rng: &mut R, n: usize) -> Vec<Vector3<f64>> {
    let u1 = rng.uniform(0.0, 1.0, n);
    let u2 = rng.uniform(0.0, 1.0, n);
    cosine_weighted_directions(&u1, &u2)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Replays queued values. Uniform draws beyond the queue fall back to `low`, normal draws
    /// to `mean`, and weighted choices always return index 0.
    #[derive(Debug, Default)]
    pub struct ScriptedRandom {
        pub uniforms: VecDeque<f64>,
        pub normals: VecDeque<f64>,
    }

    impl ScriptedRandom {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_uniforms(mut self, values: &[f64]) -> Self {
            self.uniforms.extend(values.iter().copied());
            self
        }
    }

    impl RandomSource for ScriptedRandom {
        fn uniform(&mut self, low: f64, high: f64, n: usize) -> Vec<f64> {
            (0..n)
                .map(|_| {
                    let u = self.uniforms.pop_front().unwrap_or(0.0);
                    low + u * (high - low)
                })
                .collect()
        }

        fn normal(&mut self, mean: f64, sigma: f64, n: usize) -> Result<Vec<f64>, SamplingError> {
            if !(sigma.is_finite() && sigma >= 0.0) {
                return Err(SamplingError::InvalidSigma(sigma));
            }
            Ok((0..n)
                .map(|_| mean + sigma * self.normals.pop_front().unwrap_or(0.0))
                .collect())
        }

        fn weighted_choice(
            &mut self,
            k: usize,
            size: usize,
            weights: &[f64],
        ) -> Result<Vec<usize>, SamplingError> {
            if weights.len() != k {
                return Err(SamplingError::WeightCountMismatch {
                    expected: k,
                    found: weights.len(),
                });
            }
            Ok(vec![0; size])
        }
    }
}
