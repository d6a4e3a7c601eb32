// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Evaluation-point sampling

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Stream offset separating activity-noise draws from evaluation-point draws
const NOISE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Draw `num_samples` points uniformly distributed inside the unit ball.
///
/// Returns a `dimensions × num_samples` matrix (one sample per column):
/// a Gaussian direction normalised to unit length, scaled by `u^(1/d)`.
pub fn make_samples<R: Rng + ?Sized>(
    num_samples: usize,
    dimensions: usize,
    rng: &mut R,
) -> Array2<f64> {
    let mut samples = Array2::zeros((dimensions, num_samples));
    if dimensions == 0 {
        return samples;
    }

    for mut column in samples.columns_mut() {
        let mut norm = 0.0;
        while norm == 0.0 {
            for value in column.iter_mut() {
                *value = rng.sample(StandardNormal);
            }
            norm = column.dot(&column).sqrt();
        }

        let u: f64 = rng.gen();
        let scale = u.powf(1.0 / dimensions as f64) / norm;
        column.mapv_inplace(|v| v * scale);
    }

    samples
}

/// RNG used for evaluation points of a population
pub fn sample_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// RNG used for the activity noise of sub-population `index`
pub fn noise_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(
        seed.wrapping_mul(NOISE_STREAM)
            .wrapping_add(index as u64 + 1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_lie_inside_unit_ball() {
        let mut rng = sample_rng(7);
        let samples = make_samples(1000, 3, &mut rng);
        assert_eq!(samples.dim(), (3, 1000));
        for column in samples.columns() {
            assert!(column.dot(&column).sqrt() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_one_dimensional_samples_cover_interval() {
        let mut rng = sample_rng(11);
        let samples = make_samples(2000, 1, &mut rng);
        let positive = samples.iter().filter(|&&v| v > 0.0).count();
        let outer = samples.iter().filter(|&&v| v.abs() > 0.5).count();
        // Uniform on [-1, 1]: half positive, half beyond |0.5|
        assert!((800..1200).contains(&positive), "positive = {}", positive);
        assert!((800..1200).contains(&outer), "outer = {}", outer);
    }

    #[test]
    fn test_sampling_is_reproducible_for_a_seed() {
        let a = make_samples(50, 2, &mut sample_rng(42));
        let b = make_samples(50, 2, &mut sample_rng(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_noise_streams_differ_per_index() {
        let a: f64 = noise_rng(1, 0).sample(StandardNormal);
        let b: f64 = noise_rng(1, 1).sample(StandardNormal);
        assert_ne!(a, b);
    }
}
