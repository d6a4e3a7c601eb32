// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Decoder Solver
//!
//! For each sub-population of a population:
//! 1. Evaluation points `S` (`dimensions × samples`, unit ball)
//! 2. Activities `A` (`neurons × samples`), plus Gaussian noise of
//!    `noise * max_rate`
//! 3. `G = A · Aᵀ`, eigendecomposed; eigenvalues below
//!    `decoder_noise² · max(w)` are dropped
//! 4. `Ginv = V_k · diag(1/w_k) · V_kᵀ`
//! 5. `decoders = Ginv · (A · targetᵀ)`, targets being `f(s · radius) / radius`
//!
//! Steps 1-4 depend only on the population, so `(Ginv, A)` goes through the
//! [`DecoderCache`](crate::cache::DecoderCache).

use crate::activity::{activity_matrix, RateSimulation};
use crate::cache::{eval_key, index_key, GammaInverse, InMemoryDecoderCache, SharedDecoderCache};
use crate::error::{DecoderError, DecoderResult};
use crate::function::TargetFunction;
use crate::population::DecodablePopulation;
use crate::sampling::{make_samples, noise_rng, sample_rng};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{s, Array2, Array3};
use parking_lot::Mutex;
use rand::Rng;
use rand_distr::StandardNormal;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Evaluation points drawn when none are supplied
    pub num_samples: usize,
    /// Step used when rates have to be simulated
    pub dt: f64,
    pub settle_steps: usize,
    pub measure_steps: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            num_samples: 500,
            dt: 0.001,
            settle_steps: 20,
            measure_steps: 200,
        }
    }
}

impl DecoderConfig {
    pub fn rate_simulation(&self) -> RateSimulation {
        RateSimulation {
            dt: self.dt,
            settle_steps: self.settle_steps,
            measure_steps: self.measure_steps,
        }
    }
}

/// Decoders for every sub-population of a population
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderSolution {
    /// `array_size × neurons × func_size`
    pub decoders: Array3<f64>,
    pub num_samples: usize,
    pub func_size: usize,
}

/// Solver counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub solves: u64,
    pub activity_computations: u64,
    pub cache_hits: u64,
    /// Sub-populations whose Gram matrix had no usable eigenvalue
    pub degenerate_blocks: u64,
}

#[derive(Debug)]
pub struct DecoderSolver {
    cache: SharedDecoderCache,
    config: DecoderConfig,
    stats: Mutex<SolverStats>,
}

impl Default for DecoderSolver {
    fn default() -> Self {
        Self::new(InMemoryDecoderCache::shared(), DecoderConfig::default())
    }
}

impl DecoderSolver {
    pub fn new(cache: SharedDecoderCache, config: DecoderConfig) -> Self {
        Self {
            cache,
            config,
            stats: Mutex::new(SolverStats::default()),
        }
    }

    pub fn cache(&self) -> &SharedDecoderCache {
        &self.cache
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn stats(&self) -> SolverStats {
        *self.stats.lock()
    }

    /// Solve decoders of `func` (identity when `None`) over `population`.
    ///
    /// `eval_points` overrides the population's own points and adds an
    /// `_eval{hash}` suffix to the cache key.
    pub fn solve<P: DecodablePopulation + ?Sized>(
        &self,
        population: &P,
        func: Option<&TargetFunction>,
        eval_points: Option<&Array2<f64>>,
    ) -> DecoderResult<DecoderSolution> {
        let dimensions = population.dimensions();
        let radius = population.radius();
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(DecoderError::InvalidParameters(format!(
                "radius must be positive, got {}",
                radius
            )));
        }

        let (points, base_key): (Cow<'_, Array2<f64>>, String) = match eval_points {
            Some(points) => {
                validate_points(points, dimensions)?;
                (Cow::Borrowed(points), eval_key(population.cache_key(), points))
            }
            None => match population.eval_points() {
                Some(points) => {
                    validate_points(points, dimensions)?;
                    (Cow::Borrowed(points), population.cache_key().to_string())
                }
                None => {
                    if self.config.num_samples == 0 {
                        return Err(DecoderError::InvalidParameters(
                            "num_samples must be at least 1".to_string(),
                        ));
                    }
                    let mut rng = sample_rng(population.seed());
                    let points = make_samples(self.config.num_samples, dimensions, &mut rng);
                    (Cow::Owned(points), population.cache_key().to_string())
                }
            },
        };

        let targets = compute_targets(&points, func, radius)?;
        let func_size = targets.nrows();
        let num_samples = points.ncols();
        let neurons = population.neurons_num();

        let mut decoders = Array3::zeros((population.array_size(), neurons, func_size));
        for index in 0..population.array_size() {
            let key = index_key(&base_key, index);
            let gamma = self.gamma_inverse(population, index, &points, &key)?;
            let u = gamma.activities.dot(&targets.t());
            decoders
                .slice_mut(s![index, .., ..])
                .assign(&gamma.ginv.dot(&u));
        }

        self.stats.lock().solves += 1;
        debug!(
            target: "nef-decoding",
            "[DECODER] solved '{}' over {} ({} sub-populations, {} samples)",
            func.map(|f| f.name()).unwrap_or("X"),
            base_key,
            population.array_size(),
            num_samples
        );

        Ok(DecoderSolution {
            decoders,
            num_samples,
            func_size,
        })
    }

    fn gamma_inverse<P: DecodablePopulation + ?Sized>(
        &self,
        population: &P,
        index: usize,
        points: &Array2<f64>,
        key: &str,
    ) -> DecoderResult<Arc<GammaInverse>> {
        let expected_shape = (population.neurons_num(), points.ncols());
        if let Some(cached) = self.cache.get(key) {
            if cached.activities.dim() == expected_shape {
                self.stats.lock().cache_hits += 1;
                return Ok(cached);
            }
            warn!(
                target: "nef-decoding",
                "[DECODER] cached entry {} has activities {:?}, expected {:?}; recomputing",
                key,
                cached.activities.dim(),
                expected_shape
            );
        }

        let mut activities = activity_matrix(
            population,
            index,
            points.view(),
            self.config.rate_simulation(),
        )?;
        self.stats.lock().activity_computations += 1;

        let noise = population.noise();
        if noise > 0.0 {
            let scale = noise * population.max_rate();
            let mut rng = noise_rng(population.seed(), index);
            activities.mapv_inplace(|a| a + scale * rng.sample::<f64, _>(StandardNormal));
        }

        let ginv = match regularised_gram_inverse(&activities, population.decoder_noise()) {
            Some(ginv) => ginv,
            None => {
                warn!(
                    target: "nef-decoding",
                    "[DECODER] {}: activity Gram matrix has no usable eigenvalues, decoders are zero",
                    key
                );
                self.stats.lock().degenerate_blocks += 1;
                Array2::zeros((expected_shape.0, expected_shape.0))
            }
        };

        let entry = Arc::new(GammaInverse { ginv, activities });
        self.cache.set(key, Arc::clone(&entry));
        Ok(entry)
    }
}

/// Truncated pseudo-inverse of `A · Aᵀ`.
///
/// Returns `None` when no eigenvalue survives the floor.
pub fn regularised_gram_inverse(activities: &Array2<f64>, decoder_noise: f64) -> Option<Array2<f64>> {
    let n = activities.nrows();
    if n == 0 {
        return None;
    }

    let gram = activities.dot(&activities.t());
    let eigen = SymmetricEigen::new(DMatrix::from_fn(n, n, |r, c| gram[[r, c]]));

    let largest = eigen.eigenvalues.iter().copied().fold(0.0_f64, f64::max);
    if !(largest > 0.0) || !largest.is_finite() {
        return None;
    }
    // Round-off floor applies even with zero decoder noise
    let floor = (decoder_noise * decoder_noise * largest).max(largest * f64::EPSILON * n as f64);

    let kept: Vec<usize> = (0..n).filter(|&k| eigen.eigenvalues[k] >= floor).collect();
    if kept.is_empty() {
        return None;
    }

    let mut basis = Array2::zeros((n, kept.len()));
    for (col, &k) in kept.iter().enumerate() {
        let scale = eigen.eigenvalues[k].sqrt();
        for row in 0..n {
            basis[[row, col]] = eigen.eigenvectors[(row, k)] / scale;
        }
    }
    Some(basis.dot(&basis.t()))
}

fn validate_points(points: &Array2<f64>, dimensions: usize) -> DecoderResult<()> {
    if points.nrows() != dimensions {
        return Err(DecoderError::ShapeMismatch {
            expected: dimensions,
            actual: points.nrows(),
        });
    }
    if points.ncols() == 0 {
        return Err(DecoderError::InvalidParameters(
            "evaluation points must contain at least one sample".to_string(),
        ));
    }
    Ok(())
}

/// Targets in normalised units (`func_size × samples`)
fn compute_targets(
    points: &Array2<f64>,
    func: Option<&TargetFunction>,
    radius: f64,
) -> DecoderResult<Array2<f64>> {
    let Some(func) = func else {
        return Ok(points.clone());
    };

    let num_samples = points.ncols();
    let mut width = None;
    let mut values = Vec::new();
    for (sample, column) in points.columns().into_iter().enumerate() {
        let x: Vec<f64> = column.iter().map(|v| v * radius).collect();
        let y = func.evaluate(&x);
        let expected = *width.get_or_insert(y.len());
        if expected == 0 {
            return Err(DecoderError::InvalidParameters(format!(
                "target function '{}' returned no values",
                func.name()
            )));
        }
        if y.len() != expected {
            return Err(DecoderError::FunctionOutput {
                name: func.name().to_string(),
                expected,
                actual: y.len(),
                sample,
            });
        }
        values.extend(y.into_iter().map(|v| v / radius));
    }

    let width = width.unwrap_or(0);
    Array2::from_shape_vec((num_samples, width), values)
        .map(|samples_major| samples_major.reversed_axes())
        .map_err(|e| DecoderError::InvalidParameters(e.to_string()))
}
