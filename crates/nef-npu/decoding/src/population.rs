// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Population view consumed by the decoder solver
//!
//! Ensembles implement this trait; the solver never depends on how an
//! ensemble stores its tuning parameters.

use ndarray::{Array2, ArrayView1, ArrayView2};
use nef_npu_neural::{NeuronModel, RateMode};

pub trait DecodablePopulation {
    /// Deterministic signature of every parameter that shapes the activity matrix
    fn cache_key(&self) -> &str;

    /// Represented width of each sub-population
    fn dimensions(&self) -> usize;

    /// Number of independent sub-populations
    fn array_size(&self) -> usize;

    /// Units per sub-population
    fn neurons_num(&self) -> usize;

    fn radius(&self) -> f64;

    fn seed(&self) -> u64;

    /// Activity noise, as a fraction of `max_rate`
    fn noise(&self) -> f64;

    /// Eigenvalue floor, as a fraction of the largest Gram eigenvalue (squared)
    fn decoder_noise(&self) -> f64;

    /// Upper bound of the population's max-rate range (Hz)
    fn max_rate(&self) -> f64;

    fn model(&self) -> &dyn NeuronModel;

    /// Resolved once when the population is built
    fn rate_mode(&self) -> RateMode;

    /// Gain-scaled encoders of sub-population `index` (`neurons × dimensions`)
    fn encoders(&self, index: usize) -> ArrayView2<'_, f64>;

    /// Bias currents of sub-population `index`
    fn bias(&self, index: usize) -> ArrayView1<'_, f64>;

    /// Population-wide evaluation points, already part of `cache_key`
    fn eval_points(&self) -> Option<&Array2<f64>> {
        None
    }
}
