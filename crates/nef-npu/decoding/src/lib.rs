// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF Decoder Solver
//!
//! Turns a noisy, nonlinear population of units into a linear read-out of a
//! target function:
//! - **Sampling**: evaluation points uniform in the unit ball
//! - **Activity**: analytic or simulated rate matrices
//! - **Solver**: regularised least squares via a truncated eigendecomposition
//! - **Cache**: `(Ginv, A)` memoisation keyed by a deterministic signature
//!
//! ## Architecture
//! - The solver only sees a population through [`DecodablePopulation`]
//! - The cache is an injected service ([`DecoderCache`]), never global state
//! - All randomness is seeded from the population seed

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod activity;
pub mod cache;
pub mod error;
pub mod function;
pub mod population;
pub mod sampling;
pub mod solver;

pub use activity::{
    activity_matrix, analytic_rates, input_currents, simulated_rates, RateSimulation,
};
pub use cache::{
    eval_key, eval_points_hash, index_key, CacheStats, DecoderCache, GammaInverse, InMemoryDecoderCache,
    SharedDecoderCache, SignatureBuilder,
};
pub use error::{DecoderError, DecoderResult};
pub use function::TargetFunction;
pub use population::DecodablePopulation;
pub use sampling::make_samples;
pub use solver::{
    regularised_gram_inverse, DecoderConfig, DecoderSolution, DecoderSolver, SolverStats,
};
