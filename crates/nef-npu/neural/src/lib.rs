// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF Neural Computation
//!
//! Everything the rest of the framework needs to know about single units:
//! - **Types**: neural error type and shared parameter structs
//! - **Models**: the neuron-model capability contract plus the LIF models
//!
//! The decoder solver and the network only ever talk to neurons through
//! [`NeuronModel`]. A model either has a closed-form steady-state rate
//! ([`RateMode::HasAnalyticRate`]) or must be measured by simulation
//! ([`RateMode::SimulateOnly`]).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod models;
pub mod types;

pub use models::{
    create_model, lif_gain_bias, lif_rate, LifNeuron, LifRateNeuron, NeuronKind, NeuronModel,
    NeuronParameters, NeuronState, RateMode,
};
pub use types::{NeuralError, NeuralResult};
