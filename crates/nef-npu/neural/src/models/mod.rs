// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Model Architecture
//!
//! This module defines the trait-based neuron model system. Ensembles hold an
//! `Arc<dyn NeuronModel>` and resolve its [`RateMode`] once, at construction.
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Implement `NeuronModel` trait
//! 3. Declare `RateMode::SimulateOnly` unless a closed-form rate exists
//! 4. Add tests
//! 5. Export in `mod.rs`

pub mod lif;
pub mod lif_rate;
pub mod traits;

use std::str::FromStr;
use std::sync::Arc;

use crate::types::{NeuralError, NeuralResult};

// Re-export core types
pub use lif::{lif_gain_bias, lif_rate, LifNeuron};
pub use lif_rate::LifRateNeuron;
pub use traits::{NeuronModel, NeuronParameters, NeuronState, RateMode};

/// Built-in neuron model selector (used by configuration files)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NeuronKind {
    /// Spiking leaky integrate-and-fire
    #[default]
    Lif,
    /// Rate approximation of LIF
    LifRate,
}

impl FromStr for NeuronKind {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lif" => Ok(NeuronKind::Lif),
            "lif_rate" | "lifrate" | "lif-rate" => Ok(NeuronKind::LifRate),
            other => Err(NeuralError::UnknownModel(other.to_string())),
        }
    }
}

/// Build a shareable model instance for a built-in kind
pub fn create_model(
    kind: NeuronKind,
    params: NeuronParameters,
) -> NeuralResult<Arc<dyn NeuronModel>> {
    params.validate()?;
    Ok(match kind {
        NeuronKind::Lif => Arc::new(LifNeuron::new(params)),
        NeuronKind::LifRate => Arc::new(LifRateNeuron::new(params)),
    })
}
