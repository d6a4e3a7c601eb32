// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `nef_configuration.toml`.

use nef_npu_neural::NeuronKind;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NefConfig {
    pub simulation: SimulationConfig,
    pub ensemble: EnsembleDefaults,
    pub decoder: DecoderSettings,
    pub connection: ConnectionConfig,
    pub probe: ProbeConfig,
    pub plasticity: PlasticityConfig,
    pub logging: LoggingConfig,
}

/// Simulation clock
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed step size (seconds)
    pub dt: f64,
    /// Network RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            seed: None,
        }
    }
}

/// Defaults applied to every ensemble unless overridden at `make`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnsembleDefaults {
    pub neuron_model: NeuronKind,
    /// `[low, high]` range of per-unit max firing rates (Hz)
    pub max_rate: [f64; 2],
    /// `[low, high]` range of per-unit threshold intercepts
    pub intercept: [f64; 2],
    pub tau_rc: f64,
    pub tau_ref: f64,
    pub radius: f64,
    /// Activity noise during decoder fitting, fraction of max rate
    pub noise: f64,
    pub decoder_noise: f64,
}

impl Default for EnsembleDefaults {
    fn default() -> Self {
        Self {
            neuron_model: NeuronKind::Lif,
            max_rate: [200.0, 400.0],
            intercept: [-1.0, 1.0],
            tau_rc: 0.02,
            tau_ref: 0.002,
            radius: 1.0,
            noise: 0.1,
            decoder_noise: 0.1,
        }
    }
}

/// Decoder solver settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderSettings {
    pub num_samples: usize,
    /// Steps discarded before counting spikes (simulated rates only)
    pub settle_steps: usize,
    /// Steps over which spikes are counted (simulated rates only)
    pub measure_steps: usize,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            num_samples: 500,
            settle_steps: 20,
            measure_steps: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Default post-synaptic time constant (seconds)
    pub pstc: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { pstc: 0.01 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub sample_interval: f64,
    pub pstc: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            sample_interval: 0.01,
            pstc: 0.03,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlasticityConfig {
    pub learning_rate: f64,
    /// Default filter on pre activity of learned terminations
    pub pstc: f64,
}

impl Default for PlasticityConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-7,
            pstc: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
