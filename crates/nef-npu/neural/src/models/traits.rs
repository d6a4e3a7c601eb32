// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron model capability contract

use core::fmt;

use ndarray::{Array1, ArrayView1, ArrayViewMut1};

use crate::types::{NeuralError, NeuralResult};

/// How a model's steady-state firing rate can be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateMode {
    /// `steady_state_rate` returns a closed-form value
    HasAnalyticRate,
    /// Rates must be measured by stepping the model
    SimulateOnly,
}

/// Dynamical constants shared by every unit of a population
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuronParameters {
    /// Membrane RC time constant (seconds)
    pub tau_rc: f64,

    /// Absolute refractory period (seconds)
    pub tau_ref: f64,
}

impl NeuronParameters {
    pub fn new(tau_rc: f64, tau_ref: f64) -> NeuralResult<Self> {
        let params = Self { tau_rc, tau_ref };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> NeuralResult<()> {
        if !(self.tau_rc.is_finite() && self.tau_rc > 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "tau_rc must be finite and > 0, got {}",
                self.tau_rc
            )));
        }
        if !(self.tau_ref.is_finite() && self.tau_ref >= 0.0) {
            return Err(NeuralError::InvalidParameters(format!(
                "tau_ref must be finite and >= 0, got {}",
                self.tau_ref
            )));
        }
        Ok(())
    }
}

impl Default for NeuronParameters {
    fn default() -> Self {
        Self {
            tau_rc: 0.02,
            tau_ref: 0.002,
        }
    }
}

/// Per-unit dynamic state
///
/// Every model shares this layout; a model is free to leave a field unused
/// (rate models keep no state at all).
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronState {
    pub voltage: Array1<f64>,
    pub refractory_time: Array1<f64>,
}

impl NeuronState {
    pub fn new(size: usize) -> Self {
        Self {
            voltage: Array1::zeros(size),
            refractory_time: Array1::zeros(size),
        }
    }

    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }
}

/// Neuron model trait
///
/// `step` writes the number of spikes each unit emitted during `dt` into
/// `output` (a rate model writes `rate * dt`), so `output / dt` is always an
/// instantaneous rate estimate.
pub trait NeuronModel: fmt::Debug + Send + Sync {
    /// Human-readable model name, also part of the ensemble signature
    fn model_name(&self) -> &'static str;

    fn parameters(&self) -> NeuronParameters;

    fn rate_mode(&self) -> RateMode;

    /// Closed-form steady-state rate for a constant input current.
    ///
    /// Only models declaring [`RateMode::HasAnalyticRate`] return `Some`.
    fn steady_state_rate(&self, _current: f64) -> Option<f64> {
        None
    }

    fn create_state(&self, size: usize) -> NeuronState {
        NeuronState::new(size)
    }

    /// Advance `state` by `dt` under `currents`
    fn step(
        &self,
        state: &mut NeuronState,
        currents: ArrayView1<f64>,
        dt: f64,
        output: ArrayViewMut1<f64>,
    );

    /// Gain and bias that put threshold at `intercept` and `max_rate` at the
    /// preferred direction (LIF tuning by default)
    fn gain_bias(&self, max_rate: f64, intercept: f64) -> NeuralResult<(f64, f64)> {
        super::lif::lif_gain_bias(self.parameters(), max_rate, intercept)
    }
}
