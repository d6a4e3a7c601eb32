// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rate approximation of the LIF model: no spikes, no state.

use ndarray::{ArrayView1, ArrayViewMut1};

use super::lif::lif_rate;
use super::traits::{NeuronModel, NeuronParameters, NeuronState, RateMode};

#[derive(Debug, Clone, Copy)]
pub struct LifRateNeuron {
    params: NeuronParameters,
}

impl LifRateNeuron {
    pub fn new(params: NeuronParameters) -> Self {
        Self { params }
    }
}

impl Default for LifRateNeuron {
    fn default() -> Self {
        Self::new(NeuronParameters::default())
    }
}

impl NeuronModel for LifRateNeuron {
    fn model_name(&self) -> &'static str {
        "LIFRate"
    }

    fn parameters(&self) -> NeuronParameters {
        self.params
    }

    fn rate_mode(&self) -> RateMode {
        RateMode::HasAnalyticRate
    }

    fn steady_state_rate(&self, current: f64) -> Option<f64> {
        Some(lif_rate(self.params, current))
    }

    fn create_state(&self, _size: usize) -> NeuronState {
        NeuronState::new(0)
    }

    fn step(
        &self,
        _state: &mut NeuronState,
        currents: ArrayView1<f64>,
        dt: f64,
        mut output: ArrayViewMut1<f64>,
    ) {
        for (out, &j) in output.iter_mut().zip(currents.iter()) {
            *out = lif_rate(self.params, j) * dt;
        }
    }
}
