// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF (Leaky Integrate-and-Fire) Neuron Model
//!
//! The default spiking model of an ensemble.
//!
//! ## Model Dynamics
//!
//! ```text
//! Membrane (exact zero-order-hold integration over the non-refractory part
//! of the step):
//!     V(t+dt) = V(t) + (J - V(t)) × (1 - exp(-Δt / tau_rc))
//!
//! Firing:
//!     if V > 1: emit a spike, V = 0,
//!               refractory = tau_ref + (time of threshold crossing)
//!
//! Steady-state rate for constant J:
//!     r(J) = 0                                        if J <= 1
//!     r(J) = 1 / (tau_ref - tau_rc × ln(1 - 1/J))     otherwise
//! ```

use ndarray::{ArrayView1, ArrayViewMut1};

use super::traits::{NeuronModel, NeuronParameters, NeuronState, RateMode};
use crate::types::{NeuralError, NeuralResult};

/// Steady-state LIF firing rate (Hz) for a constant input current.
///
/// Subthreshold currents (`J <= 1`) always give exactly zero.
#[inline]
pub fn lif_rate(params: NeuronParameters, current: f64) -> f64 {
    if current <= 1.0 {
        return 0.0;
    }
    1.0 / (params.tau_ref - params.tau_rc * (1.0 - 1.0 / current).ln())
}

/// Gain and bias for a LIF unit with the given tuning.
///
/// With `J = gain × (e·x) + bias` the unit sits exactly at threshold when
/// `e·x = intercept` and fires at `max_rate` when `e·x = 1`.
pub fn lif_gain_bias(
    params: NeuronParameters,
    max_rate: f64,
    intercept: f64,
) -> NeuralResult<(f64, f64)> {
    if !(max_rate.is_finite() && max_rate > 0.0) {
        return Err(NeuralError::InvalidParameters(format!(
            "max_rate must be finite and > 0, got {}",
            max_rate
        )));
    }
    if 1.0 / max_rate <= params.tau_ref {
        return Err(NeuralError::InvalidParameters(format!(
            "max_rate {} is unreachable with tau_ref {}",
            max_rate, params.tau_ref
        )));
    }
    if !intercept.is_finite() || intercept >= 1.0 {
        return Err(NeuralError::InvalidParameters(format!(
            "intercept must be < 1, got {}",
            intercept
        )));
    }

    let x = 1.0 / (1.0 - ((params.tau_ref - 1.0 / max_rate) / params.tau_rc).exp());
    let gain = (1.0 - x) / (intercept - 1.0);
    let bias = 1.0 - gain * intercept;
    Ok((gain, bias))
}

/// Spiking LIF neuron model
#[derive(Debug, Clone, Copy)]
pub struct LifNeuron {
    params: NeuronParameters,
}

impl LifNeuron {
    pub fn new(params: NeuronParameters) -> Self {
        Self { params }
    }
}

impl Default for LifNeuron {
    fn default() -> Self {
        Self::new(NeuronParameters::default())
    }
}

impl NeuronModel for LifNeuron {
    fn model_name(&self) -> &'static str {
        "LIF"
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

    fn step(
        &self,
        state: &mut NeuronState,
        currents: ArrayView1<f64>,
        dt: f64,
        mut output: ArrayViewMut1<f64>,
    ) {
        let tau_rc = self.params.tau_rc;
        let tau_ref = self.params.tau_ref;

        for i in 0..currents.len() {
            let j = currents[i];
            let mut refractory = state.refractory_time[i] - dt;
            let delta_t = (dt - refractory).clamp(0.0, dt);

            let mut v = state.voltage[i];
            v -= (j - v) * (-delta_t / tau_rc).exp_m1();

            if v > 1.0 && j > 1.0 {
                // Time of the threshold crossing inside this step
                let t_spike = dt + tau_rc * (-(v - 1.0) / (j - 1.0)).ln_1p();
                output[i] = 1.0;
                v = 0.0;
                refractory = tau_ref + t_spike;
            } else {
                output[i] = 0.0;
            }

            state.voltage[i] = v.max(0.0);
            state.refractory_time[i] = refractory;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_lif_rate_subthreshold_is_zero() {
        let params = NeuronParameters::default();
        assert_eq!(lif_rate(params, 0.5), 0.0);
        assert_eq!(lif_rate(params, 1.0), 0.0);
        assert_eq!(lif_rate(params, -3.0), 0.0);
    }

    #[test]
    fn test_lif_rate_increases_with_current() {
        let params = NeuronParameters::default();
        let low = lif_rate(params, 1.5);
        let high = lif_rate(params, 5.0);
        assert!(low > 0.0);
        assert!(high > low);
        // Never faster than the refractory period allows
        assert!(high < 1.0 / params.tau_ref);
    }

    #[test]
    fn test_gain_bias_hits_tuning_targets() {
        let params = NeuronParameters::default();
        let (gain, bias) = lif_gain_bias(params, 300.0, -0.2).unwrap();

        // Threshold at the intercept
        let j_intercept = gain * -0.2 + bias;
        assert!((j_intercept - 1.0).abs() < 1e-9);

        // Max rate at the preferred direction
        let rate = lif_rate(params, gain + bias);
        assert!((rate - 300.0).abs() < 1e-6, "rate = {}", rate);
    }

    #[test]
    fn test_gain_bias_rejects_unreachable_rate() {
        let params = NeuronParameters::default();
        // 1/1000 s < tau_ref = 2 ms
        assert!(lif_gain_bias(params, 1000.0, 0.0).is_err());
        assert!(lif_gain_bias(params, 200.0, 1.0).is_err());
    }

    #[test]
    fn test_simulated_rate_matches_analytic_rate() {
        let model = LifNeuron::default();
        let currents = Array1::from(vec![0.8, 1.5, 3.0, 8.0]);
        let mut state = model.create_state(currents.len());
        let mut spikes = Array1::zeros(currents.len());
        let mut counts = Array1::<f64>::zeros(currents.len());

        let dt = 0.001;
        let steps = 2000;
        for _ in 0..steps {
            model.step(&mut state, currents.view(), dt, spikes.view_mut());
            counts += &spikes;
        }

        for (i, &j) in currents.iter().enumerate() {
            let measured = counts[i] / (steps as f64 * dt);
            let expected = model.steady_state_rate(j).unwrap();
            assert!(
                (measured - expected).abs() < 2.0,
                "J={} measured {} expected {}",
                j,
                measured,
                expected
            );
        }
    }
}
