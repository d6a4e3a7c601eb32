// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Activity matrices
//!
//! `A[i, s]` is the steady firing rate (Hz) of unit `i` when the population
//! represents evaluation point `s`.

use crate::error::{DecoderError, DecoderResult};
use crate::population::DecodablePopulation;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use nef_npu_neural::{NeuronModel, RateMode};

/// Rate-simulation schedule for models without an analytic rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSimulation {
    pub dt: f64,
    /// Steps discarded before counting
    pub settle_steps: usize,
    /// Steps over which spikes are counted
    pub measure_steps: usize,
}

/// Input currents `J = E · points + bias` (`neurons × samples`)
pub fn input_currents(
    encoders: ArrayView2<f64>,
    bias: ArrayView1<f64>,
    eval_points: ArrayView2<f64>,
) -> Array2<f64> {
    let mut currents = encoders.dot(&eval_points);
    currents += &bias.insert_axis(Axis(1));
    currents
}

/// Rates from the model's closed-form steady state
pub fn analytic_rates(model: &dyn NeuronModel, currents: &Array2<f64>) -> DecoderResult<Array2<f64>> {
    let mut rates = Array2::zeros(currents.dim());
    for (rate, &current) in rates.iter_mut().zip(currents.iter()) {
        *rate = model.steady_state_rate(current).ok_or_else(|| {
            DecoderError::InvalidParameters(format!(
                "model '{}' declares an analytic rate but returned none",
                model.model_name()
            ))
        })?;
    }
    Ok(rates)
}

/// Rates measured by holding each current constant and counting spikes
pub fn simulated_rates(
    model: &dyn NeuronModel,
    currents: &Array2<f64>,
    schedule: RateSimulation,
) -> DecoderResult<Array2<f64>> {
    if schedule.measure_steps == 0 || !(schedule.dt > 0.0) {
        return Err(DecoderError::InvalidParameters(format!(
            "rate simulation needs measure_steps > 0 and dt > 0 (got {} steps, dt {})",
            schedule.measure_steps, schedule.dt
        )));
    }

    let dim = currents.dim();
    let flat: Array1<f64> = currents.iter().copied().collect();
    let mut state = model.create_state(flat.len());
    let mut output = Array1::zeros(flat.len());
    let mut counts = Array1::<f64>::zeros(flat.len());

    for _ in 0..schedule.settle_steps {
        model.step(&mut state, flat.view(), schedule.dt, output.view_mut());
    }
    for _ in 0..schedule.measure_steps {
        model.step(&mut state, flat.view(), schedule.dt, output.view_mut());
        counts += &output;
    }

    let duration = schedule.measure_steps as f64 * schedule.dt;
    counts.mapv_inplace(|c| c / duration);
    counts
        .into_shape_with_order(dim)
        .map_err(|e| DecoderError::InvalidParameters(e.to_string()))
}

/// Activity matrix of sub-population `index` over `eval_points`.
///
/// `eval_points` are normalised by the radius, matching the gain-scaled
/// encoders.
pub fn activity_matrix<P: DecodablePopulation + ?Sized>(
    population: &P,
    index: usize,
    eval_points: ArrayView2<f64>,
    schedule: RateSimulation,
) -> DecoderResult<Array2<f64>> {
    let currents = input_currents(population.encoders(index), population.bias(index), eval_points);
    match population.rate_mode() {
        RateMode::HasAnalyticRate => analytic_rates(population.model(), &currents),
        RateMode::SimulateOnly => simulated_rates(population.model(), &currents, schedule),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use nef_npu_neural::{lif_rate, LifNeuron, LifRateNeuron, NeuronParameters};

    #[test]
    fn test_currents_add_bias_per_unit() {
        let encoders = array![[1.0], [-2.0]];
        let bias = array![0.5, 1.0];
        let points = array![[0.0, 1.0]];
        let j = input_currents(encoders.view(), bias.view(), points.view());
        assert_eq!(j, array![[0.5, 1.5], [1.0, -1.0]]);
    }

    #[test]
    fn test_analytic_rates_match_lif_curve() {
        let params = NeuronParameters::default();
        let model = LifRateNeuron::new(params);
        let currents = array![[0.5, 2.0], [3.0, 10.0]];
        let rates = analytic_rates(&model, &currents).unwrap();
        for (r, &j) in rates.iter().zip(currents.iter()) {
            assert!((r - lif_rate(params, j)).abs() < 1e-12);
        }
        assert_eq!(rates[[0, 0]], 0.0);
    }

    #[test]
    fn test_simulated_rates_approach_analytic() {
        let params = NeuronParameters::default();
        let model = LifNeuron::new(params);
        let currents = array![[1.5, 4.0]];
        let schedule = RateSimulation {
            dt: 0.001,
            settle_steps: 20,
            measure_steps: 2000,
        };
        let rates = simulated_rates(&model, &currents, schedule).unwrap();
        for (r, &j) in rates.iter().zip(currents.iter()) {
            let expected = lif_rate(params, j);
            assert!((r - expected).abs() < 3.0, "simulated {} vs analytic {}", r, expected);
        }
    }

    #[test]
    fn test_simulation_rejects_empty_window() {
        let model = LifNeuron::new(NeuronParameters::default());
        let schedule = RateSimulation {
            dt: 0.001,
            settle_steps: 0,
            measure_steps: 0,
        };
        assert!(simulated_rates(&model, &array![[1.0]], schedule).is_err());
    }
}
