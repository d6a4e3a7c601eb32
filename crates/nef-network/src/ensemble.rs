// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensembles
//!
//! An ensemble is `array_size` independent sub-populations of `neurons` units
//! each. Every unit has a gain-scaled encoder and a bias current; all units
//! share one neuron model and one set of dynamical constants.
//!
//! ## Per-step update
//! 1. Sum the filtered decoded inputs and divide by `radius`
//! 2. Encode each sub-population's slice: `J = E_i · x_i + bias`
//! 3. Add encoded inputs and learned-termination currents
//! 4. Step the neuron model and decode every origin from the new spikes

use crate::errors::{NetworkError, NetworkResult};
use crate::filter::{FilteredInput, InputSource};
use crate::origin::Origin;
use crate::termination::LearnedTermination;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use nef_config::EnsembleDefaults;
use nef_npu_decoding::{
    DecodablePopulation, DecoderConfig, DecoderSolver, SignatureBuilder, TargetFunction,
};
use nef_npu_neural::{
    create_model, NeuronKind, NeuronModel, NeuronParameters, NeuronState, RateMode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::sync::Arc;
use tracing::debug;

/// Construction parameters of an ensemble
#[derive(Debug, Clone)]
pub struct EnsembleParams {
    /// Units per sub-population
    pub neurons: usize,
    /// Represented width per sub-population
    pub dimensions: usize,
    pub array_size: usize,
    /// Drawn from the network RNG when `None`
    pub seed: Option<u64>,
    pub neuron_kind: NeuronKind,
    /// Overrides `neuron_kind`, `tau_rc` and `tau_ref`
    pub model: Option<Arc<dyn NeuronModel>>,
    /// Uniform range of per-unit max firing rates (Hz)
    pub max_rate: (f64, f64),
    /// Uniform range of per-unit threshold crossings
    pub intercept: (f64, f64),
    pub tau_rc: f64,
    pub tau_ref: f64,
    pub radius: f64,
    pub noise: f64,
    pub decoder_noise: f64,
    /// Preferred directions, `neurons × dimensions` (shared by every
    /// sub-population) or `(array_size·neurons) × dimensions`
    pub encoders: Option<Array2<f64>>,
    /// Evaluation points for every origin, `dimensions × samples`
    pub eval_points: Option<Array2<f64>>,
}

impl EnsembleParams {
    pub fn new(neurons: usize, dimensions: usize) -> Self {
        Self::from_defaults(&EnsembleDefaults::default(), neurons, dimensions)
    }

    pub fn from_defaults(defaults: &EnsembleDefaults, neurons: usize, dimensions: usize) -> Self {
        Self {
            neurons,
            dimensions,
            array_size: 1,
            seed: None,
            neuron_kind: defaults.neuron_model,
            model: None,
            max_rate: (defaults.max_rate[0], defaults.max_rate[1]),
            intercept: (defaults.intercept[0], defaults.intercept[1]),
            tau_rc: defaults.tau_rc,
            tau_ref: defaults.tau_ref,
            radius: defaults.radius,
            noise: defaults.noise,
            decoder_noise: defaults.decoder_noise,
            encoders: None,
            eval_points: None,
        }
    }

    pub fn with_array_size(mut self, array_size: usize) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_neuron_kind(mut self, kind: NeuronKind) -> Self {
        self.neuron_kind = kind;
        self
    }

    pub fn with_model(mut self, model: Arc<dyn NeuronModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_max_rate(mut self, low: f64, high: f64) -> Self {
        self.max_rate = (low, high);
        self
    }

    pub fn with_intercept(mut self, low: f64, high: f64) -> Self {
        self.intercept = (low, high);
        self
    }

    pub fn with_tau_rc(mut self, tau_rc: f64) -> Self {
        self.tau_rc = tau_rc;
        self
    }

    pub fn with_tau_ref(mut self, tau_ref: f64) -> Self {
        self.tau_ref = tau_ref;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_decoder_noise(mut self, decoder_noise: f64) -> Self {
        self.decoder_noise = decoder_noise;
        self
    }

    pub fn with_encoders(mut self, encoders: Array2<f64>) -> Self {
        self.encoders = Some(encoders);
        self
    }

    pub fn with_eval_points(mut self, eval_points: Array2<f64>) -> Self {
        self.eval_points = Some(eval_points);
        self
    }

    /// Total unit count across sub-populations
    pub fn total_neurons(&self) -> usize {
        self.neurons * self.array_size
    }

    pub fn validate(&self) -> NetworkResult<()> {
        let invalid = |msg: String| Err(NetworkError::InvalidParameters(msg));

        if self.neurons == 0 || self.dimensions == 0 || self.array_size == 0 {
            return invalid(format!(
                "neurons ({}), dimensions ({}) and array_size ({}) must all be >= 1",
                self.neurons, self.dimensions, self.array_size
            ));
        }
        for (name, (low, high)) in [("max_rate", self.max_rate), ("intercept", self.intercept)] {
            if !low.is_finite() || !high.is_finite() || low > high {
                return invalid(format!("{} range [{}, {}] is invalid", name, low, high));
            }
        }
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return invalid(format!("radius must be > 0, got {}", self.radius));
        }
        if !(self.noise >= 0.0) || !(self.decoder_noise >= 0.0) {
            return invalid(format!(
                "noise ({}) and decoder_noise ({}) must be >= 0",
                self.noise, self.decoder_noise
            ));
        }
        if let Some(encoders) = &self.encoders {
            let rows = encoders.nrows();
            if encoders.ncols() != self.dimensions
                || (rows != self.neurons && rows != self.total_neurons())
            {
                return Err(NetworkError::ShapeMismatch {
                    what: "encoders".to_string(),
                    expected: (self.total_neurons(), self.dimensions),
                    actual: encoders.dim(),
                });
            }
        }
        if let Some(points) = &self.eval_points {
            if points.nrows() != self.dimensions || points.ncols() == 0 {
                return Err(NetworkError::ShapeMismatch {
                    what: "eval_points".to_string(),
                    expected: (self.dimensions, points.ncols().max(1)),
                    actual: points.dim(),
                });
            }
        }
        Ok(())
    }
}

/// Next state of one ensemble, computed against the previous step
#[derive(Debug, Clone)]
pub struct PopulationUpdate {
    pub(crate) state: NeuronState,
    pub(crate) spikes: Array1<f64>,
    pub(crate) outputs: Vec<Array1<f64>>,
}

#[derive(Debug)]
pub struct Ensemble {
    name: String,
    cache_key: String,
    neurons: usize,
    dimensions: usize,
    array_size: usize,
    seed: u64,
    radius: f64,
    noise: f64,
    decoder_noise: f64,
    max_rate: f64,
    model: Arc<dyn NeuronModel>,
    rate_mode: RateMode,
    /// Gain-scaled, `total × dimensions`
    encoders: Array2<f64>,
    bias: Array1<f64>,
    gain: Array1<f64>,
    eval_points: Option<Array2<f64>>,
    origins: Vec<Origin>,
    inputs: Vec<FilteredInput>,
    learned: Vec<LearnedTermination>,
    neuron_state: NeuronState,
    spikes: Array1<f64>,
}

impl Ensemble {
    /// Build the population: tuning curves, encoders and signature.
    ///
    /// Origins are added separately so the caller controls decoder solving.
    /// `decoder` is folded into the signature, so cached fits are only shared
    /// between solvers that would compute the same activities.
    pub(crate) fn build(
        name: impl Into<String>,
        params: EnsembleParams,
        seed: u64,
        decoder: &DecoderConfig,
    ) -> NetworkResult<Self> {
        params.validate()?;
        let name = name.into();

        let model = match &params.model {
            Some(model) => Arc::clone(model),
            None => create_model(
                params.neuron_kind,
                NeuronParameters::new(params.tau_rc, params.tau_ref)?,
            )?,
        };
        let total = params.total_neurons();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut gain = Array1::zeros(total);
        let mut bias = Array1::zeros(total);
        for unit in 0..total {
            let max_rate = uniform(&mut rng, params.max_rate);
            let intercept = uniform(&mut rng, params.intercept);
            let (g, b) = model.gain_bias(max_rate, intercept)?;
            gain[unit] = g;
            bias[unit] = b;
        }

        let mut encoders = Array2::zeros((total, params.dimensions));
        for (unit, mut row) in encoders.rows_mut().into_iter().enumerate() {
            match &params.encoders {
                Some(custom) => row.assign(&custom.row(unit % custom.nrows())),
                None => random_direction(&mut rng, row.view_mut()),
            }
            let norm = row.dot(&row).sqrt();
            if norm == 0.0 {
                return Err(NetworkError::InvalidParameters(format!(
                    "encoder {} of ensemble '{}' is the zero vector",
                    unit, name
                )));
            }
            let scale = gain[unit] / norm;
            row.mapv_inplace(|v| v * scale);
        }

        let parameters = model.parameters();
        let mut signature = SignatureBuilder::new("ensemble")
            .with_str(model.model_name())
            .with_u64(params.neurons as u64)
            .with_u64(params.dimensions as u64)
            .with_u64(params.array_size as u64)
            .with_u64(seed)
            .with_f64(parameters.tau_rc)
            .with_f64(parameters.tau_ref)
            .with_f64(params.max_rate.0)
            .with_f64(params.max_rate.1)
            .with_f64(params.intercept.0)
            .with_f64(params.intercept.1)
            .with_f64(params.radius)
            .with_f64(params.noise)
            .with_f64(params.decoder_noise)
            .with_u64(decoder.num_samples as u64);
        if model.rate_mode() == RateMode::SimulateOnly {
            // measured rates depend on the simulation schedule
            signature = signature
                .with_f64(decoder.dt)
                .with_u64(decoder.settle_steps as u64)
                .with_u64(decoder.measure_steps as u64);
        }
        if let Some(custom) = &params.encoders {
            signature = signature.with_str("encoders").with_matrix(custom);
        }
        if let Some(points) = &params.eval_points {
            signature = signature.with_str("eval_points").with_matrix(points);
        }
        let cache_key = signature.finish();

        debug!(
            target: "nef-network",
            "[ENSEMBLE] Built '{}': {}x{} units, {}D, model={}, key={}",
            name,
            params.array_size,
            params.neurons,
            params.dimensions,
            model.model_name(),
            cache_key
        );

        Ok(Self {
            name,
            cache_key,
            neurons: params.neurons,
            dimensions: params.dimensions,
            array_size: params.array_size,
            seed,
            radius: params.radius,
            noise: params.noise,
            decoder_noise: params.decoder_noise,
            max_rate: params.max_rate.1,
            rate_mode: model.rate_mode(),
            neuron_state: model.create_state(total),
            model,
            encoders,
            bias,
            gain,
            eval_points: params.eval_points,
            origins: Vec::new(),
            inputs: Vec::new(),
            learned: Vec::new(),
            spikes: Array1::zeros(total),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_neurons(&self) -> usize {
        self.neurons * self.array_size
    }

    /// Input width: `dimensions * array_size`
    pub fn represented_width(&self) -> usize {
        self.dimensions * self.array_size
    }

    pub fn gain(&self) -> &Array1<f64> {
        &self.gain
    }

    /// All encoders, gain-scaled (`total × dimensions`)
    pub fn all_encoders(&self) -> &Array2<f64> {
        &self.encoders
    }

    pub fn all_bias(&self) -> &Array1<f64> {
        &self.bias
    }

    /// Spike output of the last step (spikes per unit, not Hz)
    pub fn spikes(&self) -> &Array1<f64> {
        &self.spikes
    }

    pub fn neuron_state(&self) -> &NeuronState {
        &self.neuron_state
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn inputs(&self) -> &[FilteredInput] {
        &self.inputs
    }

    pub fn learned_terminations(&self) -> &[LearnedTermination] {
        &self.learned
    }

    pub fn origin_index(&self, name: &str) -> Option<usize> {
        self.origins.iter().position(|origin| origin.name() == name)
    }

    /// Solve an origin for `func` without attaching it
    pub fn solve_origin(
        &self,
        name: &str,
        func: Option<TargetFunction>,
        eval_points: Option<&Array2<f64>>,
        solver: &DecoderSolver,
    ) -> NetworkResult<Origin> {
        let solution = solver.solve(self, func.as_ref(), eval_points)?;
        Ok(Origin::from_solution(name, func, solution))
    }

    pub(crate) fn push_origin(&mut self, origin: Origin) -> usize {
        self.origins.push(origin);
        self.origins.len() - 1
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut Vec<FilteredInput> {
        &mut self.inputs
    }

    pub(crate) fn learned_mut(&mut self) -> &mut Vec<LearnedTermination> {
        &mut self.learned
    }

    /// Run one step against the current state without mutating it
    pub(crate) fn compute_step(&self, dt: f64) -> PopulationUpdate {
        let mut decoded = Array1::<f64>::zeros(self.represented_width());
        let mut current = self.bias.clone();
        for input in &self.inputs {
            match input.source() {
                InputSource::Decoded { .. } => decoded += input.value(),
                InputSource::Encoded { .. } => current += input.value(),
            }
        }
        decoded.mapv_inplace(|v| v / self.radius);

        for i in 0..self.array_size {
            let units = i * self.neurons..(i + 1) * self.neurons;
            let x = decoded.slice(s![i * self.dimensions..(i + 1) * self.dimensions]);
            let encoded = self.encoders.slice(s![units.clone(), ..]).dot(&x);
            let mut block = current.slice_mut(s![units]);
            block += &encoded;
        }

        for termination in &self.learned {
            current += &termination.current();
        }

        let mut state = self.neuron_state.clone();
        let mut spikes = Array1::zeros(self.total_neurons());
        self.model.step(&mut state, current.view(), dt, spikes.view_mut());

        let outputs = self
            .origins
            .iter()
            .map(|origin| origin.decode(spikes.view(), self.radius, dt))
            .collect();
        PopulationUpdate {
            state,
            spikes,
            outputs,
        }
    }

    pub(crate) fn apply_step(&mut self, update: PopulationUpdate) {
        self.neuron_state = update.state;
        self.spikes = update.spikes;
        for (origin, output) in self.origins.iter_mut().zip(update.outputs) {
            origin.set_output(output);
        }
    }

    /// Error vector projected onto every unit: `E_i · (e_i / radius)`
    pub fn project_error(&self, error: ArrayView1<f64>) -> NetworkResult<Array1<f64>> {
        if error.len() != self.represented_width() {
            return Err(NetworkError::vector_width(
                format!("error signal of '{}'", self.name),
                self.represented_width(),
                error.len(),
            ));
        }
        let mut projection = Array1::zeros(self.total_neurons());
        for i in 0..self.array_size {
            let units = i * self.neurons..(i + 1) * self.neurons;
            let e = error.slice(s![i * self.dimensions..(i + 1) * self.dimensions]);
            let scaled = e.mapv(|v| v / self.radius);
            projection
                .slice_mut(s![units.clone()])
                .assign(&self.encoders.slice(s![units, ..]).dot(&scaled));
        }
        Ok(projection)
    }
}

impl DecodablePopulation for Ensemble {
    fn cache_key(&self) -> &str {
        &self.cache_key
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn array_size(&self) -> usize {
        self.array_size
    }

    fn neurons_num(&self) -> usize {
        self.neurons
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn noise(&self) -> f64 {
        self.noise
    }

    fn decoder_noise(&self) -> f64 {
        self.decoder_noise
    }

    fn max_rate(&self) -> f64 {
        self.max_rate
    }

    fn model(&self) -> &dyn NeuronModel {
        self.model.as_ref()
    }

    fn rate_mode(&self) -> RateMode {
        self.rate_mode
    }

    fn encoders(&self, index: usize) -> ArrayView2<'_, f64> {
        self.encoders
            .slice(s![index * self.neurons..(index + 1) * self.neurons, ..])
    }

    fn bias(&self, index: usize) -> ArrayView1<'_, f64> {
        self.bias
            .slice(s![index * self.neurons..(index + 1) * self.neurons])
    }

    fn eval_points(&self) -> Option<&Array2<f64>> {
        self.eval_points.as_ref()
    }
}

fn uniform(rng: &mut StdRng, (low, high): (f64, f64)) -> f64 {
    if low < high {
        rng.gen_range(low..high)
    } else {
        low
    }
}

fn random_direction(rng: &mut StdRng, mut row: ndarray::ArrayViewMut1<f64>) {
    loop {
        for value in row.iter_mut() {
            *value = rng.sample(StandardNormal);
        }
        if row.iter().any(|v| *v != 0.0) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nef_npu_neural::lif_rate;

    fn samples(num_samples: usize) -> DecoderConfig {
        DecoderConfig {
            num_samples,
            ..DecoderConfig::default()
        }
    }

    fn rate_params(neurons: usize, dims: usize) -> EnsembleParams {
        EnsembleParams::new(neurons, dims).with_neuron_kind(NeuronKind::LifRate)
    }

    #[test]
    fn test_tuning_hits_max_rate_at_preferred_direction() {
        let params = rate_params(20, 1).with_max_rate(100.0, 100.0);
        let ensemble = Ensemble::build("A", params, 7, &samples(100)).unwrap();

        let tau = NeuronParameters::default();
        for unit in 0..ensemble.total_neurons() {
            let encoder = ensemble.all_encoders()[[unit, 0]];
            // x = sign(encoder) is the preferred direction in 1-D
            let current = encoder.abs() + ensemble.all_bias()[unit];
            assert!((lif_rate(tau, current) - 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_same_seed_same_signature() {
        let a = Ensemble::build("A", rate_params(10, 2), 3, &samples(100)).unwrap();
        let b = Ensemble::build("B", rate_params(10, 2), 3, &samples(100)).unwrap();
        let c = Ensemble::build("C", rate_params(10, 2), 4, &samples(100)).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.all_encoders(), b.all_encoders());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    /// LIF that only exposes step-wise simulation
    #[derive(Debug)]
    struct SimulatedLif(nef_npu_neural::LifNeuron);

    impl NeuronModel for SimulatedLif {
        fn model_name(&self) -> &'static str {
            "simulated_lif"
        }
        fn parameters(&self) -> NeuronParameters {
            self.0.parameters()
        }
        fn rate_mode(&self) -> RateMode {
            RateMode::SimulateOnly
        }
        fn step(
            &self,
            state: &mut NeuronState,
            currents: ArrayView1<f64>,
            dt: f64,
            output: ndarray::ArrayViewMut1<f64>,
        ) {
            self.0.step(state, currents, dt, output)
        }
    }

    #[test]
    fn test_simulated_models_key_on_the_rate_schedule() {
        let coarse = DecoderConfig {
            dt: 0.002,
            ..samples(100)
        };
        let longer = DecoderConfig {
            measure_steps: 400,
            ..samples(100)
        };

        let model: Arc<dyn NeuronModel> =
            Arc::new(SimulatedLif(nef_npu_neural::LifNeuron::new(NeuronParameters::default())));
        let simulated = |decoder: &DecoderConfig| {
            let params = EnsembleParams::new(10, 1).with_model(Arc::clone(&model));
            Ensemble::build("A", params, 5, decoder).unwrap().cache_key().to_string()
        };
        assert_ne!(simulated(&samples(100)), simulated(&coarse));
        assert_ne!(simulated(&samples(100)), simulated(&longer));

        // analytic rates do not depend on the schedule
        let analytic = |decoder: &DecoderConfig| {
            Ensemble::build("A", rate_params(10, 1), 5, decoder)
                .unwrap()
                .cache_key()
                .to_string()
        };
        assert_eq!(analytic(&samples(100)), analytic(&coarse));
    }

    #[test]
    fn test_custom_encoders_are_normalised_and_scaled() {
        let custom = ndarray::array![[2.0, 0.0], [0.0, -3.0]];
        let params = rate_params(2, 2).with_array_size(2).with_encoders(custom);
        let ensemble = Ensemble::build("A", params, 1, &samples(50)).unwrap();
        let encoders = ensemble.all_encoders();
        // row 2 reuses custom row 0
        assert!(encoders[[2, 1]].abs() < 1e-12);
        assert!((encoders[[2, 0]] - ensemble.gain()[2]).abs() < 1e-12);
        assert!((encoders[[1, 1]] + ensemble.gain()[1]).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let bad = rate_params(4, 2).with_encoders(Array2::ones((3, 2)));
        assert!(matches!(
            Ensemble::build("A", bad, 1, &samples(10)),
            Err(NetworkError::ShapeMismatch { .. })
        ));
        let bad = rate_params(4, 2).with_eval_points(Array2::ones((1, 10)));
        assert!(bad.validate().is_err());
        assert!(rate_params(0, 1).validate().is_err());
        assert!(rate_params(4, 1).with_radius(0.0).validate().is_err());
    }

    #[test]
    fn test_compute_step_leaves_state_until_applied() {
        let mut ensemble = Ensemble::build("A", rate_params(8, 1), 2, &samples(10)).unwrap();
        let update = ensemble.compute_step(0.001);
        assert!(ensemble.spikes().iter().all(|s| *s == 0.0));
        assert_eq!(update.spikes.len(), 8);
        assert_eq!(update.outputs.len(), ensemble.origins().len());

        let spikes = update.spikes.clone();
        ensemble.apply_step(update);
        assert_eq!(ensemble.spikes(), &spikes);
    }

    #[test]
    fn test_project_error_width() {
        let ensemble = Ensemble::build("A", rate_params(5, 2), 1, &samples(10)).unwrap();
        assert!(ensemble.project_error(ndarray::array![1.0].view()).is_err());
        let projection = ensemble.project_error(ndarray::array![1.0, 0.0].view()).unwrap();
        assert_eq!(projection.len(), 5);
        for unit in 0..5 {
            assert!((projection[unit] - ensemble.all_encoders()[[unit, 0]]).abs() < 1e-12);
        }
    }
}
