// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Probes: periodic recordings of a filtered origin output

use crate::filter::FilteredInput;
use ndarray::{Array1, Array2};

/// Tolerance on the sample clock so float accumulation never skips a sample
const SAMPLE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSample {
    pub time: f64,
    pub value: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct Probe {
    name: String,
    target: String,
    sample_interval: f64,
    inputs: Vec<FilteredInput>,
    samples: Vec<ProbeSample>,
    /// Anchored at the first tick, so probes added mid-run start there
    next_sample: Option<f64>,
}

impl Probe {
    /// `input` is the identity-routed, filtered copy of the target origin
    pub(crate) fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        sample_interval: f64,
        input: FilteredInput,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            sample_interval,
            inputs: vec![input],
            samples: Vec::new(),
            next_sample: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `node:origin` path of the recorded origin
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn sample_interval(&self) -> f64 {
        self.sample_interval
    }

    pub fn dimensions(&self) -> usize {
        self.inputs[0].value().len()
    }

    pub fn inputs(&self) -> &[FilteredInput] {
        &self.inputs
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut Vec<FilteredInput> {
        &mut self.inputs
    }

    pub fn data(&self) -> &[ProbeSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&ProbeSample> {
        self.samples.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|sample| sample.time).collect()
    }

    /// `samples × dimensions`
    pub fn values(&self) -> Array2<f64> {
        let mut values = Array2::zeros((self.samples.len(), self.dimensions()));
        for (mut row, sample) in values.rows_mut().into_iter().zip(&self.samples) {
            row.assign(&sample.value);
        }
        values
    }

    pub(crate) fn tick(&mut self, t: f64) {
        let next = *self.next_sample.get_or_insert(t);
        if t + SAMPLE_EPSILON >= next {
            self.samples.push(ProbeSample {
                time: t,
                value: self.inputs[0].value().clone(),
            });
            self.next_sample = Some(next + self.sample_interval);
        }
    }
}
