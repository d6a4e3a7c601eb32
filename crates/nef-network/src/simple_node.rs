// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! User-defined tick nodes

use crate::errors::{NetworkError, NetworkResult};
use crate::filter::FilteredInput;
use crate::origin::{Origin, IDENTITY_ORIGIN};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

pub type NodeFunction = Arc<dyn Fn(f64, &[f64]) -> Vec<f64> + Send + Sync>;

/// Computes `output = f(t, filtered_input)` once per step, before the fused
/// update. Decoded connections may target it.
#[derive(Clone)]
pub struct SimpleNode {
    name: String,
    input_dimensions: usize,
    func: NodeFunction,
    inputs: Vec<FilteredInput>,
    origins: Vec<Origin>,
}

impl SimpleNode {
    pub fn new<F>(name: impl Into<String>, input_dimensions: usize, func: F) -> NetworkResult<Self>
    where
        F: Fn(f64, &[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        let name = name.into();
        let initial = func(0.0, &vec![0.0; input_dimensions]);
        if initial.is_empty() {
            return Err(NetworkError::InvalidParameters(format!(
                "node '{}' has zero output width",
                name
            )));
        }
        Ok(Self {
            name,
            input_dimensions,
            func: Arc::new(func),
            inputs: Vec::new(),
            origins: vec![Origin::passthrough(IDENTITY_ORIGIN, Array1::from(initial))],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_dimensions(&self) -> usize {
        self.input_dimensions
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn inputs(&self) -> &[FilteredInput] {
        &self.inputs
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut Vec<FilteredInput> {
        &mut self.inputs
    }

    /// Sum of the filtered inputs
    pub fn input_value(&self) -> Array1<f64> {
        self.inputs
            .iter()
            .fold(Array1::zeros(self.input_dimensions), |acc, input| acc + input.value())
    }

    pub(crate) fn tick(&mut self, t: f64) -> NetworkResult<()> {
        let input = self.input_value().to_vec();
        let output = (self.func)(t, &input);
        let width = self.origins[0].dimensions();
        if output.len() != width {
            return Err(NetworkError::vector_width(
                format!("node '{}' output at t={}", self.name, t),
                width,
                output.len(),
            ));
        }
        self.origins[0].set_output(Array1::from(output));
        Ok(())
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("name", &self.name)
            .field("input_dimensions", &self.input_dimensions)
            .field("inputs", &self.inputs.len())
            .field("origins", &self.origins)
            .finish()
    }
}
