// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Input nodes: constant vectors or functions of time

use crate::errors::{NetworkError, NetworkResult};
use crate::origin::{Origin, IDENTITY_ORIGIN};
use ndarray::Array1;
use std::fmt;
use std::sync::Arc;

pub type TimeFunction = Arc<dyn Fn(f64) -> Vec<f64> + Send + Sync>;

#[derive(Clone)]
pub enum InputValue {
    Constant(Vec<f64>),
    Function(TimeFunction),
}

impl InputValue {
    pub fn function<F>(func: F) -> Self
    where
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        InputValue::Function(Arc::new(func))
    }

    fn at(&self, t: f64) -> Vec<f64> {
        match self {
            InputValue::Constant(value) => value.clone(),
            InputValue::Function(func) => func(t),
        }
    }
}

impl fmt::Debug for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputValue::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            InputValue::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Constant(vec![value])
    }
}

impl From<Vec<f64>> for InputValue {
    fn from(value: Vec<f64>) -> Self {
        InputValue::Constant(value)
    }
}

impl From<&[f64]> for InputValue {
    fn from(value: &[f64]) -> Self {
        InputValue::Constant(value.to_vec())
    }
}

#[derive(Debug, Clone)]
pub struct Input {
    name: String,
    value: InputValue,
    zero_after: Option<f64>,
    origins: Vec<Origin>,
}

impl Input {
    /// Output width is taken from the value at `t = 0`
    pub fn new(name: impl Into<String>, value: impl Into<InputValue>) -> NetworkResult<Self> {
        let name = name.into();
        let value = value.into();
        let initial = value.at(0.0);
        if initial.is_empty() {
            return Err(NetworkError::InvalidParameters(format!(
                "input '{}' has zero width",
                name
            )));
        }
        Ok(Self {
            origins: vec![Origin::passthrough(IDENTITY_ORIGIN, Array1::from(initial))],
            name,
            value,
            zero_after: None,
        })
    }

    /// Output becomes zero once `t >= time`
    pub fn with_zero_after(mut self, time: f64) -> Self {
        self.zero_after = Some(time);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> usize {
        self.origins[0].dimensions()
    }

    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn zero_after(&self) -> Option<f64> {
        self.zero_after
    }

    pub(crate) fn tick(&mut self, t: f64) -> NetworkResult<()> {
        let width = self.dimensions();
        let output = match self.zero_after {
            Some(cutoff) if t >= cutoff => Array1::zeros(width),
            _ => {
                let value = self.value.at(t);
                if value.len() != width {
                    return Err(NetworkError::vector_width(
                        format!("input '{}' at t={}", self.name, t),
                        width,
                        value.len(),
                    ));
                }
                Array1::from(value)
            }
        };
        self.origins[0].set_output(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_constant_input() {
        let mut input = Input::new("in", 0.5).unwrap();
        assert_eq!(input.dimensions(), 1);
        input.tick(0.3).unwrap();
        assert_eq!(input.origins()[0].decoded_output(), &array![0.5]);
    }

    #[test]
    fn test_function_input_and_zero_after() {
        let mut input = Input::new("sin", InputValue::function(|t| vec![t, 2.0 * t]))
            .unwrap()
            .with_zero_after(1.0);
        assert_eq!(input.dimensions(), 2);
        input.tick(0.5).unwrap();
        assert_eq!(input.origins()[0].decoded_output(), &array![0.5, 1.0]);
        input.tick(1.0).unwrap();
        assert_eq!(input.origins()[0].decoded_output(), &array![0.0, 0.0]);
    }

    #[test]
    fn test_width_change_is_an_error() {
        let mut input =
            Input::new("bad", InputValue::function(|t| vec![0.0; if t > 0.0 { 2 } else { 1 }]))
                .unwrap();
        assert!(input.tick(0.1).is_err());
        assert!(Input::new("empty", Vec::<f64>::new()).is_err());
    }
}
