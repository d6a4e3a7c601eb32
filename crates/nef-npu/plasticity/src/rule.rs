// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Learning-rule contract

use core::fmt;
use ndarray::{Array2, ArrayView1, ArrayView2};

pub type PlasticityResult<T> = Result<T, PlasticityError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlasticityError {
    #[error("Invalid learning parameters: {0}")]
    InvalidParameters(String),

    #[error("Learning context shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Everything a rule may read during one step
#[derive(Debug, Clone, Copy)]
pub struct LearningContext<'a> {
    /// Current weights (`post neurons × pre neurons`)
    pub weights: ArrayView2<'a, f64>,
    /// Filtered pre-synaptic rates (Hz)
    pub pre_activity: ArrayView1<'a, f64>,
    /// Error projected onto the post units (`E · e`, one value per post unit)
    pub error_projection: ArrayView1<'a, f64>,
    pub dt: f64,
}

impl LearningContext<'_> {
    pub fn validate(&self) -> PlasticityResult<()> {
        let (post, pre) = self.weights.dim();
        if self.pre_activity.len() != pre || self.error_projection.len() != post {
            return Err(PlasticityError::ShapeMismatch(format!(
                "weights are {}x{}, pre activity has {} values, error projection has {}",
                post,
                pre,
                self.pre_activity.len(),
                self.error_projection.len()
            )));
        }
        Ok(())
    }
}

/// A weight-update rule for a learned termination
pub trait LearningRule: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Weight change for this step, same shape as `ctx.weights`
    fn weight_delta(&self, ctx: &LearningContext<'_>) -> PlasticityResult<Array2<f64>>;
}
