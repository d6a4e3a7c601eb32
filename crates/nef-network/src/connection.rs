// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connection and learning parameters
//!
//! A connection is a wiring action, not a stored object: it picks a pre
//! origin, builds a transform and registers a filtered input on the post
//! node. Exactly one of two paths applies:
//!
//! - **decoded**: `transform` *or* (`weight`, `index_pre`, `index_post`),
//!   optionally with `func` / `eval_points`
//! - **encoded**: `encoded_weights`, neuron to neuron

use crate::errors::{NetworkError, NetworkResult};
use crate::transform::IndexSpec;
use ndarray::Array2;
use nef_npu_decoding::TargetFunction;
use nef_npu_plasticity::LearningRule;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ConnectionSpec {
    /// Falls back to `connection.pstc` from the network configuration
    pub pstc: Option<f64>,
    /// `post_width × pre_width`
    pub transform: Option<Array2<f64>>,
    pub weight: Option<f64>,
    pub index_pre: Option<IndexSpec>,
    pub index_post: Option<IndexSpec>,
    /// Decode this function from the pre ensemble (memoised by name)
    pub func: Option<TargetFunction>,
    pub eval_points: Option<Array2<f64>>,
    /// `post neurons × pre neurons`
    pub encoded_weights: Option<Array2<f64>>,
}

impl ConnectionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pstc(mut self, pstc: f64) -> Self {
        self.pstc = Some(pstc);
        self
    }

    pub fn transform(mut self, transform: Array2<f64>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn index_pre(mut self, index: impl Into<IndexSpec>) -> Self {
        self.index_pre = Some(index.into());
        self
    }

    pub fn index_post(mut self, index: impl Into<IndexSpec>) -> Self {
        self.index_post = Some(index.into());
        self
    }

    pub fn func(mut self, func: TargetFunction) -> Self {
        self.func = Some(func);
        self
    }

    pub fn eval_points(mut self, eval_points: Array2<f64>) -> Self {
        self.eval_points = Some(eval_points);
        self
    }

    pub fn encoded_weights(mut self, weights: Array2<f64>) -> Self {
        self.encoded_weights = Some(weights);
        self
    }

    pub fn is_encoded(&self) -> bool {
        self.encoded_weights.is_some()
    }

    /// Reject parameter combinations that select both paths
    pub fn check_contract(&self) -> NetworkResult<()> {
        let routing = self.weight.is_some() || self.index_pre.is_some() || self.index_post.is_some();
        if self.transform.is_some() && routing {
            return Err(NetworkError::ContractViolation(
                "transform cannot be combined with weight/index_pre/index_post".to_string(),
            ));
        }
        if self.is_encoded()
            && (self.transform.is_some()
                || routing
                || self.func.is_some()
                || self.eval_points.is_some())
        {
            return Err(NetworkError::ContractViolation(
                "encoded weights cannot be combined with decoded-connection parameters"
                    .to_string(),
            ));
        }
        if self.eval_points.is_some() && self.func.is_none() {
            return Err(NetworkError::ContractViolation(
                "eval_points require a func".to_string(),
            ));
        }
        if let Some(pstc) = self.pstc {
            if !pstc.is_finite() {
                return Err(NetworkError::InvalidParameters(format!(
                    "pstc must be finite, got {}",
                    pstc
                )));
            }
        }
        Ok(())
    }
}

/// Parameters of a learned termination
#[derive(Debug, Clone, Default)]
pub struct LearnSpec {
    /// Falls back to `plasticity.pstc`
    pub pstc: Option<f64>,
    /// Initial weights (`post neurons × pre neurons`), zeros by default
    pub weights: Option<Array2<f64>>,
    /// PES with `plasticity.learning_rate` by default
    pub rule: Option<Arc<dyn LearningRule>>,
}

impl LearnSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pstc(mut self, pstc: f64) -> Self {
        self.pstc = Some(pstc);
        self
    }

    pub fn weights(mut self, weights: Array2<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn rule(mut self, rule: Arc<dyn LearningRule>) -> Self {
        self.rule = Some(rule);
        self
    }
}
