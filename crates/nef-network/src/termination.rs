// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Learned terminations

use crate::node::{NodeIndex, OriginRef};
use ndarray::{Array1, Array2};
use nef_npu_plasticity::LearningRule;
use std::sync::Arc;

/// Neuron-to-neuron weights onto a post ensemble, adjusted every step by a
/// [`LearningRule`] driven by an error origin.
#[derive(Debug, Clone)]
pub struct LearnedTermination {
    pre: NodeIndex,
    error: OriginRef,
    pstc: f64,
    /// `post neurons × pre neurons`
    weights: Array2<f64>,
    /// Filtered pre-synaptic rates (Hz)
    activity: Array1<f64>,
    rule: Arc<dyn LearningRule>,
}

impl LearnedTermination {
    pub fn new(
        pre: NodeIndex,
        error: OriginRef,
        pstc: f64,
        weights: Array2<f64>,
        rule: Arc<dyn LearningRule>,
    ) -> Self {
        Self {
            pre,
            error,
            pstc,
            activity: Array1::zeros(weights.ncols()),
            weights,
            rule,
        }
    }

    pub fn pre(&self) -> NodeIndex {
        self.pre
    }

    pub fn error(&self) -> OriginRef {
        self.error
    }

    pub fn pstc(&self) -> f64 {
        self.pstc
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn activity(&self) -> &Array1<f64> {
        &self.activity
    }

    pub fn rule(&self) -> &Arc<dyn LearningRule> {
        &self.rule
    }

    /// Current injected into the post units
    pub fn current(&self) -> Array1<f64> {
        self.weights.dot(&self.activity)
    }

    pub(crate) fn apply(&mut self, activity: Array1<f64>, delta: &Array2<f64>) {
        self.activity = activity;
        self.weights += delta;
    }
}
