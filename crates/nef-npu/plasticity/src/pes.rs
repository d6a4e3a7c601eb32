// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! PES (Prescribed Error Sensitivity) learning rule

use crate::rule::{LearningContext, LearningRule, PlasticityError, PlasticityResult};
use ndarray::{Array2, Axis};
use tracing::trace;

/// Default learning rate
pub const DEFAULT_LEARNING_RATE: f64 = 5e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PesConfig {
    pub learning_rate: f64,
}

impl Default for PesConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

/// Moves each post unit's input weights against its share of the error,
/// in proportion to pre-synaptic activity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PesRule {
    learning_rate: f64,
}

impl PesRule {
    pub fn new(learning_rate: f64) -> PlasticityResult<Self> {
        if !learning_rate.is_finite() || learning_rate < 0.0 {
            return Err(PlasticityError::InvalidParameters(format!(
                "learning_rate must be finite and >= 0, got {}",
                learning_rate
            )));
        }
        Ok(Self { learning_rate })
    }

    pub fn from_config(config: &PesConfig) -> PlasticityResult<Self> {
        Self::new(config.learning_rate)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Default for PesRule {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

impl LearningRule for PesRule {
    fn name(&self) -> &'static str {
        "pes"
    }

    fn weight_delta(&self, ctx: &LearningContext<'_>) -> PlasticityResult<Array2<f64>> {
        ctx.validate()?;

        let scale = -self.learning_rate * ctx.dt;
        let post = ctx.error_projection.insert_axis(Axis(1));
        let pre = ctx.pre_activity.insert_axis(Axis(0));
        let delta = post.dot(&pre) * scale;

        trace!(
            target: "nef-plasticity",
            "[PES] delta {}x{}, max |dW| = {:e}",
            delta.nrows(),
            delta.ncols(),
            delta.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
        );
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_delta_is_negative_outer_product() {
        let rule = PesRule::new(0.5).unwrap();
        let weights = Array2::zeros((2, 3));
        let pre = array![1.0, 2.0, 0.0];
        let error = array![1.0, -2.0];
        let ctx = LearningContext {
            weights: weights.view(),
            pre_activity: pre.view(),
            error_projection: error.view(),
            dt: 0.1,
        };

        let delta = rule.weight_delta(&ctx).unwrap();
        // -0.5 * 0.1 * outer(error, pre)
        assert_eq!(delta, array![[-0.05, -0.1, 0.0], [0.1, 0.2, 0.0]]);
    }

    #[test]
    fn test_zero_error_leaves_weights_unchanged() {
        let rule = PesRule::default();
        let weights = Array2::ones((2, 2));
        let pre = array![100.0, 50.0];
        let error = array![0.0, 0.0];
        let ctx = LearningContext {
            weights: weights.view(),
            pre_activity: pre.view(),
            error_projection: error.view(),
            dt: 0.001,
        };
        assert!(rule.weight_delta(&ctx).unwrap().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn test_mismatched_context_is_rejected() {
        let rule = PesRule::default();
        let weights = Array2::zeros((2, 3));
        let pre = array![1.0, 2.0];
        let error = array![1.0, 1.0];
        let ctx = LearningContext {
            weights: weights.view(),
            pre_activity: pre.view(),
            error_projection: error.view(),
            dt: 0.001,
        };
        assert!(matches!(
            rule.weight_delta(&ctx),
            Err(PlasticityError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_negative_learning_rate_is_rejected() {
        assert!(PesRule::new(-1.0).is_err());
        assert!(PesRule::new(f64::NAN).is_err());
    }
}
