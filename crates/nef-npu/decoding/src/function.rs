// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Named target functions

use core::fmt;
use std::sync::Arc;

type TargetFn = dyn Fn(&[f64]) -> Vec<f64> + Send + Sync;

/// A function of the represented vector, decoded by an origin.
///
/// The name doubles as the origin name, so two connections computing the
/// same named function share one decoder solve.
#[derive(Clone)]
pub struct TargetFunction {
    name: String,
    func: Arc<TargetFn>,
}

impl TargetFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Wrap a scalar-valued function (output width 1)
    pub fn scalar<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::new(name, move |x| vec![func(x)])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        (self.func)(x)
    }
}

impl fmt::Debug for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
