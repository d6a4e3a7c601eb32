// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Filtered inputs
//!
//! Every connection lands on its post node as a first-order low-pass filter:
//! `value' = decay · value + (1 - decay) · target`, `decay = exp(-dt / pstc)`.

use crate::node::{NodeIndex, OriginRef};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub enum InputSource {
    /// `transform · origin output`
    Decoded {
        origin: OriginRef,
        transform: Array2<f64>,
    },
    /// `weights · pre spikes / dt`, added to the post units' current
    Encoded { pre: NodeIndex, weights: Array2<f64> },
}

#[derive(Debug, Clone)]
pub struct FilteredInput {
    pstc: f64,
    value: Array1<f64>,
    source: InputSource,
}

impl FilteredInput {
    pub fn decoded(origin: OriginRef, transform: Array2<f64>, pstc: f64) -> Self {
        Self {
            pstc,
            value: Array1::zeros(transform.nrows()),
            source: InputSource::Decoded { origin, transform },
        }
    }

    pub fn encoded(pre: NodeIndex, weights: Array2<f64>, pstc: f64) -> Self {
        Self {
            pstc,
            value: Array1::zeros(weights.nrows()),
            source: InputSource::Encoded { pre, weights },
        }
    }

    pub fn pstc(&self) -> f64 {
        self.pstc
    }

    pub fn value(&self) -> &Array1<f64> {
        &self.value
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self.source, InputSource::Decoded { .. })
    }

    /// Next filtered value for `target`
    pub fn filtered(&self, decay: f64, target: &Array1<f64>) -> Array1<f64> {
        &self.value * decay + target * (1.0 - decay)
    }

    pub(crate) fn set_value(&mut self, value: Array1<f64>) {
        self.value = value;
    }
}

/// Per-step decay of a filter; `pstc <= 0` passes the target straight through
pub fn decay_factor(pstc: f64, dt: f64) -> f64 {
    if pstc <= 0.0 {
        0.0
    } else {
        (-dt / pstc).exp()
    }
}
