// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Origins: named decoded outputs of a node

use ndarray::{s, Array1, Array3, ArrayView1, Axis};
use nef_npu_decoding::{DecoderSolution, TargetFunction};

/// Name of the identity origin every node exposes
pub const IDENTITY_ORIGIN: &str = "X";

#[derive(Debug, Clone)]
pub enum OriginKind {
    /// Linear read-out of a population's spikes
    Ensemble {
        /// `array_size × neurons × func_size`
        decoders: Array3<f64>,
        num_samples: usize,
        func_size: usize,
    },
    /// Output written directly by a tick-driven node
    Passthrough,
}

#[derive(Debug, Clone)]
pub struct Origin {
    name: String,
    dimensions: usize,
    func: Option<TargetFunction>,
    decoded_output: Array1<f64>,
    kind: OriginKind,
}

impl Origin {
    pub fn passthrough(name: impl Into<String>, initial: Array1<f64>) -> Self {
        Self {
            name: name.into(),
            dimensions: initial.len(),
            func: None,
            decoded_output: initial,
            kind: OriginKind::Passthrough,
        }
    }

    pub fn from_solution(
        name: impl Into<String>,
        func: Option<TargetFunction>,
        solution: DecoderSolution,
    ) -> Self {
        let array_size = solution.decoders.len_of(Axis(0));
        let dimensions = array_size * solution.func_size;
        Self {
            name: name.into(),
            dimensions,
            func,
            decoded_output: Array1::zeros(dimensions),
            kind: OriginKind::Ensemble {
                decoders: solution.decoders,
                num_samples: solution.num_samples,
                func_size: solution.func_size,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output width (`array_size * func_size` for ensemble origins)
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn func(&self) -> Option<&TargetFunction> {
        self.func.as_ref()
    }

    /// Value produced by the most recent step
    pub fn decoded_output(&self) -> &Array1<f64> {
        &self.decoded_output
    }

    pub fn kind(&self) -> &OriginKind {
        &self.kind
    }

    pub fn decoders(&self) -> Option<&Array3<f64>> {
        match &self.kind {
            OriginKind::Ensemble { decoders, .. } => Some(decoders),
            OriginKind::Passthrough => None,
        }
    }

    pub fn num_samples(&self) -> Option<usize> {
        match &self.kind {
            OriginKind::Ensemble { num_samples, .. } => Some(*num_samples),
            OriginKind::Passthrough => None,
        }
    }

    pub fn func_size(&self) -> usize {
        match &self.kind {
            OriginKind::Ensemble { func_size, .. } => *func_size,
            OriginKind::Passthrough => self.dimensions,
        }
    }

    /// `radius / dt · D_iᵀ · spikes_i` for every sub-population, concatenated.
    ///
    /// Passthrough origins return their current output.
    pub fn decode(&self, spikes: ArrayView1<f64>, radius: f64, dt: f64) -> Array1<f64> {
        let OriginKind::Ensemble {
            decoders, func_size, ..
        } = &self.kind
        else {
            return self.decoded_output.clone();
        };

        let (array_size, neurons, _) = decoders.dim();
        let scale = radius / dt;
        let mut output = Array1::zeros(array_size * func_size);
        for i in 0..array_size {
            let block = decoders.index_axis(Axis(0), i);
            let spikes_i = spikes.slice(s![i * neurons..(i + 1) * neurons]);
            output
                .slice_mut(s![i * func_size..(i + 1) * func_size])
                .assign(&(block.t().dot(&spikes_i) * scale));
        }
        output
    }

    pub(crate) fn set_output(&mut self, value: Array1<f64>) {
        self.decoded_output = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn two_block_origin() -> Origin {
        // array_size 2, 2 neurons, func_size 1
        let decoders = Array3::from_shape_vec((2, 2, 1), vec![1.0, 2.0, -1.0, 0.5]).unwrap();
        Origin::from_solution(
            IDENTITY_ORIGIN,
            None,
            DecoderSolution {
                decoders,
                num_samples: 10,
                func_size: 1,
            },
        )
    }

    #[test]
    fn test_decode_scales_by_radius_over_dt() {
        let origin = two_block_origin();
        assert_eq!(origin.dimensions(), 2);

        let spikes = array![1.0, 0.0, 0.0, 1.0];
        let out = origin.decode(spikes.view(), 2.0, 0.5);
        // block 0: 1*1 * 4, block 1: 0.5*1 * 4
        assert_eq!(out, array![4.0, 2.0]);
    }

    #[test]
    fn test_passthrough_decode_returns_output() {
        let origin = Origin::passthrough(IDENTITY_ORIGIN, array![0.5, 0.25]);
        assert_eq!(origin.decode(array![].view(), 1.0, 0.001), array![0.5, 0.25]);
        assert!(origin.decoders().is_none());
        assert_eq!(origin.func_size(), 2);
    }
}
