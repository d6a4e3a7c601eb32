// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network error types

use nef_config::ConfigError;
use nef_npu_decoding::DecoderError;
use nef_npu_neural::NeuralError;
use nef_npu_plasticity::PlasticityError;

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Mutually exclusive parameters, or a wiring the node kinds cannot support
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Unknown name: '{0}'")]
    UnknownName(String),

    /// Not of the form `node` or `node:origin`
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Duplicate node name: '{0}'")]
    DuplicateName(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Decoder(#[from] DecoderError),

    #[error(transparent)]
    Neural(#[from] NeuralError),

    #[error(transparent)]
    Plasticity(#[from] PlasticityError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl NetworkError {
    pub(crate) fn vector_width(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        NetworkError::ShapeMismatch {
            what: what.into(),
            expected: (expected, 1),
            actual: (actual, 1),
        }
    }
}
