// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for neuron-model operations

/// Errors raised while building or driving a neuron model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("Invalid neuron parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown neuron model: {0}")]
    UnknownModel(String),

    #[error("Array size mismatch: expected {expected}, got {actual}")]
    ArraySizeMismatch { expected: usize, actual: usize },
}

pub type NeuralResult<T> = Result<T, NeuralError>;
