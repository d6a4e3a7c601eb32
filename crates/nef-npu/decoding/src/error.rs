// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for decoder computation

use nef_npu_neural::NeuralError;

/// Result type for decoder operations
pub type DecoderResult<T> = Result<T, DecoderError>;

/// Errors that can occur while solving for decoders
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error(
        "Evaluation points must be of the form [dimensions x num_samples]: \
         expected {expected} rows, got {actual}"
    )]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Target function '{name}' returned {actual} values at sample {sample}, expected {expected}")]
    FunctionOutput {
        name: String,
        expected: usize,
        actual: usize,
        sample: usize,
    },

    #[error("Invalid decoder parameters: {0}")]
    InvalidParameters(String),

    #[error(transparent)]
    Neural(#[from] NeuralError),
}
