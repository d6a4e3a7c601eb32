// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural Types Module

pub mod error;

pub use error::{NeuralError, NeuralResult};
