// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF Plasticity Module
//!
//! Learning rules for learned terminations:
//! - [`LearningRule`]: pure weight-update contract evaluated once per step
//! - [`PesRule`]: Prescribed Error Sensitivity, `ΔW = -κ·dt·(E·e) ⊗ a_pre`
//!
//! ## Architecture
//! - Rules never mutate weights; they return a delta the scheduler applies
//!   after every rule of the step has been evaluated
//! - The network projects the error through the post encoders before the
//!   rule sees it

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod pes;
pub mod rule;

pub use pes::{PesConfig, PesRule};
pub use rule::{LearningContext, LearningRule, PlasticityError, PlasticityResult};
