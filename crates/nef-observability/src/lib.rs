// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nef-observability
//!
//! Logging infrastructure shared by the NEF crates, with per-crate debug flag
//! support.
//!
//! ## Features
//! - `file-logging`: daily-rotated log files next to console output

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known NEF log targets for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "nef-config",
    "nef-neural",
    "nef-decoding",
    "nef-plasticity",
    "nef-network",
    "nef-scheduler",
    "nef",
];
