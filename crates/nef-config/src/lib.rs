// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEF Configuration System
//!
//! Settings for the simulation clock, ensemble defaults, the decoder solver,
//! connections, probes and learning. Values are layered in three tiers:
//! `nef_configuration.toml`, then `NEF_*` environment variables, then CLI
//! overrides. [`validate_config`] checks the result as a whole.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nef_config::load_config;
//!
//! let config = load_config(None, None)?;
//! nef_config::validate_config(&config)?;
//!
//! println!("dt: {}", config.simulation.dt);
//! println!("samples: {}", config.decoder.num_samples);
//! # Ok::<(), nef_config::ConfigError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Errors from locating, parsing or validating a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("NEF configuration not found: {0}")]
    FileNotFound(String),

    #[error("Could not read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration is not valid TOML: {0}")]
    ParseError(String),

    #[error("Configuration rejected: {0}")]
    ValidationError(String),

    #[error("Bad configuration value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
