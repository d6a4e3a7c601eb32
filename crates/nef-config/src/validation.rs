// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Collects every inconsistency in one pass so a bad file is fixed in one
//! edit rather than one error at a time.

use crate::{ConfigError, ConfigResult, NefConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    NonPositive { field: String, value: f64 },
    InvalidRange { field: String, low: f64, high: f64 },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "{} must be positive, got {}", field, value)
            }
            Self::InvalidRange { field, low, high } => {
                write!(f, "{} = [{}, {}] is not a valid [low, high] range", field, low, high)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &NefConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_ensemble(config, &mut errors);
    validate_decoder(config, &mut errors);
    validate_filters(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn require_positive(field: &str, value: f64, errors: &mut Vec<ConfigValidationError>) {
    if !(value > 0.0) || !value.is_finite() {
        errors.push(ConfigValidationError::NonPositive {
            field: field.to_string(),
            value,
        });
    }
}

fn require_range(field: &str, range: [f64; 2], errors: &mut Vec<ConfigValidationError>) {
    let [low, high] = range;
    if !low.is_finite() || !high.is_finite() || low > high {
        errors.push(ConfigValidationError::InvalidRange {
            field: field.to_string(),
            low,
            high,
        });
    }
}

fn validate_simulation(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    require_positive("simulation.dt", config.simulation.dt, errors);
}

fn validate_ensemble(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    let ensemble = &config.ensemble;
    require_positive("ensemble.tau_rc", ensemble.tau_rc, errors);
    require_positive("ensemble.radius", ensemble.radius, errors);
    require_range("ensemble.max_rate", ensemble.max_rate, errors);
    require_range("ensemble.intercept", ensemble.intercept, errors);

    if !(ensemble.tau_ref >= 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ensemble.tau_ref".to_string(),
            reason: format!("must be >= 0, got {}", ensemble.tau_ref),
        });
    }
    if ensemble.max_rate[0] <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ensemble.max_rate".to_string(),
            reason: "rates must be positive".to_string(),
        });
    } else if ensemble.tau_ref >= 1.0 / ensemble.max_rate[1] {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ensemble.max_rate".to_string(),
            reason: format!(
                "{} Hz is unreachable with tau_ref = {}",
                ensemble.max_rate[1], ensemble.tau_ref
            ),
        });
    }
    if ensemble.intercept[0] < -1.0 || ensemble.intercept[1] > 1.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ensemble.intercept".to_string(),
            reason: "intercepts must lie within [-1, 1]".to_string(),
        });
    }
    if ensemble.noise < 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ensemble.noise".to_string(),
            reason: format!("must be >= 0, got {}", ensemble.noise),
        });
    }
    if !(0.0..=1.0).contains(&ensemble.decoder_noise) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ensemble.decoder_noise".to_string(),
            reason: format!("must be between 0.0 and 1.0, got {}", ensemble.decoder_noise),
        });
    }
}

fn validate_decoder(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.decoder.num_samples == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "decoder.num_samples".to_string(),
            reason: "at least one evaluation point is required".to_string(),
        });
    }
    if config.decoder.measure_steps == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "decoder.measure_steps".to_string(),
            reason: "rate measurement window cannot be empty".to_string(),
        });
    }
}

fn validate_filters(config: &NefConfig, errors: &mut Vec<ConfigValidationError>) {
    for (field, value) in [
        ("connection.pstc", config.connection.pstc),
        ("probe.pstc", config.probe.pstc),
        ("plasticity.pstc", config.plasticity.pstc),
    ] {
        if !(value >= 0.0) {
            errors.push(ConfigValidationError::InvalidValue {
                field: field.to_string(),
                reason: format!("must be >= 0, got {}", value),
            });
        }
    }
    require_positive("probe.sample_interval", config.probe.sample_interval, errors);
    if !(config.plasticity.learning_rate >= 0.0) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "plasticity.learning_rate".to_string(),
            reason: format!("must be >= 0, got {}", config.plasticity.learning_rate),
        });
    }
}
