// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NefConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "nef_configuration.toml";

/// Find the NEF configuration file
///
/// Search order:
/// 1. `NEF_CONFIG_PATH` environment variable
/// 2. Current working directory: `./nef_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEF_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by NEF_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "NEF configuration file '{}' not found in any of these locations:\n{}\n\nSet NEF_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NefConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NefConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEF_DT` -> `simulation.dt`
/// - `NEF_SEED` -> `simulation.seed`
/// - `NEF_NUM_SAMPLES` -> `decoder.num_samples`
/// - `NEF_DECODER_NOISE` -> `ensemble.decoder_noise`
/// - `NEF_LOG_LEVEL` -> `logging.level`
///
/// Unparseable values are ignored.
pub fn apply_environment_overrides(config: &mut NefConfig) {
    if let Some(dt) = env::var("NEF_DT").ok().and_then(|v| v.parse().ok()) {
        config.simulation.dt = dt;
    }
    if let Some(seed) = env::var("NEF_SEED").ok().and_then(|v| v.parse().ok()) {
        config.simulation.seed = Some(seed);
    }
    if let Some(samples) = env::var("NEF_NUM_SAMPLES").ok().and_then(|v| v.parse().ok()) {
        config.decoder.num_samples = samples;
    }
    if let Some(noise) = env::var("NEF_DECODER_NOISE").ok().and_then(|v| v.parse().ok()) {
        config.ensemble.decoder_noise = noise;
    }
    if let Ok(value) = env::var("NEF_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"dt": "0.0005", "seed": "7"}`)
pub fn apply_cli_overrides(config: &mut NefConfig, cli_args: &HashMap<String, String>) {
    if let Some(dt) = cli_args.get("dt").and_then(|v| v.parse().ok()) {
        config.simulation.dt = dt;
    }
    if let Some(seed) = cli_args.get("seed").and_then(|v| v.parse().ok()) {
        config.simulation.seed = Some(seed);
    }
    if let Some(samples) = cli_args.get("num_samples").and_then(|v| v.parse().ok()) {
        config.decoder.num_samples = samples;
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
