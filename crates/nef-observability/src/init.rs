// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature and a `log_dir`,
//! a daily-rotated JSON file (`nef.log`) as well.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingSettings};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Filter from `RUST_LOG` if set, otherwise from the debug flags
pub fn build_filter(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = debug_flags.to_filter_string(default_level);
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter: {}", directives))
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the filter is invalid, the log directory cannot be created, or a
/// global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, settings: &LoggingSettings) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false);
    let console: BoxedLayer = match settings.format {
        LogFormat::Text => console
            .with_filter(build_filter(debug_flags, &settings.level)?)
            .boxed(),
        LogFormat::Json => console
            .json()
            .with_filter(build_filter(debug_flags, &settings.level)?)
            .boxed(),
    };
    layers.push(console);

    #[cfg(feature = "file-logging")]
    let mut file_guards = Vec::new();

    if let Some(dir) = &settings.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        #[cfg(feature = "file-logging")]
        {
            let appender = tracing_appender::rolling::daily(dir, "nef.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json()
                    .with_filter(build_filter(debug_flags, &settings.level)?)
                    .boxed(),
            );
        }
    }

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        log_dir: settings.log_dir.clone(),
    })
}

/// Initialize console logging at `info`
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_flags() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-nef-network".to_string()]);
        assert!(build_filter(&flags, "warn").is_ok());
    }

    #[test]
    fn test_invalid_default_level_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let flags = CrateDebugFlags::default();
        assert!(build_filter(&flags, "nef-network=loud").is_err());
    }

    #[test]
    fn test_second_init_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LoggingSettings {
            log_dir: Some(dir.path().join("logs")),
            ..LoggingSettings::default()
        };
        let flags = CrateDebugFlags::default();

        let first = init_logging(&flags, &settings);
        assert!(first.is_ok());
        assert!(dir.path().join("logs").exists());
        assert!(init_logging(&flags, &settings).is_err());
    }
}
