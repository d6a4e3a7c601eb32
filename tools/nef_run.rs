// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runs a communication channel with a squaring stage and prints what the
//! probes recorded.
//!
//! ```text
//! in (0.5) → A ──X──→ B ──square──→ C
//! ```

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use nef::config::ConfigError;
use nef::observability::{debug_flags_help, init_logging, parse_debug_flags, LoggingSettings};
use nef::prelude::*;
use tracing::{info, warn};

struct Args {
    config: Option<PathBuf>,
    time: f64,
    input: f64,
    neurons: usize,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: nef_run [--config <path>] [--time <seconds>] [--input <value>] [--neurons <n>]\n\n\
         Defaults:\n\
         - config: searched for nef_configuration.toml, built-in defaults if absent\n\
         - time: 1.0\n\
         - input: 0.5\n\
         - neurons: 100\n\n{}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> Args {
    let mut parsed = Args {
        config: None,
        time: 1.0,
        input: 0.5,
        neurons: 100,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config = Some(PathBuf::from(v));
            }
            "--time" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.time = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "--input" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.input = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "--neurons" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.neurons = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "-h" | "--help" => usage_and_exit(),
            // handled by parse_debug_flags
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

fn load(args: &Args) -> Result<NefConfig> {
    match load_config(args.config.as_deref(), None) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => Ok(NefConfig::default()),
        Err(err) => Err(err).context("loading NEF configuration"),
    }
}

fn build(config: NefConfig, args: &Args) -> Result<Network> {
    let mut net = Network::with_config("nef_run", config)?;
    net.make("A", args.neurons, 1)?;
    net.make("B", args.neurons, 1)?;
    net.make("C", args.neurons, 1)?;
    net.make_input("in", args.input)?;

    net.connect("in", "A", ConnectionSpec::new())?;
    net.connect("A", "B", ConnectionSpec::new())?;
    net.connect(
        "B",
        "C",
        ConnectionSpec::new().func(TargetFunction::scalar("square", |x| x[0] * x[0])),
    )?;

    for target in ["A", "B", "C"] {
        net.make_probe(target, Some(&format!("probe_{target}")), None)?;
    }
    Ok(net)
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = load(&args)?;

    let flags = parse_debug_flags();
    let _guard = init_logging(&flags, &LoggingSettings::with_level(config.logging.level.clone()))?;

    if args.input.abs() > config.ensemble.radius {
        warn!(
            target: "nef",
            "input {} lies outside the ensemble radius {}",
            args.input,
            config.ensemble.radius
        );
    }

    let mut net = build(config, &args)?;
    info!(
        target: "nef",
        "[RUN] simulating {}s over {} nodes",
        args.time,
        net.nodes().len()
    );
    net.run(args.time)?;

    let stats = net.solver_stats();
    info!(
        target: "nef",
        "[RUN] done at t={:.3}s ({} decoder solves, {} cache hits, {} compiles)",
        net.run_time(),
        stats.solves,
        stats.cache_hits,
        net.compile_count()
    );

    println!("expected: A={:.3} B={:.3} C={:.3}", args.input, args.input, args.input * args.input);
    for probe in net.probes() {
        match probe.latest() {
            Some(sample) => println!(
                "{:>8} t={:.3}s value={:.3?}",
                probe.name(),
                sample.time,
                sample.value.as_slice().unwrap_or_default()
            ),
            None => println!("{:>8} (no samples)", probe.name()),
        }
    }
    Ok(())
}
