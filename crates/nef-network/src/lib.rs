// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # NEF Network
//!
//! Network composition and simulation:
//!
//! - **Nodes**: [`Ensemble`]s (compiled into the fused step) and tick-driven
//!   [`Input`], [`SimpleNode`] and [`Probe`] nodes
//! - **Connections**: decoded (origin → transform → filtered input) or
//!   encoded (neuron-to-neuron weights), see [`ConnectionSpec`]
//! - **Learning**: learned terminations driven by an error origin
//! - **Scheduler**: compile-once step function, invalidated by any
//!   structural change
//!
//! ```no_run
//! use nef_network::{ConnectionSpec, Network};
//!
//! let mut net = Network::new("demo", Some(42));
//! net.make("A", 100, 1)?;
//! net.make_input("in", 0.5)?;
//! net.connect("in", "A", ConnectionSpec::new().pstc(0.01))?;
//! net.make_probe("A", None, None)?;
//! net.run(1.0)?;
//! # Ok::<(), nef_network::NetworkError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod connection;
pub mod ensemble;
pub mod errors;
pub mod filter;
pub mod input;
pub mod network;
pub mod node;
pub mod origin;
pub mod probe;
pub mod scheduler;
pub mod simple_node;
pub mod termination;
pub mod transform;

pub use connection::{ConnectionSpec, LearnSpec};
pub use ensemble::{Ensemble, EnsembleParams};
pub use errors::{NetworkError, NetworkResult};
pub use filter::{decay_factor, FilteredInput, InputSource};
pub use input::{Input, InputValue};
pub use network::{Network, NodePath, ObjectRef, ORIGIN_SEPARATOR};
pub use node::{Node, NodeIndex, NodeRegistry, OriginRef};
pub use origin::{Origin, OriginKind, IDENTITY_ORIGIN};
pub use probe::{Probe, ProbeSample};
pub use scheduler::{Scheduler, SchedulerState, StepFunction, UpdateRule};
pub use simple_node::SimpleNode;
pub use termination::LearnedTermination;
pub use transform::{compute_transform, IndexSpec};
