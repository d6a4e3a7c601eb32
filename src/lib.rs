// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NEF - Neural Engineering Framework
//!
//! Populations of spiking neurons ("ensembles") that represent real-valued
//! vectors, connected into networks that compute functions of those vectors,
//! simulated over fixed timesteps.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nef::prelude::*;
//!
//! let mut net = Network::new("channel", Some(7));
//! net.make("A", 100, 1)?;
//! net.make("B", 100, 1)?;
//! net.make_input("in", 0.5)?;
//! net.connect("in", "A", ConnectionSpec::new().pstc(0.01))?;
//! net.connect(
//!     "A",
//!     "B",
//!     ConnectionSpec::new().func(TargetFunction::scalar("square", |x| x[0] * x[0])),
//! )?;
//! net.make_probe("B", None, None)?;
//! net.run(1.0)?;
//! # Ok::<(), NetworkError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: nef-config, nef-observability              │
//! │  (TOML configuration, tracing initialisation)           │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  NPU: nef-npu-neural, nef-npu-decoding,                 │
//! │       nef-npu-plasticity                                │
//! │  (neuron models, decoder solver + cache, learning rules)│
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Network: nef-network                                   │
//! │  (nodes, connections, simulation scheduler)             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use nef_config as config;
pub use nef_observability as observability;

// Re-export NPU
pub use nef_npu_decoding as decoding;
pub use nef_npu_neural as neural;
pub use nef_npu_plasticity as plasticity;

// Re-export network layer
pub use nef_network as network;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, NefConfig};
    pub use crate::decoding::{
        DecoderCache, DecoderSolver, InMemoryDecoderCache, SharedDecoderCache, TargetFunction,
    };
    pub use crate::network::{
        ConnectionSpec, Ensemble, EnsembleParams, IndexSpec, InputValue, LearnSpec, Network,
        NetworkError, NetworkResult, ObjectRef, Probe, SchedulerState,
    };
    pub use crate::neural::{NeuronKind, NeuronModel, RateMode};
    pub use crate::plasticity::{LearningRule, PesRule};
}
