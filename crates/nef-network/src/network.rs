// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Network
//!
//! Owns the node registry, the decoder solver and the scheduler.
//!
//! ## Names
//! `"name"` resolves to a node, `"name:origin"` to one of its origins. Any
//! other number of `:` separators is an [`NetworkError::InvalidName`].
//!
//! ## Structural changes
//! `make*`, `add`, `connect` and `learn` validate everything before touching
//! the registry; only a successful change invalidates the compiled step
//! function.

use crate::connection::{ConnectionSpec, LearnSpec};
use crate::ensemble::{Ensemble, EnsembleParams};
use crate::errors::{NetworkError, NetworkResult};
use crate::filter::FilteredInput;
use crate::input::{Input, InputValue};
use crate::node::{Node, NodeIndex, NodeRegistry, OriginRef};
use crate::origin::{Origin, IDENTITY_ORIGIN};
use crate::probe::Probe;
use crate::scheduler::{Scheduler, SchedulerState};
use crate::simple_node::SimpleNode;
use crate::termination::LearnedTermination;
use crate::transform::compute_transform;
use ndarray::Array2;
use nef_config::{validate_config, NefConfig};
use nef_npu_decoding::{
    DecoderConfig, DecoderSolver, InMemoryDecoderCache, SharedDecoderCache, SolverStats,
};
use nef_npu_plasticity::{LearningRule, PesRule};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info};

/// Upper bound (exclusive) of seeds drawn for ensembles built without one
const MAX_DRAWN_SEED: u64 = 0x7fff_ffff;

/// Separator between a node name and an origin name
pub const ORIGIN_SEPARATOR: char = ':';

/// Result of [`Network::get_object`]
#[derive(Debug, Clone, Copy)]
pub enum ObjectRef<'a> {
    Node(&'a Node),
    Origin(&'a Origin),
}

/// A parsed `node[:origin]` path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePath<'a> {
    pub node: &'a str,
    pub origin: Option<&'a str>,
}

impl<'a> NodePath<'a> {
    pub fn parse(path: &'a str) -> NetworkResult<Self> {
        let mut parts = path.split(ORIGIN_SEPARATOR);
        let node = parts.next().unwrap_or_default();
        let origin = parts.next();
        if parts.next().is_some() || node.is_empty() || origin == Some("") {
            return Err(NetworkError::InvalidName(path.to_string()));
        }
        Ok(Self { node, origin })
    }
}

/// Where the pre side of a decoded connection reads from
enum PreOrigin {
    Existing(usize),
    Pending(Origin),
}

#[derive(Debug)]
pub struct Network {
    name: String,
    config: NefConfig,
    dt: f64,
    run_time: f64,
    rng: StdRng,
    registry: NodeRegistry,
    /// Run before the fused step, in registration order
    tick_nodes: Vec<NodeIndex>,
    scheduler: Scheduler,
    solver: DecoderSolver,
}

impl Network {
    /// Network with default configuration and a private decoder cache
    pub fn new(name: impl Into<String>, seed: Option<u64>) -> Self {
        let mut config = NefConfig::default();
        config.simulation.seed = seed;
        Self::build(name.into(), config, InMemoryDecoderCache::shared())
    }

    pub fn with_config(name: impl Into<String>, config: NefConfig) -> NetworkResult<Self> {
        Self::with_cache(name, config, InMemoryDecoderCache::shared())
    }

    /// Share `cache` with other networks (or a persistent implementation)
    pub fn with_cache(
        name: impl Into<String>,
        config: NefConfig,
        cache: SharedDecoderCache,
    ) -> NetworkResult<Self> {
        validate_config(&config)?;
        Ok(Self::build(name.into(), config, cache))
    }

    fn build(name: String, config: NefConfig, cache: SharedDecoderCache) -> Self {
        let rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let decoder_config = DecoderConfig {
            num_samples: config.decoder.num_samples,
            dt: config.simulation.dt,
            settle_steps: config.decoder.settle_steps,
            measure_steps: config.decoder.measure_steps,
        };
        info!(
            target: "nef-network",
            "[NETWORK] Created '{}' (dt={}, seed={:?})",
            name,
            config.simulation.dt,
            config.simulation.seed
        );
        Self {
            name,
            dt: config.simulation.dt,
            run_time: 0.0,
            rng,
            registry: NodeRegistry::new(),
            tick_nodes: Vec::new(),
            scheduler: Scheduler::new(),
            solver: DecoderSolver::new(cache, decoder_config),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &NefConfig {
        &self.config
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Simulated seconds credited by `run`
    pub fn run_time(&self) -> f64 {
        self.run_time
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Ensemble parameters seeded from the network's configuration
    pub fn ensemble_params(&self, neurons: usize, dimensions: usize) -> EnsembleParams {
        EnsembleParams::from_defaults(&self.config.ensemble, neurons, dimensions)
    }

    pub fn make(&mut self, name: &str, neurons: usize, dimensions: usize) -> NetworkResult<&Ensemble> {
        let params = self.ensemble_params(neurons, dimensions);
        self.make_with(name, params)
    }

    /// `array_size` independent sub-populations of `neurons` units each
    pub fn make_array(
        &mut self,
        name: &str,
        neurons: usize,
        array_size: usize,
        dimensions: usize,
    ) -> NetworkResult<&Ensemble> {
        let params = self
            .ensemble_params(neurons, dimensions)
            .with_array_size(array_size);
        self.make_with(name, params)
    }

    /// Build an ensemble and solve its identity origin `X`
    pub fn make_with(&mut self, name: &str, params: EnsembleParams) -> NetworkResult<&Ensemble> {
        self.check_new_name(name)?;
        let seed = match params.seed {
            Some(seed) => seed,
            None => self.rng.gen_range(0..MAX_DRAWN_SEED),
        };

        let mut ensemble = Ensemble::build(name, params, seed, self.solver.config())?;
        let identity = ensemble.solve_origin(IDENTITY_ORIGIN, None, None, &self.solver)?;
        ensemble.push_origin(identity);

        info!(
            target: "nef-network",
            "[NETWORK] Made ensemble '{}' ({} units, seed={})",
            name,
            ensemble.total_neurons(),
            seed
        );
        self.add(ensemble)?;
        self.ensemble(name)
    }

    pub fn make_input(&mut self, name: &str, value: impl Into<InputValue>) -> NetworkResult<NodeIndex> {
        self.add(Input::new(name, value)?)
    }

    pub fn make_simple_node<F>(
        &mut self,
        name: &str,
        input_dimensions: usize,
        func: F,
    ) -> NetworkResult<NodeIndex>
    where
        F: Fn(f64, &[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        self.add(SimpleNode::new(name, input_dimensions, func)?)
    }

    /// Register a node; tick-driven nodes join the tick list
    pub fn add(&mut self, node: impl Into<Node>) -> NetworkResult<NodeIndex> {
        let node = node.into();
        self.check_new_name(node.name())?;
        let tick_driven = node.is_tick_driven();
        let id = self.registry.insert(node)?;
        if tick_driven {
            self.tick_nodes.push(id);
        }
        self.scheduler.invalidate();
        Ok(id)
    }

    /// Record the filtered output of `target` (`node` or `node:origin`).
    ///
    /// Unnamed probes are called `Probe1`, `Probe2`, ... skipping taken names.
    pub fn make_probe(
        &mut self,
        target: &str,
        name: Option<&str>,
        sample_interval: Option<f64>,
    ) -> NetworkResult<&Probe> {
        let sample_interval = sample_interval.unwrap_or(self.config.probe.sample_interval);
        if !(sample_interval > 0.0) || !sample_interval.is_finite() {
            return Err(NetworkError::InvalidParameters(format!(
                "sample_interval must be > 0, got {}",
                sample_interval
            )));
        }
        let origin = self.resolve_origin(target)?;
        let name = match name {
            Some(name) => name.to_string(),
            None => self.next_probe_name(),
        };

        let width = self.registry.origin(origin).dimensions();
        let path = format!(
            "{}{}{}",
            self.registry.get(origin.node).name(),
            ORIGIN_SEPARATOR,
            self.registry.origin(origin).name()
        );
        let input = FilteredInput::decoded(origin, Array2::eye(width), self.config.probe.pstc);
        self.add(Probe::new(name.as_str(), path, sample_interval, input))?;
        self.probe(&name)
    }

    fn next_probe_name(&self) -> String {
        let mut counter = 1;
        loop {
            let candidate = format!("Probe{}", counter);
            if !self.registry.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn check_new_name(&self, name: &str) -> NetworkResult<()> {
        if name.is_empty() || name.contains(ORIGIN_SEPARATOR) {
            return Err(NetworkError::InvalidName(name.to_string()));
        }
        if self.registry.contains(name) {
            return Err(NetworkError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    /// Connect `pre` (node or `node:origin`) to the node `post`
    pub fn connect(&mut self, pre: &str, post: &str, spec: ConnectionSpec) -> NetworkResult<()> {
        spec.check_contract()?;
        let pre_path = NodePath::parse(pre)?;
        let post_path = NodePath::parse(post)?;
        if post_path.origin.is_some() {
            return Err(NetworkError::ContractViolation(format!(
                "post '{}' must name a node, not an origin",
                post
            )));
        }
        if pre_path.origin.is_some() && spec.func.is_some() {
            return Err(NetworkError::ContractViolation(format!(
                "pre '{}' names an origin; func cannot be applied to it",
                pre
            )));
        }

        let pre_id = self.registry.lookup(pre_path.node)?;
        let post_id = self.registry.lookup(post_path.node)?;
        let pstc = spec.pstc.unwrap_or(self.config.connection.pstc);

        let input = match &spec.encoded_weights {
            Some(weights) => {
                if pre_path.origin.is_some() {
                    return Err(NetworkError::ContractViolation(format!(
                        "encoded connection must start at a population, got '{}'",
                        pre
                    )));
                }
                self.encoded_input(pre_id, post_id, weights, pstc)?
            }
            None => {
                let (slot, pre_width) = self.select_origin(pre_id, pre_path, &spec)?;
                let post_width = self.registry.get(post_id).input_dimensions().ok_or_else(|| {
                    let node = self.registry.get(post_id);
                    NetworkError::ContractViolation(format!(
                        "'{}' is a {} and cannot receive connections",
                        node.name(),
                        node.kind()
                    ))
                })?;
                let transform = match &spec.transform {
                    Some(transform) => {
                        if transform.dim() != (post_width, pre_width) {
                            return Err(NetworkError::ShapeMismatch {
                                what: format!("transform {} -> {}", pre, post),
                                expected: (post_width, pre_width),
                                actual: transform.dim(),
                            });
                        }
                        transform.clone()
                    }
                    None => compute_transform(
                        pre_width,
                        post_width,
                        spec.weight.unwrap_or(1.0),
                        spec.index_pre.as_ref(),
                        spec.index_post.as_ref(),
                    )?,
                };

                let origin = match slot {
                    PreOrigin::Existing(index) => index,
                    PreOrigin::Pending(origin) => {
                        debug!(
                            target: "nef-network",
                            "[CONNECT] Added origin '{}' to '{}'",
                            origin.name(),
                            pre_path.node
                        );
                        self.ensemble_mut(pre_id)?.push_origin(origin)
                    }
                };
                FilteredInput::decoded(
                    OriginRef {
                        node: pre_id,
                        origin,
                    },
                    transform,
                    pstc,
                )
            }
        };

        let inputs = self.registry.get_mut(post_id).inputs_mut().ok_or_else(|| {
            NetworkError::ContractViolation(format!("'{}' cannot receive connections", post))
        })?;
        inputs.push(input);
        self.scheduler.invalidate();

        debug!(
            target: "nef-network",
            "[CONNECT] {} -> {} (pstc={})",
            pre,
            post,
            pstc
        );
        Ok(())
    }

    fn encoded_input(
        &self,
        pre_id: NodeIndex,
        post_id: NodeIndex,
        weights: &Array2<f64>,
        pstc: f64,
    ) -> NetworkResult<FilteredInput> {
        let pre = self.registry.get(pre_id);
        let pre_ensemble = pre.as_ensemble().ok_or_else(|| {
            NetworkError::ContractViolation(format!(
                "encoded connection from '{}': a {} has no spike output",
                pre.name(),
                pre.kind()
            ))
        })?;
        let post = self.registry.get(post_id);
        let post_ensemble = post.as_ensemble().ok_or_else(|| {
            NetworkError::ContractViolation(format!(
                "encoded connection into '{}': a {} has no neurons",
                post.name(),
                post.kind()
            ))
        })?;

        let expected = (post_ensemble.total_neurons(), pre_ensemble.total_neurons());
        if weights.dim() != expected {
            return Err(NetworkError::ShapeMismatch {
                what: format!("encoded weights {} -> {}", pre.name(), post.name()),
                expected,
                actual: weights.dim(),
            });
        }
        Ok(FilteredInput::encoded(pre_id, weights.clone(), pstc))
    }

    /// Explicit origin, a (memoised) function origin, or `X`
    fn select_origin(
        &self,
        pre_id: NodeIndex,
        path: NodePath<'_>,
        spec: &ConnectionSpec,
    ) -> NetworkResult<(PreOrigin, usize)> {
        let node = self.registry.get(pre_id);
        if let Some(origin_name) = path.origin {
            let index = node.origin_index(origin_name).ok_or_else(|| {
                NetworkError::UnknownName(format!("{}{}{}", path.node, ORIGIN_SEPARATOR, origin_name))
            })?;
            return Ok((PreOrigin::Existing(index), node.origins()[index].dimensions()));
        }

        if let Some(func) = &spec.func {
            let ensemble = node.as_ensemble().ok_or_else(|| {
                NetworkError::ContractViolation(format!(
                    "'{}' is a {}; only ensembles decode functions",
                    node.name(),
                    node.kind()
                ))
            })?;
            if let Some(index) = ensemble.origin_index(func.name()) {
                return Ok((PreOrigin::Existing(index), node.origins()[index].dimensions()));
            }
            let origin = ensemble.solve_origin(
                func.name(),
                Some(func.clone()),
                spec.eval_points.as_ref(),
                &self.solver,
            )?;
            let width = origin.dimensions();
            return Ok((PreOrigin::Pending(origin), width));
        }

        let index = node.origin_index(IDENTITY_ORIGIN).ok_or_else(|| {
            NetworkError::ContractViolation(format!(
                "'{}' is a {} and has no output",
                node.name(),
                node.kind()
            ))
        })?;
        Ok((PreOrigin::Existing(index), node.origins()[index].dimensions()))
    }

    /// Attach a learned termination from `pre` onto `post`, driven by the
    /// `error` origin
    pub fn learn(&mut self, pre: &str, post: &str, error: &str, spec: LearnSpec) -> NetworkResult<()> {
        for path in [pre, post] {
            if NodePath::parse(path)?.origin.is_some() {
                return Err(NetworkError::ContractViolation(format!(
                    "learned terminations connect populations, got '{}'",
                    path
                )));
            }
        }
        let pre_id = self.registry.lookup(pre)?;
        let post_id = self.registry.lookup(post)?;
        let error_ref = self.resolve_origin(error)?;

        let pre_neurons = self.ensemble_at(pre_id)?.total_neurons();
        let post_ensemble = self.ensemble_at(post_id)?;
        let post_neurons = post_ensemble.total_neurons();

        let error_width = self.registry.origin(error_ref).dimensions();
        if error_width != post_ensemble.represented_width() {
            return Err(NetworkError::vector_width(
                format!("error '{}' for '{}'", error, post),
                post_ensemble.represented_width(),
                error_width,
            ));
        }

        let weights = match spec.weights {
            Some(weights) => {
                if weights.dim() != (post_neurons, pre_neurons) {
                    return Err(NetworkError::ShapeMismatch {
                        what: format!("learned weights {} -> {}", pre, post),
                        expected: (post_neurons, pre_neurons),
                        actual: weights.dim(),
                    });
                }
                weights
            }
            None => Array2::zeros((post_neurons, pre_neurons)),
        };
        let rule: Arc<dyn LearningRule> = match spec.rule {
            Some(rule) => rule,
            None => Arc::new(PesRule::new(self.config.plasticity.learning_rate)?),
        };
        let pstc = spec.pstc.unwrap_or(self.config.plasticity.pstc);

        info!(
            target: "nef-network",
            "[LEARN] {} -> {} ({}, error={}, pstc={})",
            pre,
            post,
            rule.name(),
            error,
            pstc
        );
        let termination = LearnedTermination::new(pre_id, error_ref, pstc, weights, rule);
        self.ensemble_mut(post_id)?.learned_mut().push(termination);
        self.scheduler.invalidate();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// `"name"` → node, `"name:origin"` → origin
    pub fn get_object(&self, path: &str) -> NetworkResult<ObjectRef<'_>> {
        let parsed = NodePath::parse(path)?;
        let id = self.registry.lookup(parsed.node)?;
        match parsed.origin {
            None => Ok(ObjectRef::Node(self.registry.get(id))),
            Some(_) => Ok(ObjectRef::Origin(self.registry.origin(self.resolve_origin(path)?))),
        }
    }

    /// Origin named by `path`; a bare node name means its `X` origin
    pub fn resolve_origin(&self, path: &str) -> NetworkResult<OriginRef> {
        let parsed = NodePath::parse(path)?;
        let node = self.registry.lookup(parsed.node)?;
        let origin_name = parsed.origin.unwrap_or(IDENTITY_ORIGIN);
        let origin = self
            .registry
            .get(node)
            .origin_index(origin_name)
            .ok_or_else(|| {
                NetworkError::UnknownName(format!("{}{}{}", parsed.node, ORIGIN_SEPARATOR, origin_name))
            })?;
        Ok(OriginRef { node, origin })
    }

    pub fn node(&self, name: &str) -> NetworkResult<&Node> {
        Ok(self.registry.get(self.registry.lookup(name)?))
    }

    pub fn ensemble(&self, name: &str) -> NetworkResult<&Ensemble> {
        self.ensemble_at(self.registry.lookup(name)?)
    }

    pub fn origin(&self, path: &str) -> NetworkResult<&Origin> {
        Ok(self.registry.origin(self.resolve_origin(path)?))
    }

    pub fn probe(&self, name: &str) -> NetworkResult<&Probe> {
        let node = self.node(name)?;
        node.as_probe().ok_or_else(|| {
            NetworkError::ContractViolation(format!("'{}' is a {}, not a probe", name, node.kind()))
        })
    }

    pub fn probes(&self) -> impl Iterator<Item = &Probe> {
        self.registry.iter().filter_map(|(_, node)| node.as_probe())
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Names of tick-driven nodes, in execution order
    pub fn tick_node_names(&self) -> Vec<&str> {
        self.tick_nodes
            .iter()
            .map(|&id| self.registry.get(id).name())
            .collect()
    }

    fn ensemble_at(&self, id: NodeIndex) -> NetworkResult<&Ensemble> {
        let node = self.registry.get(id);
        node.as_ensemble().ok_or_else(|| {
            NetworkError::ContractViolation(format!(
                "'{}' is a {}, not an ensemble",
                node.name(),
                node.kind()
            ))
        })
    }

    fn ensemble_mut(&mut self, id: NodeIndex) -> NetworkResult<&mut Ensemble> {
        self.registry.get_mut(id).as_ensemble_mut().ok_or_else(|| {
            NetworkError::ContractViolation(format!("node {} is not an ensemble", id.index()))
        })
    }

    // ------------------------------------------------------------------
    // Scheduler / introspection
    // ------------------------------------------------------------------

    pub fn scheduler_state(&self) -> &SchedulerState {
        self.scheduler.state()
    }

    pub fn is_compiled(&self) -> bool {
        self.scheduler.is_compiled()
    }

    /// Number of step-function builds so far
    pub fn compile_count(&self) -> u64 {
        self.scheduler.compile_count()
    }

    pub fn decoder_cache(&self) -> &SharedDecoderCache {
        self.solver.cache()
    }

    pub fn solver_stats(&self) -> SolverStats {
        self.solver.stats()
    }

    /// Advance the simulation by `time` seconds.
    ///
    /// Runs `floor(time / dt)` steps; each step ticks every tick-driven node
    /// at `run_time + step * dt`, then applies the fused update once.
    /// `run_time` advances by exactly `time`, so any remainder shorter than
    /// `dt` is credited without being simulated.
    pub fn run(&mut self, time: f64) -> NetworkResult<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(NetworkError::InvalidParameters(format!(
                "run time must be finite and >= 0, got {}",
                time
            )));
        }
        let steps = (time / self.dt) as usize;
        self.scheduler.ensure_compiled(&self.registry, self.dt);

        for step in 0..steps {
            let t = self.run_time + step as f64 * self.dt;
            for &id in &self.tick_nodes {
                self.registry.get_mut(id).tick(t)?;
            }
            self.scheduler.step(&mut self.registry, self.dt)?;
        }

        self.run_time += time;
        debug!(
            target: "nef-network",
            "[RUN] '{}': {} steps, run_time={:.6}",
            self.name,
            steps,
            self.run_time
        );
        Ok(())
    }
}
