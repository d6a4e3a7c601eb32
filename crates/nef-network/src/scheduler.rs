// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Simulation Scheduler
//!
//! Compiles every node's update rules into one [`StepFunction`] and applies
//! it atomically once per timestep.
//!
//! ## Lifecycle
//! `Stale` → (`ensure_compiled`) → `Compiled` → (`invalidate`) → `Stale`.
//! The step function is rebuilt only after a structural change.
//!
//! ## Step semantics
//! 1. **Evaluate**: every rule reads the registry as it was at the start of
//!    the step and produces a [`StateUpdate`]. Rules are independent, so
//!    evaluation runs in parallel (rayon).
//! 2. **Apply**: updates are written back in rule order. No rule ever
//!    observes another rule's same-step result.

use crate::ensemble::{Ensemble, PopulationUpdate};
use crate::errors::{NetworkError, NetworkResult};
use crate::filter::{decay_factor, InputSource};
use crate::node::{NodeIndex, NodeRegistry};
use ndarray::{Array1, Array2};
use nef_npu_plasticity::LearningContext;
use rayon::prelude::*;
use tracing::{debug, trace};

/// One pure state-update rule `(state, inputs) -> next state`
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateRule {
    /// Low-pass filter of a node's input
    Filter {
        node: NodeIndex,
        input: usize,
        decay: f64,
    },
    /// Neuron dynamics and origin decoding of an ensemble
    Population { node: NodeIndex },
    /// Filtered pre activity and weight change of a learned termination
    Learning {
        node: NodeIndex,
        termination: usize,
        decay: f64,
    },
}

/// Result of evaluating one [`UpdateRule`]
#[derive(Debug)]
pub enum StateUpdate {
    Filter {
        node: NodeIndex,
        input: usize,
        value: Array1<f64>,
    },
    Population {
        node: NodeIndex,
        update: Box<PopulationUpdate>,
    },
    Learning {
        node: NodeIndex,
        termination: usize,
        activity: Array1<f64>,
        delta: Array2<f64>,
    },
}

/// The fused per-step update
#[derive(Debug, Clone)]
pub struct StepFunction {
    rules: Vec<UpdateRule>,
    dt: f64,
}

impl StepFunction {
    /// Gather every node's rules in registration order
    pub fn compile(registry: &NodeRegistry, dt: f64) -> Self {
        let mut rules = Vec::new();
        for (id, node) in registry.iter() {
            for (input, filtered) in node.inputs().iter().enumerate() {
                rules.push(UpdateRule::Filter {
                    node: id,
                    input,
                    decay: decay_factor(filtered.pstc(), dt),
                });
            }
            if let Some(ensemble) = node.as_ensemble() {
                rules.push(UpdateRule::Population { node: id });
                for (termination, learned) in ensemble.learned_terminations().iter().enumerate() {
                    rules.push(UpdateRule::Learning {
                        node: id,
                        termination,
                        decay: decay_factor(learned.pstc(), dt),
                    });
                }
            }
        }
        Self { rules, dt }
    }

    pub fn rules(&self) -> &[UpdateRule] {
        &self.rules
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Advance every compiled component by one `dt`.
    ///
    /// Nothing is written unless every rule evaluates successfully.
    pub fn execute(&self, registry: &mut NodeRegistry) -> NetworkResult<()> {
        let updates = {
            let snapshot: &NodeRegistry = registry;
            self.rules
                .par_iter()
                .map(|rule| evaluate(rule, snapshot, self.dt))
                .collect::<NetworkResult<Vec<_>>>()?
        };

        for update in updates {
            apply(update, registry)?;
        }
        Ok(())
    }
}

fn evaluate(rule: &UpdateRule, registry: &NodeRegistry, dt: f64) -> NetworkResult<StateUpdate> {
    match *rule {
        UpdateRule::Filter { node, input, decay } => {
            let filtered = &registry.get(node).inputs()[input];
            let target = match filtered.source() {
                InputSource::Decoded { origin, transform } => {
                    transform.dot(registry.origin(*origin).decoded_output())
                }
                InputSource::Encoded { pre, weights } => {
                    let spikes = spiking_output(registry, *pre)?;
                    weights.dot(spikes) / dt
                }
            };
            Ok(StateUpdate::Filter {
                node,
                input,
                value: filtered.filtered(decay, &target),
            })
        }
        UpdateRule::Population { node } => {
            let ensemble = registry
                .get(node)
                .as_ensemble()
                .ok_or_else(|| not_an_ensemble(registry, node))?;
            Ok(StateUpdate::Population {
                node,
                update: Box::new(ensemble.compute_step(dt)),
            })
        }
        UpdateRule::Learning {
            node,
            termination,
            decay,
        } => {
            let ensemble = registry
                .get(node)
                .as_ensemble()
                .ok_or_else(|| not_an_ensemble(registry, node))?;
            let learned = &ensemble.learned_terminations()[termination];

            let rates = spiking_output(registry, learned.pre())? / dt;
            let activity = learned.activity() * decay + rates * (1.0 - decay);
            let error = registry.origin(learned.error()).decoded_output();
            let projection = ensemble.project_error(error.view())?;

            let ctx = LearningContext {
                weights: learned.weights().view(),
                pre_activity: learned.activity().view(),
                error_projection: projection.view(),
                dt,
            };
            ctx.validate()?;
            let delta = learned.rule().weight_delta(&ctx)?;
            Ok(StateUpdate::Learning {
                node,
                termination,
                activity,
                delta,
            })
        }
    }
}

fn apply(update: StateUpdate, registry: &mut NodeRegistry) -> NetworkResult<()> {
    match update {
        StateUpdate::Filter { node, input, value } => {
            let inputs = registry.get_mut(node).inputs_mut().ok_or_else(|| {
                NetworkError::ContractViolation(format!("node {} has no inputs", node.index()))
            })?;
            inputs[input].set_value(value);
        }
        StateUpdate::Population { node, update } => {
            let ensemble = ensemble_mut(registry, node)?;
            ensemble.apply_step(*update);
        }
        StateUpdate::Learning {
            node,
            termination,
            activity,
            delta,
        } => {
            let ensemble = ensemble_mut(registry, node)?;
            ensemble.learned_mut()[termination].apply(activity, &delta);
        }
    }
    Ok(())
}

fn spiking_output(registry: &NodeRegistry, node: NodeIndex) -> NetworkResult<&Array1<f64>> {
    registry
        .get(node)
        .as_ensemble()
        .map(|ensemble| ensemble.spikes())
        .ok_or_else(|| not_an_ensemble(registry, node))
}

fn ensemble_mut(registry: &mut NodeRegistry, node: NodeIndex) -> NetworkResult<&mut Ensemble> {
    registry.get_mut(node).as_ensemble_mut().ok_or_else(|| {
        NetworkError::ContractViolation(format!("node {} is not an ensemble", node.index()))
    })
}

fn not_an_ensemble(registry: &NodeRegistry, node: NodeIndex) -> NetworkError {
    let node = registry.get(node);
    NetworkError::ContractViolation(format!(
        "'{}' is a {}, not a spiking ensemble",
        node.name(),
        node.kind()
    ))
}

/// Compiled-or-not state of the scheduler
#[derive(Debug, Clone, Default)]
pub enum SchedulerState {
    /// Structure changed since the last compile
    #[default]
    Stale,
    Compiled(StepFunction),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    state: SchedulerState,
    compile_count: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self.state, SchedulerState::Compiled(_))
    }

    /// Number of times a step function has been built
    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }

    /// Drop the compiled step function; the next run rebuilds it
    pub fn invalidate(&mut self) {
        if self.is_compiled() {
            trace!(target: "nef-scheduler", "[SCHEDULER] Step function invalidated");
        }
        self.state = SchedulerState::Stale;
    }

    /// Build the step function if the structure changed (or `dt` did)
    pub fn ensure_compiled(&mut self, registry: &NodeRegistry, dt: f64) {
        let step = self.take_compiled(registry, dt);
        self.state = SchedulerState::Compiled(step);
    }

    /// Compile if needed, then advance one step
    pub fn step(&mut self, registry: &mut NodeRegistry, dt: f64) -> NetworkResult<()> {
        let step = self.take_compiled(registry, dt);
        let result = step.execute(registry);
        self.state = SchedulerState::Compiled(step);
        result
    }

    fn take_compiled(&mut self, registry: &NodeRegistry, dt: f64) -> StepFunction {
        match std::mem::take(&mut self.state) {
            SchedulerState::Compiled(step) if step.dt() == dt => step,
            _ => {
                let step = StepFunction::compile(registry, dt);
                self.compile_count += 1;
                debug!(
                    target: "nef-scheduler",
                    "[SCHEDULER] Compiled step function #{}: {} rules over {} nodes",
                    self.compile_count,
                    step.rules().len(),
                    registry.len()
                );
                step
            }
        }
    }
}
