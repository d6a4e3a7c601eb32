// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Network composition, wiring contracts and scheduler behaviour

use ndarray::{array, Array2};
use nef_config::NefConfig;
use nef_network::{
    ConnectionSpec, LearnSpec, Network, NetworkError, ObjectRef, SchedulerState, UpdateRule,
};
use nef_npu_decoding::TargetFunction;
use nef_npu_neural::NeuronKind;

fn rate_network() -> Network {
    let mut config = NefConfig::default();
    config.simulation.seed = Some(1234);
    config.ensemble.neuron_model = NeuronKind::LifRate;
    config.decoder.num_samples = 200;
    Network::with_config("test", config).unwrap()
}

fn square() -> TargetFunction {
    TargetFunction::scalar("square", |x| x[0] * x[0])
}

#[test]
fn test_make_solves_identity_origin() {
    let mut net = rate_network();
    let ensemble = net.make("A", 40, 1).unwrap();
    assert_eq!(ensemble.total_neurons(), 40);
    assert_eq!(ensemble.origins().len(), 1);
    assert_eq!(ensemble.origins()[0].name(), "X");
    assert_eq!(ensemble.origins()[0].decoders().unwrap().dim(), (1, 40, 1));
    assert_eq!(net.solver_stats().activity_computations, 1);
}

#[test]
fn test_make_array_decodes_every_sub_population() {
    let mut net = rate_network();
    let ensemble = net.make_array("A", 20, 3, 2).unwrap();
    assert_eq!(ensemble.total_neurons(), 60);
    assert_eq!(ensemble.represented_width(), 6);
    assert_eq!(ensemble.origins()[0].decoders().unwrap().dim(), (3, 20, 2));
    assert_eq!(ensemble.origins()[0].dimensions(), 6);
    assert_eq!(net.solver_stats().activity_computations, 3);
}

#[test]
fn test_unseeded_ensembles_draw_seeds_from_the_network() {
    let mut first = rate_network();
    let mut second = rate_network();
    let a = first.make("A", 20, 1).unwrap().all_encoders().clone();
    let b = second.make("A", 20, 1).unwrap().all_encoders().clone();
    assert_eq!(a, b);
}

#[test]
fn test_duplicate_name_is_rejected() {
    let mut net = rate_network();
    net.make("A", 10, 1).unwrap();
    assert!(matches!(
        net.make("A", 10, 1),
        Err(NetworkError::DuplicateName(_))
    ));
    assert!(matches!(
        net.make_input("A", 1.0),
        Err(NetworkError::DuplicateName(_))
    ));
}

#[test]
fn test_get_object_resolution() {
    let mut net = rate_network();
    net.make("A", 10, 1).unwrap();

    match net.get_object("A:X").unwrap() {
        ObjectRef::Origin(origin) => assert_eq!(origin.name(), "X"),
        other => panic!("expected origin, got {:?}", other),
    }
    match net.get_object("A").unwrap() {
        ObjectRef::Node(node) => assert_eq!(node.name(), "A"),
        other => panic!("expected node, got {:?}", other),
    }
    assert!(matches!(
        net.get_object("A:B:C"),
        Err(NetworkError::InvalidName(_))
    ));
    assert!(matches!(
        net.get_object("missing"),
        Err(NetworkError::UnknownName(_))
    ));
    assert!(matches!(
        net.get_object("A:nope"),
        Err(NetworkError::UnknownName(_))
    ));
}

#[test]
fn test_run_compiles_once_until_structure_changes() {
    let mut net = rate_network();
    net.make("A", 20, 1).unwrap();
    net.make_input("in", 0.2).unwrap();
    net.connect("in", "A", ConnectionSpec::new()).unwrap();
    assert!(matches!(net.scheduler_state(), SchedulerState::Stale));

    net.run(0.01).unwrap();
    net.run(0.01).unwrap();
    assert_eq!(net.compile_count(), 1);
    assert!(net.is_compiled());

    net.make("B", 20, 1).unwrap();
    assert!(!net.is_compiled());
    net.run(0.01).unwrap();
    assert_eq!(net.compile_count(), 2);

    net.connect("A", "B", ConnectionSpec::new()).unwrap();
    assert!(!net.is_compiled());
    net.run(0.01).unwrap();
    net.run(0.01).unwrap();
    assert_eq!(net.compile_count(), 3);
}

#[test]
fn test_compiled_rules_cover_filters_and_populations() {
    let mut net = rate_network();
    net.make("A", 10, 1).unwrap();
    net.make_input("in", 0.2).unwrap();
    net.connect("in", "A", ConnectionSpec::new()).unwrap();
    net.run(0.001).unwrap();

    let SchedulerState::Compiled(step) = net.scheduler_state() else {
        panic!("scheduler should be compiled after run");
    };
    assert_eq!(step.rules().len(), 2);
    assert!(matches!(step.rules()[0], UpdateRule::Filter { .. }));
    assert!(matches!(step.rules()[1], UpdateRule::Population { .. }));
}

#[test]
fn test_contract_violation_leaves_network_untouched() {
    let mut net = rate_network();
    net.make("A", 10, 1).unwrap();
    net.make("B", 10, 1).unwrap();
    net.run(0.001).unwrap();

    let spec = ConnectionSpec::new().transform(Array2::eye(1)).weight(2.0);
    assert!(matches!(
        net.connect("A", "B", spec),
        Err(NetworkError::ContractViolation(_))
    ));
    assert!(net.ensemble("B").unwrap().inputs().is_empty());
    assert!(net.is_compiled());
}

#[test]
fn test_encoded_connection_requires_spiking_pre() {
    let mut net = rate_network();
    net.make_input("in", 0.5).unwrap();
    net.make("A", 10, 1).unwrap();
    net.make("B", 8, 1).unwrap();

    let spec = ConnectionSpec::new().encoded_weights(Array2::zeros((10, 1)));
    assert!(matches!(
        net.connect("in", "A", spec),
        Err(NetworkError::ContractViolation(_))
    ));

    let wrong = ConnectionSpec::new().encoded_weights(Array2::zeros((10, 8)));
    assert!(matches!(
        net.connect("A", "B", wrong),
        Err(NetworkError::ShapeMismatch { .. })
    ));

    net.connect(
        "A",
        "B",
        ConnectionSpec::new().encoded_weights(Array2::from_elem((8, 10), 1e-3)),
    )
    .unwrap();
    let inputs = net.ensemble("B").unwrap().inputs();
    assert_eq!(inputs.len(), 1);
    assert!(!inputs[0].is_decoded());
    net.run(0.01).unwrap();
}

#[test]
fn test_func_origin_is_memoised_and_reuses_the_fit() {
    let mut net = rate_network();
    net.make("A", 30, 1).unwrap();
    net.make("B", 30, 1).unwrap();
    net.make("C", 30, 1).unwrap();

    let before = net.solver_stats();
    net.connect("A", "B", ConnectionSpec::new().func(square())).unwrap();
    net.connect("A", "C", ConnectionSpec::new().func(square())).unwrap();
    let after = net.solver_stats();

    let origins = net.ensemble("A").unwrap().origins();
    assert_eq!(origins.len(), 2);
    assert_eq!(origins[1].name(), "square");
    // one extra solve, served from the activity matrix cached by `make`
    assert_eq!(after.solves, before.solves + 1);
    assert_eq!(after.activity_computations, before.activity_computations);
    assert_eq!(after.cache_hits, before.cache_hits + 1);

    assert!(net.origin("A:square").is_ok());
    net.connect("A:square", "B", ConnectionSpec::new()).unwrap();
}

#[test]
fn test_transform_shape_and_post_kind_are_checked() {
    let mut net = rate_network();
    net.make("A", 10, 2).unwrap();
    net.make("B", 10, 1).unwrap();
    net.make_input("in", 1.0).unwrap();

    assert!(matches!(
        net.connect("A", "B", ConnectionSpec::new().transform(Array2::eye(2))),
        Err(NetworkError::ShapeMismatch { .. })
    ));
    net.connect("A", "B", ConnectionSpec::new().transform(array![[0.5, 0.5]]))
        .unwrap();

    assert!(matches!(
        net.connect("A", "in", ConnectionSpec::new()),
        Err(NetworkError::ContractViolation(_))
    ));
    assert!(matches!(
        net.connect("A", "B:X", ConnectionSpec::new()),
        Err(NetworkError::ContractViolation(_))
    ));
    assert!(matches!(
        net.connect("nobody", "B", ConnectionSpec::new()),
        Err(NetworkError::UnknownName(_))
    ));
}

#[test]
fn test_weight_and_indices_route_dimensions() {
    let mut net = rate_network();
    net.make_input("in", vec![0.1, 0.2, 0.3]).unwrap();
    net.make("A", 10, 2).unwrap();
    net.connect(
        "in",
        "A",
        ConnectionSpec::new().weight(2.0).index_pre(vec![2, 0]).index_post(vec![0, 1]),
    )
    .unwrap();
    let input = &net.ensemble("A").unwrap().inputs()[0];
    match input.source() {
        nef_network::InputSource::Decoded { transform, .. } => {
            assert_eq!(transform, &array![[0.0, 0.0, 2.0], [2.0, 0.0, 0.0]]);
        }
        other => panic!("expected decoded input, got {:?}", other),
    }
}

#[test]
fn test_simple_node_receives_decoded_input() {
    let mut net = rate_network();
    net.make_input("in", 0.4).unwrap();
    net.make_simple_node("double", 1, |_, x| vec![2.0 * x[0]]).unwrap();
    net.connect("in", "double", ConnectionSpec::new().pstc(0.0)).unwrap();
    net.make_probe("double", Some("p"), Some(0.001)).unwrap();
    net.run(0.005).unwrap();

    let out = net.origin("double:X").unwrap().decoded_output()[0];
    assert!((out - 0.8).abs() < 1e-12);
}

#[test]
fn test_learn_wiring_and_weight_updates() {
    let mut net = rate_network();
    net.make("A", 20, 1).unwrap();
    net.make("B", 15, 1).unwrap();
    net.make_input("err", 1.0).unwrap();
    net.make_input("wide", vec![1.0, 1.0]).unwrap();

    assert!(matches!(
        net.learn("A", "B", "wide", LearnSpec::new()),
        Err(NetworkError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        net.learn("err", "B", "err", LearnSpec::new()),
        Err(NetworkError::ContractViolation(_))
    ));
    assert!(matches!(
        net.learn("A", "B", "err", LearnSpec::new().weights(Array2::zeros((20, 15)))),
        Err(NetworkError::ShapeMismatch { .. })
    ));

    net.learn("A", "B", "err", LearnSpec::new().pstc(0.005)).unwrap();
    let termination = &net.ensemble("B").unwrap().learned_terminations()[0];
    assert_eq!(termination.weights().dim(), (15, 20));
    assert_eq!(termination.rule().name(), "pes");

    net.run(0.05).unwrap();
    let termination = &net.ensemble("B").unwrap().learned_terminations()[0];
    assert!(termination.weights().iter().any(|w| *w != 0.0));
    assert!(termination.activity().iter().any(|a| *a > 0.0));
}

#[test]
fn test_run_time_credits_remainder() {
    let mut net = rate_network();
    net.make_input("in", 1.0).unwrap();
    net.make_probe("in", None, Some(0.001)).unwrap();

    net.run(0.0015).unwrap();
    assert!((net.run_time() - 0.0015).abs() < 1e-15);
    assert_eq!(net.probe("Probe1").unwrap().data().len(), 1);

    net.run(0.0015).unwrap();
    assert!((net.run_time() - 0.003).abs() < 1e-15);
    let times = net.probe("Probe1").unwrap().times();
    assert!((times[1] - 0.0015).abs() < 1e-12);
}

#[test]
fn test_probe_filters_target_origin() {
    let mut net = rate_network();
    net.make_input("in", 1.0).unwrap();
    let probe = net.make_probe("in", None, Some(0.01)).unwrap();
    assert_eq!(probe.name(), "Probe1");
    assert_eq!(probe.target(), "in:X");

    net.run(0.2).unwrap();
    let probe = net.probe("Probe1").unwrap();
    assert_eq!(probe.data().len(), 20);
    // probe pstc 0.03: first sample is the initial zero, the last is close to 1
    assert_eq!(probe.data()[0].value[0], 0.0);
    assert!((probe.latest().unwrap().value[0] - 1.0).abs() < 0.01);
}

#[test]
fn test_probe_added_after_run_samples_from_current_time() {
    let mut net = rate_network();
    net.make_input("in", 1.0).unwrap();
    net.run(0.5).unwrap();

    net.make_probe("in", Some("late"), Some(0.01)).unwrap();
    net.run(0.1).unwrap();

    let times = net.probe("late").unwrap().times();
    assert_eq!(times.len(), 10, "sample times {:?}", times);
    assert!((times[0] - 0.5).abs() < 1e-9);
    for pair in times.windows(2) {
        assert!((pair[1] - pair[0] - 0.01).abs() < 1e-6, "sample times {:?}", times);
    }
}
