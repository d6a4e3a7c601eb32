// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Decoder solve benchmarks: cold (activities + eigendecomposition) and
//! warm (cached `Ginv`, new target function only)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use nef_npu_decoding::{
    DecodablePopulation, DecoderConfig, DecoderSolver, InMemoryDecoderCache, SignatureBuilder,
    TargetFunction,
};
use nef_npu_neural::{LifRateNeuron, NeuronModel, NeuronParameters, RateMode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct BenchPopulation {
    key: String,
    model: LifRateNeuron,
    encoders: Array2<f64>,
    bias: Array1<f64>,
}

impl BenchPopulation {
    fn new(neurons: usize) -> Self {
        let model = LifRateNeuron::new(NeuronParameters::default());
        let mut rng = StdRng::seed_from_u64(neurons as u64);
        let mut encoders = Array2::zeros((neurons, 1));
        let mut bias = Array1::zeros(neurons);
        for i in 0..neurons {
            let (gain, b) = model
                .gain_bias(rng.gen_range(200.0..400.0), rng.gen_range(-0.9..0.9))
                .unwrap();
            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            encoders[[i, 0]] = sign * gain;
            bias[i] = b;
        }
        Self {
            key: SignatureBuilder::new("bench").with_u64(neurons as u64).finish(),
            model,
            encoders,
            bias,
        }
    }
}

impl DecodablePopulation for BenchPopulation {
    fn cache_key(&self) -> &str {
        &self.key
    }
    fn dimensions(&self) -> usize {
        1
    }
    fn array_size(&self) -> usize {
        1
    }
    fn neurons_num(&self) -> usize {
        self.bias.len()
    }
    fn radius(&self) -> f64 {
        1.0
    }
    fn seed(&self) -> u64 {
        1
    }
    fn noise(&self) -> f64 {
        0.1
    }
    fn decoder_noise(&self) -> f64 {
        0.1
    }
    fn max_rate(&self) -> f64 {
        400.0
    }
    fn model(&self) -> &dyn NeuronModel {
        &self.model
    }
    fn rate_mode(&self) -> RateMode {
        RateMode::HasAnalyticRate
    }
    fn encoders(&self, _index: usize) -> ArrayView2<'_, f64> {
        self.encoders.view()
    }
    fn bias(&self, _index: usize) -> ArrayView1<'_, f64> {
        self.bias.view()
    }
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder_solve");
    for neurons in [50usize, 100, 200] {
        let population = BenchPopulation::new(neurons);

        group.bench_with_input(BenchmarkId::new("cold", neurons), &population, |b, pop| {
            b.iter(|| {
                let solver =
                    DecoderSolver::new(InMemoryDecoderCache::shared(), DecoderConfig::default());
                black_box(solver.solve(pop, None, None).unwrap())
            })
        });

        let warm = DecoderSolver::default();
        warm.solve(&population, None, None).unwrap();
        let square = TargetFunction::scalar("square", |x| x[0] * x[0]);
        group.bench_with_input(BenchmarkId::new("warm", neurons), &population, |b, pop| {
            b.iter(|| black_box(warm.solve(pop, Some(&square), None).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_solve);
criterion_main!(benches);
