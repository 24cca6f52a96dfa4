//! Benchmarks for Syndra compilation passes
//!
//! Run with: cargo bench -p syndra-compile

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::collections::BTreeSet;
use syndra_compile::{
    LayerCircuit, MemoryExperiment, PassManagerBuilder, make_phenomenological_circuit,
    noisy_circuit, transpile_to_z_basis_interaction_circuit,
};
use syndra_ir::{Basis, CheckStyle, Circuit, Coord, NoiseModel, NoiseRule, Patch, PauliMap, Tile};

/// Distance-`d` repetition code memory experiment.
fn repetition_memory(d: usize, rounds: u64, style: CheckStyle) -> MemoryExperiment {
    let data = |k: usize| Coord::real(k as f64);
    let tiles = (0..d - 1).map(|k| {
        Tile::with_data("Z", Coord::real(k as f64 + 0.5), [data(k), data(k + 1)]).unwrap()
    });
    MemoryExperiment {
        patch: Patch::new(tiles),
        noise: NoiseRule::after([("DEPOLARIZE1", 0.001)]).with_flip_result(0.001),
        observables_z: vec![PauliMap::new().with_basis(Basis::Z, [data(0)])],
        rounds,
        style,
        ..MemoryExperiment::default()
    }
}

fn noiseless(d: usize) -> Circuit {
    let config = MemoryExperiment {
        noise: NoiseRule::default(),
        ..repetition_memory(d, 10, CheckStyle::AncillaControlled)
    };
    make_phenomenological_circuit(&config).unwrap()
}

/// Benchmark memory experiment generation
fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_generation");

    for d in &[3usize, 9, 25, 49] {
        group.bench_with_input(BenchmarkId::new("phenomenological", d), d, |b, &d| {
            let config = repetition_memory(d, 100, CheckStyle::ProductMeasurement);
            b.iter(|| make_phenomenological_circuit(black_box(&config)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark noise injection
fn bench_noise_injection(c: &mut Criterion) {
    let mut group = c.benchmark_group("noise_injection");

    for d in &[3usize, 9, 25, 49] {
        let circuit = noiseless(d);
        let model = NoiseModel::si1000(0.001);
        group.bench_with_input(BenchmarkId::new("si1000", d), &circuit, |b, circuit| {
            b.iter(|| noisy_circuit(black_box(circuit), &model, &BTreeSet::new(), None).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the layer passes
fn bench_layers(c: &mut Criterion) {
    let mut group = c.benchmark_group("layers");

    for d in &[3usize, 9, 25] {
        let circuit = noiseless(d);
        group.bench_with_input(BenchmarkId::new("optimize", d), &circuit, |b, circuit| {
            b.iter(|| {
                LayerCircuit::from_circuit(black_box(circuit))
                    .unwrap()
                    .with_locally_optimized_layers()
                    .to_circuit()
                    .unwrap()
            });
        });
        group.bench_with_input(BenchmarkId::new("z_basis", d), &circuit, |b, circuit| {
            b.iter(|| transpile_to_z_basis_interaction_circuit(black_box(circuit)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark the full pass pipeline
fn bench_pipeline(c: &mut Criterion) {
    let circuit = noiseless(9);
    c.bench_function("pipeline_d9", |b| {
        b.iter(|| {
            let (pm, mut props) = PassManagerBuilder::new()
                .with_noise(NoiseModel::uniform_depolarizing(0.001))
                .with_z_basis(true)
                .build();
            let mut circuit = circuit.clone();
            pm.run(&mut circuit, &mut props).unwrap();
            circuit
        });
    });
}

criterion_group!(
    benches,
    bench_generation,
    bench_noise_injection,
    bench_layers,
    bench_pipeline
);
criterion_main!(benches);
