//! Benchmarks for the advection kernels and driver.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fluid_advect::{
    compute::{AdvectionPropagator, ScalarScratch, SimulationState, advect_scalar},
    grid::{FlagGrid, GridShape, MacGrid, RealGrid},
    schema::{AdvectionConfig, AdvectionMethod, SimulationConfig},
};

fn bench_advect_scalar(c: &mut Criterion) {
    let mut group = c.benchmark_group("advect_scalar");

    for size in [64, 128, 256, 512] {
        let shape = GridShape::new_2d(1, size, size);
        let flags = FlagGrid::with_solid_border(shape, 1);
        let vel = MacGrid::uniform(shape, [0.8, 0.3, 0.0]);
        let src = RealGrid::from_fn(shape, |c| ((c.i + c.j) % 7) as f32);
        let mut dst = RealGrid::zeros(shape);
        let mut scratch = ScalarScratch::new(shape);

        for method in [AdvectionMethod::Euler, AdvectionMethod::MacCormack] {
            let config = AdvectionConfig {
                method,
                ..AdvectionConfig::default()
            };
            group.bench_with_input(
                BenchmarkId::new(method.to_string(), format!("{}x{}", size, size)),
                &size,
                |b, _| {
                    b.iter(|| {
                        advect_scalar(
                            black_box(0.5),
                            &flags,
                            &vel,
                            &src,
                            &mut dst,
                            &mut scratch.fwd,
                            &mut scratch.bwd,
                            &mut scratch.fwd_pos,
                            &mut scratch.bwd_pos,
                            &config,
                        )
                        .unwrap();
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_propagator_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagator_3d");
    group.sample_size(20);

    for size in [32, 64] {
        let config = SimulationConfig {
            width: size,
            height: size,
            depth: size,
            batch: 1,
            dt: 0.5,
            ..SimulationConfig::default()
        };

        let mut state = SimulationState::from_config(&config).unwrap();
        let mut propagator = AdvectionPropagator::new(config).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}^3", size)),
            &size,
            |b, _| {
                b.iter(|| {
                    propagator.step(black_box(&mut state)).unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_advect_scalar, bench_propagator_3d);
criterion_main!(benches);
