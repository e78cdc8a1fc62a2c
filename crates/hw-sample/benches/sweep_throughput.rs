use criterion::{criterion_group, criterion_main, Criterion};
use hw_core::{Observable, RngHandle, WalkType};
use hw_sample::metropolis::sweep;
use hw_sample::{run, AcceptanceStats, RunConfig};
use hw_walk::{build_walker, WalkerParams};

fn bench_sweep(c: &mut Criterion) {
    for walk_type in [WalkType::Lattice, WalkType::Real] {
        let params = WalkerParams {
            walk_type,
            steps: 256,
            ..WalkerParams::default()
        };
        let mut walker = build_walker(&params, &mut RngHandle::from_seed(1)).unwrap();
        let mut rng = RngHandle::from_seed(2);
        let mut stats = AcceptanceStats::default();
        c.bench_function(&format!("metropolis_sweep_{walk_type}_256"), |b| {
            b.iter(|| {
                sweep(
                    walker.as_mut(),
                    Observable::Surface,
                    -10.0,
                    256,
                    &mut rng,
                    &mut stats,
                )
                .unwrap()
            })
        });
    }
}

fn bench_run(c: &mut Criterion) {
    let mut config = RunConfig::default();
    config.walk.steps = 64;
    config.iterations = 20;
    config.t_eq = Some(5);
    config.theta = -20.0;

    c.bench_function("metropolis_run_64", |b| {
        b.iter(|| {
            let _ = run(&config, "bench").unwrap();
        })
    });
}

criterion_group!(benches, bench_sweep, bench_run);
criterion_main!(benches);
