//! Criterion benchmarks for setting estimation.
//!
//! Covers `estimate_settings` and `estimate_report` on the built-in catalog,
//! from a short session up to a full day of play.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sl_config::MachineCatalog;
use sl_core::estimate::{estimate_report, estimate_settings, Observation};

fn juggler_session(games: u64) -> Observation {
    // Roughly setting-4 rates.
    Observation::new(games)
        .with_primary_phase(games)
        .with_count("grape", games * 100 / 581)
        .with_count("big", games / 259)
        .with_count("reg", games / 320)
        .with_count("solo-reg", games / 403)
        .with_count("cherry-reg", games / 1078)
        .with_ignored("reg")
}

fn bench_estimate(c: &mut Criterion) {
    let catalog = MachineCatalog::builtin().expect("built-in catalog parses");
    let juggler = catalog.machine("my-juggler-5").expect("machine exists");
    let sample_at = catalog.machine("sample-at").expect("machine exists");

    let mut group = c.benchmark_group("estimate");

    for &games in &[100u64, 1_000, 8_000] {
        let obs = juggler_session(games);
        group.bench_with_input(
            BenchmarkId::new("estimate_settings", games),
            &obs,
            |b, obs| b.iter(|| black_box(estimate_settings(black_box(juggler), black_box(obs)))),
        );
        group.bench_with_input(
            BenchmarkId::new("estimate_report", games),
            &obs,
            |b, obs| b.iter(|| black_box(estimate_report(black_box(juggler), black_box(obs)))),
        );
    }

    let phased = Observation::new(3000)
        .with_primary_phase(2000)
        .with_count("cz", 10)
        .with_count("cz-win", 4)
        .with_count("at-bell", 150)
        .with_count("weak-cherry", 27);
    group.bench_function("estimate_settings_phased", |b| {
        b.iter(|| black_box(estimate_settings(black_box(sample_at), black_box(&phased))))
    });

    // One recompute per tap over a long session.
    let taps: Vec<Observation> = (1..=1_000u64).map(|i| juggler_session(i * 8)).collect();
    group.bench_function("estimate_settings_1k_taps", |b| {
        b.iter(|| {
            let mut acc = 0.0f64;
            for obs in &taps {
                acc += estimate_settings(juggler, obs)[5].percentage;
            }
            black_box(acc);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_estimate);
criterion_main!(benches);
