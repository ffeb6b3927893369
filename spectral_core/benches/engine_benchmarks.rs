//! Performance benchmarks for the conditioning and matching hot paths
//!
//! Run with: cargo bench --bench engine_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use spectral_core::preprocess::{asls_baseline, savgol};
use spectral_core::SpectralMatcher;

fn test_spectrum(n: usize) -> (Array1<f64>, Array1<f64>) {
    let axis = Array1::linspace(200.0, 3200.0, n);
    let y = axis.mapv(|w: f64| {
        2.0 * (-((w - 465.0) / 18.0).powi(2)).exp()
            + 1.2 * (-((w - 1086.0) / 14.0).powi(2)).exp()
            + 0.4
            + 1.0e-4 * (w - 200.0)
            + 0.02 * (w * 0.11).sin()
    });
    (axis, y)
}

fn bench_savgol(c: &mut Criterion) {
    let mut group = c.benchmark_group("savgol");
    for size in [512, 2048].iter() {
        let (_, y) = test_spectrum(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(savgol(&y, 15, 3).unwrap()));
        });
    }
    group.finish();
}

fn bench_asls(c: &mut Criterion) {
    let mut group = c.benchmark_group("asls_baseline");
    for size in [512, 2048].iter() {
        let (_, y) = test_spectrum(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(asls_baseline(&y, 1.0e5, 0.01, 10).unwrap()));
        });
    }
    group.finish();
}

fn bench_matcher(c: &mut Criterion) {
    let (axis, query) = test_spectrum(1024);
    let mut matcher = SpectralMatcher::new(axis.clone()).unwrap();
    for i in 0..200 {
        let center = 300.0 + 14.0 * i as f64;
        let entry = axis.mapv(|w: f64| (-((w - center) / 20.0).powi(2)).exp());
        matcher
            .add_reference(&format!("mineral_{i}"), &axis, &entry)
            .unwrap();
    }

    c.bench_function("matcher_top5_of_200", |b| {
        b.iter(|| black_box(matcher.match_spectrum(&axis, &query, 5).unwrap()));
    });
}

criterion_group!(benches, bench_savgol, bench_asls, bench_matcher);
criterion_main!(benches);
