//! Benchmarks for the series-computation core.

use barwise_core::{Bar, Bars, Handler, Indicator, Series};
use barwise_indicators::{window, Catalog, CascadeMa, Kama, MemoCache, PoleFilter, Rsi, Sma};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_test_data(size: usize) -> Series {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn generate_bars(size: usize) -> Bars {
    generate_test_data(size)
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(i as i64, c, c + 0.5, c - 0.5, c, 1000.0))
        .collect()
}

fn benchmark_sma(c: &mut Criterion) {
    let mut group = c.benchmark_group("SMA");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("rolling", size), &data, |b, data| {
            let sma = Sma::new(20).unwrap();
            b.iter(|| sma.compute(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("pointwise", size), &data, |b, data| {
            b.iter(|| {
                (0..data.len())
                    .map(|i| window::mean(black_box(data), i, 20))
                    .collect::<Vec<f64>>()
            })
        });
    }

    group.finish();
}

fn benchmark_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("Filters");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("tema", size), &data, |b, data| {
            let tema = CascadeMa::tema(20).unwrap();
            b.iter(|| tema.compute(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("butterworth3", size), &data, |b, data| {
            let filter = PoleFilter::butterworth3(20).unwrap();
            b.iter(|| filter.compute(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("kama", size), &data, |b, data| {
            let kama = Kama::new(10, 2, 30).unwrap();
            b.iter(|| kama.compute(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("wilder", size), &data, |b, data| {
            let rsi = Rsi::new(14).unwrap();
            b.iter(|| rsi.compute(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("Cache");
    let bars = generate_bars(10000);
    let catalog = Catalog::new();
    let handlers: Vec<Box<dyn Handler>> = ["ema", "dema", "tema", "macd"]
        .iter()
        .map(|name| catalog.create_default(name).unwrap())
        .collect();

    group.bench_function("shared_ema_cold", |b| {
        b.iter(|| {
            let mut cache = MemoCache::new();
            for handler in &handlers {
                black_box(handler.execute(&bars, &mut cache));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_sma,
    benchmark_filters,
    benchmark_rsi,
    benchmark_cache
);
criterion_main!(benches);
