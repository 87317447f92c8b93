//! Benchmarks for the chart pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chartsight::extraction::{extract_close, ColorConfig};
use chartsight::strategy::analyze_closes;
use chartsight::{run_pipeline, EngineConfig, PredictionContext, Rgb, RgbGrid, SignalEngine};

const BACKGROUND: Rgb = Rgb::new(25, 25, 25);

fn wave(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            0.5 + 0.25 * (t * 0.07).sin() + 0.1 * (t * 0.013).cos()
        })
        .collect()
}

/// Alternating bull/bear bodies around a wavy close line.
fn make_chart(width: usize, height: usize) -> RgbGrid {
    let colors = ColorConfig::default();
    let closes = wave(width);
    let top = height / 10;
    let rows = height - height / 4 - top;

    RgbGrid::from_fn(width, height, |x, y| {
        let row = top + ((1.0 - closes[x]) * (rows - 1) as f64) as usize;
        if (row..row + 6).contains(&y) {
            if x % 7 < 4 {
                colors.bull
            } else {
                colors.bear
            }
        } else {
            BACKGROUND
        }
    })
}

fn bench_extract_close(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_close");
    let colors = ColorConfig::default();

    for width in [400, 1200, 2400].iter() {
        let grid = make_chart(*width, 800);
        group.throughput(Throughput::Elements((*width * 800) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &grid, |b, grid| {
            b.iter(|| extract_close(black_box(grid), &colors))
        });
    }

    group.finish();
}

fn bench_analyze_closes(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_closes");
    let config = EngineConfig::default();
    let ctx = PredictionContext::at("10:15");

    for size in [200, 1000, 4000].iter() {
        let closes = wave(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &closes, |b, closes| {
            b.iter(|| analyze_closes(&config, black_box(closes), &ctx))
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let config = EngineConfig::default();
    let ctx = PredictionContext::at("10:15");
    let grid = make_chart(1200, 800);

    c.bench_function("run_pipeline_1200x800", |b| {
        b.iter(|| run_pipeline(&config, black_box(&grid), &ctx))
    });

    let engine = SignalEngine::default();
    c.bench_function("multi_timeframe_1200x800", |b| {
        b.iter(|| engine.predict_multi_timeframe(&grid, &grid, &grid, "10:15", None))
    });
}

criterion_group!(
    benches,
    bench_extract_close,
    bench_analyze_closes,
    bench_full_pipeline
);
criterion_main!(benches);
