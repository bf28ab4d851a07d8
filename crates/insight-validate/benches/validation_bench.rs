use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use insight_core::{Row, TabularDataset};
use insight_scheduler::DependencyTaskScheduler;
use insight_validate::{Hypothesis, StatisticalValidator};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

const PLATFORMS: [&str; 4] = ["Facebook", "Instagram", "Audience Network", "Messenger"];

/// Generate one window of rows per platform per day
fn generate_window(first_day: u32, days: u32, rows_per_day: usize, mean: f64, seed: u64) -> TabularDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(mean, 0.5).unwrap();
    (first_day..first_day + days)
        .flat_map(|d| {
            let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(d as i64);
            (0..rows_per_day).map(move |i| (date, PLATFORMS[i % PLATFORMS.len()]))
        })
        .map(|(date, platform)| {
            Row::new(date)
                .with_dimension("platform", platform)
                .with_measure("roas", normal.sample(&mut rng))
        })
        .collect()
}

fn hypotheses() -> Vec<Hypothesis> {
    PLATFORMS
        .iter()
        .enumerate()
        .map(|(i, platform)| {
            Hypothesis::new(format!("H{i}"), format!("Platform-specific issues on {platform}"), 0.65)
                .unwrap()
                .with_segment(format!("platform={platform}"))
        })
        .collect()
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let validator = StatisticalValidator::default();
    let h = &hypotheses()[0];

    for rows_per_day in [4, 40, 400] {
        let current = generate_window(30, 30, rows_per_day, 2.0, 1);
        let comparison = generate_window(0, 30, rows_per_day, 3.0, 2);
        group.bench_with_input(
            BenchmarkId::new("single", rows_per_day * 30),
            &(current, comparison),
            |b, (current, comparison)| {
                b.iter(|| validator.validate(black_box(h), current, comparison, "roas"))
            },
        );
    }
    group.finish();
}

fn bench_validate_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_all");
    let current = generate_window(30, 30, 400, 2.0, 1);
    let comparison = generate_window(0, 30, 400, 3.0, 2);
    let batch = hypotheses();

    for workers in [1, 3] {
        let validator = StatisticalValidator::default()
            .with_scheduler(DependencyTaskScheduler::with_workers(workers).unwrap());
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, _| {
            b.iter(|| validator.validate_all(black_box(&batch), &current, &comparison, "roas"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validate, bench_validate_all);
criterion_main!(benches);
