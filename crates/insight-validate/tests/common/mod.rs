//! Shared fixtures for validation tests

use chrono::NaiveDate;
use insight_core::{Row, TabularDataset};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

/// Rows for one platform with roas drawn from N(mean, sd), one per day in `days`
pub fn platform_rows(
    platform: &str,
    days: std::ops::RangeInclusive<u32>,
    mean: f64,
    sd: f64,
    seed: u64,
) -> Vec<Row> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(mean, sd).unwrap();
    days.map(|d| {
        Row::new(day(d))
            .with_dimension("platform", platform)
            .with_measure("roas", normal.sample(&mut rng))
    })
    .collect()
}

/// Facebook falls from roas 4.0 to 2.0 between the windows while Instagram holds at 3.0
///
/// Comparison window is March 1-14, current window March 15-28.
pub fn facebook_decline(current_days: u32) -> (TabularDataset, TabularDataset) {
    let mut current = platform_rows("Facebook", 15..=14 + current_days, 2.0, 0.2, 1);
    current.extend(platform_rows("Instagram", 15..=28, 3.0, 0.2, 2));
    let mut comparison = platform_rows("Facebook", 1..=14, 4.0, 0.2, 3);
    comparison.extend(platform_rows("Instagram", 1..=14, 3.0, 0.2, 4));
    (
        TabularDataset::from_rows(current),
        TabularDataset::from_rows(comparison),
    )
}
