//! Shared utilities for integration tests

use chrono::NaiveDate;
use insight_core::{Row, TabularDataset};

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

/// One row per day of March 2025 for each platform, with a fixed roas per platform
pub fn march_by_platform(platforms: &[(&str, f64)]) -> TabularDataset {
    (1..=31)
        .flat_map(|d| {
            platforms.iter().map(move |(platform, roas)| {
                Row::new(day(d))
                    .with_dimension("platform", *platform)
                    .with_measure("roas", *roas)
                    .with_measure("spend", 100.0)
            })
        })
        .collect()
}
