//! Shared fixtures for pipeline tests

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use insight_core::{Row, TabularDataset};
use insight_pipeline::AnalysisConfig;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

pub const PLATFORMS: [&str; 2] = ["Facebook", "Instagram"];
pub const CREATIVES: [&str; 2] = ["Video", "Image"];
pub const AUDIENCES: [&str; 2] = ["Broad", "Lookalike"];

pub fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

/// 28 days of campaign rows, four per day (platform x creative type)
///
/// Roas is drawn from N(3.0, 0.2). From day 15 on, Facebook drops to
/// N(1.5, 0.2). Audience type alternates per day, so both audiences see the
/// same platform mix.
pub fn campaign_dataset(seed: u64) -> TabularDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.2).unwrap();
    let ctr = Normal::new(0.02, 0.002).unwrap();

    let mut rows = Vec::new();
    for d in 0..28 {
        let date = start() + Duration::days(d);
        let audience = AUDIENCES[(d % 2) as usize];
        for platform in PLATFORMS {
            for creative in CREATIVES {
                let base = if platform == "Facebook" && d >= 14 { 1.5 } else { 3.0 };
                let roas: f64 = base + noise.sample(&mut rng);
                let spend = 100.0;
                rows.push(
                    Row::new(date)
                        .with_dimension("platform", platform)
                        .with_dimension("creative_type", creative)
                        .with_dimension("audience_type", audience)
                        .with_dimension("campaign_name", format!("{platform} {creative}"))
                        .with_measure("spend", spend)
                        .with_measure("revenue", spend * roas)
                        .with_measure("purchases", (spend * roas / 25.0).round())
                        .with_measure("clicks", 50.0)
                        .with_measure("impressions", 2500.0)
                        .with_measure("ctr", ctr.sample(&mut rng))
                        .with_measure("roas", roas),
                );
            }
        }
    }
    TabularDataset::from_rows(rows)
}

/// Two-week windows ending on the last fixture day
pub fn two_week_config() -> AnalysisConfig {
    AnalysisConfig {
        lookback_days: 14,
        ..AnalysisConfig::default()
    }
}
