//! Dataset profile and data quality summary

use crate::math::round_to;
use crate::{Error, Result, TabularDataset};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Measures checked for missing values when scoring data quality
pub const QUALITY_MEASURES: [&str; 4] = ["spend", "clicks", "revenue", "purchases"];

/// Shape of a dataset as seen by planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub rows: usize,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
}

impl DatasetProfile {
    pub fn of(dataset: &TabularDataset) -> Result<Self> {
        let (min_date, max_date) = dataset
            .date_range()
            .ok_or_else(|| Error::empty_dataset("dataset profile"))?;
        Ok(Self {
            min_date,
            max_date,
            rows: dataset.len(),
            dimensions: dataset.dimension_names().into_iter().collect(),
            measures: dataset.measure_names().into_iter().collect(),
        })
    }
}

/// Missing-value report over the core spend/revenue measures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub total_rows: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub missing_values: BTreeMap<String, usize>,
    /// `1 - missing / (rows * checked measures)`, rounded to 2 decimals
    pub quality_score: f64,
}

impl DataQuality {
    pub fn assess(dataset: &TabularDataset) -> Self {
        let missing_values: BTreeMap<String, usize> = QUALITY_MEASURES
            .iter()
            .map(|m| (m.to_string(), dataset.missing(m)))
            .collect();

        let cells = dataset.len() * QUALITY_MEASURES.len();
        let total_missing: usize = missing_values.values().sum();
        let quality_score = if cells == 0 {
            0.0
        } else {
            round_to(1.0 - total_missing as f64 / cells as f64, 2)
        };

        Self {
            total_rows: dataset.len(),
            date_range: dataset.date_range(),
            missing_values,
            quality_score,
        }
    }
}
