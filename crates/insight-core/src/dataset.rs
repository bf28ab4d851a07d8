//! Immutable in-memory table of dated observations
//!
//! A [`TabularDataset`] is a list of shared [`Row`] handles. Every filter,
//! split and grouping returns a new dataset that shares the underlying rows,
//! so a dataset can be handed to many concurrent readers without locking.

use crate::math;
use crate::TimeWindow;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One observation: a date, categorical dimensions and numeric measures
///
/// A measure that is absent (or NaN) is missing, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    date: NaiveDate,
    dimensions: BTreeMap<String, String>,
    measures: BTreeMap<String, f64>,
}

impl Row {
    /// Create a row with no dimensions or measures
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            dimensions: BTreeMap::new(),
            measures: BTreeMap::new(),
        }
    }

    /// Set a categorical dimension value
    pub fn with_dimension(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dimensions.insert(name.into(), value.into());
        self
    }

    /// Set a numeric measure; NaN is stored as missing
    pub fn with_measure(mut self, name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        if value.is_nan() {
            self.measures.remove(&name);
        } else {
            self.measures.insert(name, value);
        }
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Value of a dimension, if the row carries it
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions.get(name).map(String::as_str)
    }

    /// Value of a measure, `None` when missing
    pub fn measure(&self, name: &str) -> Option<f64> {
        self.measures.get(name).copied()
    }

    pub fn dimensions(&self) -> &BTreeMap<String, String> {
        &self.dimensions
    }

    pub fn measures(&self) -> &BTreeMap<String, f64> {
        &self.measures
    }
}

/// Read-only table of rows with filtering, grouping and aggregation
#[derive(Debug, Clone, Default)]
pub struct TabularDataset {
    rows: Vec<Arc<Row>>,
}

impl TabularDataset {
    /// Build a dataset that owns the given rows
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter().map(Arc::new).collect(),
        }
    }

    fn from_shared(rows: Vec<Arc<Row>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows.iter().map(|r| &**r)
    }

    /// Rows matching a predicate
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool,
    {
        Self::from_shared(
            self.rows
                .iter()
                .filter(|&r| predicate(r))
                .cloned()
                .collect(),
        )
    }

    /// Rows dated inside the window
    pub fn window(&self, window: &TimeWindow) -> Self {
        self.filter(|r| window.contains(r.date()))
    }

    /// Rows whose dimension equals `value`
    pub fn where_eq(&self, dimension: &str, value: &str) -> Self {
        self.filter(|r| r.dimension(dimension) == Some(value))
    }

    /// Complement of [`where_eq`](Self::where_eq), including rows without the dimension
    pub fn where_not_eq(&self, dimension: &str, value: &str) -> Self {
        self.filter(|r| r.dimension(dimension) != Some(value))
    }

    /// Split into the rows matching `dimension = value` and the rest
    pub fn partition(&self, dimension: &str, value: &str) -> (Self, Self) {
        let (matching, rest): (Vec<_>, Vec<_>) = self
            .rows
            .iter()
            .cloned()
            .partition(|r| r.dimension(dimension) == Some(value));
        (Self::from_shared(matching), Self::from_shared(rest))
    }

    /// Rows sorted by date; rows sharing a date keep their relative order
    pub fn sorted_by_date(&self) -> Self {
        let mut rows = self.rows.clone();
        rows.sort_by_key(|r| r.date());
        Self::from_shared(rows)
    }

    /// Non-missing values of a measure in row order
    pub fn values(&self, measure: &str) -> Vec<f64> {
        self.iter().filter_map(|r| r.measure(measure)).collect()
    }

    /// Number of rows with a value for `measure`
    pub fn count(&self, measure: &str) -> usize {
        self.iter().filter(|r| r.measure(measure).is_some()).count()
    }

    /// Number of rows missing `measure`
    pub fn missing(&self, measure: &str) -> usize {
        self.len() - self.count(measure)
    }

    /// Sum of non-missing values (0 when none)
    pub fn sum(&self, measure: &str) -> f64 {
        self.iter().filter_map(|r| r.measure(measure)).sum()
    }

    /// Mean of non-missing values, `None` when there are none
    pub fn mean(&self, measure: &str) -> Option<f64> {
        let values = self.values(measure);
        if values.is_empty() {
            None
        } else {
            Some(math::mean(&values))
        }
    }

    /// Distinct values of a dimension, sorted
    pub fn distinct(&self, dimension: &str) -> Vec<String> {
        self.iter()
            .filter_map(|r| r.dimension(dimension))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Rows grouped by dimension value; rows without the dimension are skipped
    pub fn group_by(&self, dimension: &str) -> BTreeMap<String, TabularDataset> {
        let mut groups: BTreeMap<String, Vec<Arc<Row>>> = BTreeMap::new();
        for row in &self.rows {
            if let Some(value) = row.dimension(dimension) {
                groups.entry(value.to_string()).or_default().push(Arc::clone(row));
            }
        }
        groups
            .into_iter()
            .map(|(k, rows)| (k, Self::from_shared(rows)))
            .collect()
    }

    /// Whether any row carries the dimension
    pub fn has_dimension(&self, dimension: &str) -> bool {
        self.iter().any(|r| r.dimension(dimension).is_some())
    }

    /// Earliest and latest dates, `None` for an empty dataset
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.iter().map(Row::date).min()?;
        let max = self.iter().map(Row::date).max()?;
        Some((min, max))
    }

    /// Every dimension name appearing in any row
    pub fn dimension_names(&self) -> BTreeSet<String> {
        self.iter()
            .flat_map(|r| r.dimensions().keys().cloned())
            .collect()
    }

    /// Every measure name appearing in any row
    pub fn measure_names(&self) -> BTreeSet<String> {
        self.iter()
            .flat_map(|r| r.measures().keys().cloned())
            .collect()
    }
}

impl FromIterator<Row> for TabularDataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}
