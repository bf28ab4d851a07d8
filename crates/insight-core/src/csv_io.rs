//! CSV ingestion into a [`TabularDataset`]
//!
//! The header row drives decoding: the date column is parsed with the
//! configured format, the configured measure columns become numeric measures
//! (empty cells are missing) and every other column becomes a dimension.

use crate::{Error, Result, Row, TabularDataset};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Column layout expected from an ads performance export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSchema {
    pub date_column: String,
    pub date_format: String,
    pub measure_columns: Vec<String>,
    /// Fill `ctr` and `roas` from their components when a row lacks them
    pub derive_ratios: bool,
}

impl Default for CsvSchema {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            date_format: "%Y-%m-%d".to_string(),
            measure_columns: ["spend", "revenue", "clicks", "impressions", "purchases", "ctr", "roas"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            derive_ratios: true,
        }
    }
}

impl TabularDataset {
    /// Decode CSV text from any reader
    pub fn from_csv_reader<R: Read>(reader: R, schema: &CsvSchema) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let date_idx = headers
            .iter()
            .position(|h| h == schema.date_column)
            .ok_or_else(|| Error::MissingColumn(schema.date_column.clone()))?;

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // Header is line 1
            let line = i + 2;

            let raw_date = record.get(date_idx).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, &schema.date_format)
                .map_err(|_| Error::unparsable(&schema.date_column, raw_date, line))?;

            let mut row = Row::new(date);
            for (idx, (name, value)) in headers.iter().zip(record.iter()).enumerate() {
                if idx == date_idx || value.is_empty() {
                    continue;
                }
                if schema.measure_columns.iter().any(|m| m == name) {
                    if value.eq_ignore_ascii_case("nan") {
                        continue;
                    }
                    let parsed: f64 = value
                        .parse()
                        .map_err(|_| Error::unparsable(name, value, line))?;
                    row = row.with_measure(name, parsed);
                } else {
                    row = row.with_dimension(name, value);
                }
            }

            if schema.derive_ratios {
                row = derive_ratios(row);
            }
            rows.push(row);
        }

        debug!(rows = rows.len(), "decoded CSV dataset");
        Ok(TabularDataset::from_rows(rows))
    }

    /// Decode a CSV file
    pub fn from_csv_path(path: impl AsRef<Path>, schema: &CsvSchema) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file, schema)
    }
}

fn derive_ratios(mut row: Row) -> Row {
    if row.measure("roas").is_none() {
        if let (Some(revenue), Some(spend)) = (row.measure("revenue"), row.measure("spend")) {
            if spend > 0.0 {
                row = row.with_measure("roas", revenue / spend);
            }
        }
    }
    if row.measure("ctr").is_none() {
        if let (Some(clicks), Some(impressions)) = (row.measure("clicks"), row.measure("impressions")) {
            if impressions > 0.0 {
                row = row.with_measure("ctr", clicks / impressions);
            }
        }
    }
    row
}
