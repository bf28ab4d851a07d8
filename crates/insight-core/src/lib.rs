//! Core types for campaign insight analysis
//!
//! This crate holds the shared leaf of the workspace: an immutable, row
//! oriented [`TabularDataset`] with the filtering and aggregation primitives
//! the scheduler-driven pipeline and the hypothesis validator both build on,
//! the [`TimeWindow`]/[`WindowPair`] model of the two contrasted periods, and
//! the common [`Error`] type.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use insight_core::{Row, TabularDataset, WindowPair};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
//! let ds = TabularDataset::from_rows(vec![
//!     Row::new(day(24)).with_dimension("platform", "Facebook").with_measure("roas", 3.0),
//!     Row::new(day(31)).with_dimension("platform", "Facebook").with_measure("roas", 2.0),
//! ]);
//!
//! let windows = WindowPair::trailing(day(31), 7).unwrap();
//! assert_eq!(ds.window(&windows.current).mean("roas"), Some(2.0));
//! assert_eq!(ds.window(&windows.comparison).mean("roas"), Some(3.0));
//! ```

pub mod csv_io;
pub mod dataset;
pub mod error;
pub mod math;
pub mod profile;
pub mod window;

pub use csv_io::CsvSchema;
pub use dataset::{Row, TabularDataset};
pub use error::{Error, Result};
pub use profile::{DataQuality, DatasetProfile};
pub use window::{TimeWindow, WindowPair};
