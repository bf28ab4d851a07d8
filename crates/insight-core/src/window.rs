//! Closed date intervals and the current/comparison window pair

use crate::{Error, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed date interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// First day of the window (inclusive)
    pub start: NaiveDate,
    /// Last day of the window (inclusive)
    pub end: NaiveDate,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidParameter(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Window of `days` days ending on `end` (inclusive)
    pub fn ending_at(end: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(Error::InvalidParameter(
                "window length must be at least one day".to_string(),
            ));
        }
        Self::new(days_before(end, i64::from(days) - 1)?, end)
    }

    /// Whether `date` falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// The two disjoint windows every analysis contrasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPair {
    /// Most recent window under analysis
    pub current: TimeWindow,
    /// Baseline window preceding `current`
    pub comparison: TimeWindow,
}

impl WindowPair {
    /// Pair two windows, requiring the comparison to end before the current one starts
    pub fn new(current: TimeWindow, comparison: TimeWindow) -> Result<Self> {
        if comparison.end >= current.start {
            return Err(Error::OverlappingWindows {
                comparison_end: comparison.end,
                current_start: current.start,
            });
        }
        Ok(Self {
            current,
            comparison,
        })
    }

    /// Back-to-back windows of `lookback_days` each, the current one ending on `max_date`
    pub fn trailing(max_date: NaiveDate, lookback_days: u32) -> Result<Self> {
        let current = TimeWindow::ending_at(max_date, lookback_days)?;
        let comparison = TimeWindow::ending_at(days_before(current.start, 1)?, lookback_days)?;
        Self::new(current, comparison)
    }
}

fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_sub_signed(Duration::days(days)).ok_or_else(|| {
        Error::InvalidParameter(format!("{days} days before {date} is out of the calendar range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = TimeWindow::new(date(2025, 3, 25), date(2025, 3, 31)).unwrap();
        assert!(w.contains(date(2025, 3, 25)));
        assert!(w.contains(date(2025, 3, 31)));
        assert!(!w.contains(date(2025, 3, 24)));
        assert!(!w.contains(date(2025, 4, 1)));
        assert_eq!(w.len_days(), 7);
        assert_eq!(w.to_string(), "2025-03-25 to 2025-03-31");
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(TimeWindow::new(date(2025, 3, 31), date(2025, 3, 1)).is_err());
        assert!(TimeWindow::ending_at(date(2025, 3, 31), 0).is_err());
    }

    #[test]
    fn test_trailing_pair_is_back_to_back() {
        let pair = WindowPair::trailing(date(2025, 3, 31), 7).unwrap();
        assert_eq!(pair.current.start, date(2025, 3, 25));
        assert_eq!(pair.current.end, date(2025, 3, 31));
        assert_eq!(pair.comparison.start, date(2025, 3, 18));
        assert_eq!(pair.comparison.end, date(2025, 3, 24));
    }

    #[test]
    fn test_overlapping_pair_rejected() {
        let current = TimeWindow::new(date(2025, 3, 20), date(2025, 3, 31)).unwrap();
        let comparison = TimeWindow::new(date(2025, 3, 10), date(2025, 3, 20)).unwrap();
        let err = WindowPair::new(current, comparison).unwrap_err();
        assert!(matches!(err, Error::OverlappingWindows { .. }));
    }

    #[test]
    fn test_out_of_range_lookback_rejected() {
        assert!(matches!(
            WindowPair::trailing(date(2025, 3, 31), u32::MAX),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            TimeWindow::ending_at(NaiveDate::MIN, 2),
            Err(Error::InvalidParameter(_))
        ));
    }
}
