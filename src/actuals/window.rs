//! Reconciliation window over a study's actuals

use super::records::{LatestActualsSnapshot, TimeseriesPoint};
use crate::calendar::CalendarDate;
use crate::error::{ActualsError, Result};
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` day range the dense series are produced over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub min: CalendarDate,
    pub max: CalendarDate,
}

impl DateWindow {
    pub fn new(min: CalendarDate, max: CalendarDate) -> Self {
        Self { min, max }
    }

    /// Number of days covered, 0 when `min > max`
    pub fn len_days(&self) -> usize {
        let span = self.max.days_since(self.min);
        if span < 0 {
            0
        } else {
            span as usize + 1
        }
    }

    pub fn contains(&self, date: CalendarDate) -> bool {
        self.min <= date && date <= self.max
    }

    /// Every day from `min` to `max` in ascending order
    pub fn days(&self) -> WindowDays {
        WindowDays {
            next: (self.min <= self.max).then_some(self.min),
            max: self.max,
        }
    }
}

/// Iterator over the days of a [`DateWindow`]
#[derive(Debug, Clone)]
pub struct WindowDays {
    next: Option<CalendarDate>,
    max: CalendarDate,
}

impl Iterator for WindowDays {
    type Item = CalendarDate;

    fn next(&mut self) -> Option<CalendarDate> {
        let current = self.next?;
        self.next = current.succ().filter(|d| *d <= self.max);
        Some(current)
    }
}

/// Window spanning every time-series date and every parseable snapshot date.
///
/// Inputs may cover several countries. Snapshots whose `latest_date` does not
/// parse are left out. Fails with [`ActualsError::EmptyDateRange`] when no
/// date remains.
pub fn compute_window(
    timeseries: &[TimeseriesPoint],
    snapshots: &[LatestActualsSnapshot],
) -> Result<DateWindow> {
    let dates = timeseries
        .iter()
        .map(|point| point.date)
        .chain(snapshots.iter().filter_map(LatestActualsSnapshot::latest_date));

    let mut bounds: Option<(CalendarDate, CalendarDate)> = None;
    for date in dates {
        bounds = Some(match bounds {
            None => (date, date),
            Some((min, max)) => (min.min(date), max.max(date)),
        });
    }

    bounds
        .map(|(min, max)| DateWindow::new(min, max))
        .ok_or(ActualsError::EmptyDateRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        CalendarDate::parse(s).unwrap()
    }

    fn snapshot(country_id: u32, latest: &str) -> LatestActualsSnapshot {
        LatestActualsSnapshot {
            country_id: Some(country_id),
            latest_date: Some(latest.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_window_spans_all_countries() {
        let timeseries = vec![
            TimeseriesPoint::actual(1, date("2024-01-10"), 1.0, 1.0, 1.0),
            TimeseriesPoint::actual(2, date("2024-01-03"), 1.0, 1.0, 1.0),
            TimeseriesPoint::actual(1, date("2024-01-05"), 1.0, 1.0, 1.0),
        ];
        let snapshots = vec![snapshot(1, "2024-01-20")];

        let window = compute_window(&timeseries, &snapshots).unwrap();
        assert_eq!(window.min, date("2024-01-03"));
        assert_eq!(window.max, date("2024-01-20"));
        assert_eq!(window.len_days(), 18);
    }

    #[test]
    fn test_window_from_snapshots_only() {
        let window = compute_window(&[], &[snapshot(1, "2024-03-01")]).unwrap();
        assert_eq!(window.min, window.max);
        assert_eq!(window.len_days(), 1);
    }

    #[test]
    fn test_window_skips_unparseable_snapshot_dates() {
        let timeseries = vec![TimeseriesPoint::actual(1, date("2024-01-10"), 1.0, 1.0, 1.0)];
        let snapshots = vec![snapshot(1, "garbage"), snapshot(2, "2024-02-30")];

        let window = compute_window(&timeseries, &snapshots).unwrap();
        assert_eq!(window, DateWindow::new(date("2024-01-10"), date("2024-01-10")));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(compute_window(&[], &[]), Err(ActualsError::EmptyDateRange)));
        let unusable = vec![LatestActualsSnapshot::default()];
        assert!(matches!(compute_window(&[], &unusable), Err(ActualsError::EmptyDateRange)));
    }

    #[test]
    fn test_days_iteration() {
        let window = DateWindow::new(date("2024-02-27"), date("2024-03-01"));
        let days: Vec<String> = window.days().map(|d| d.to_string()).collect();
        assert_eq!(days, vec!["2024-02-27", "2024-02-28", "2024-02-29", "2024-03-01"]);

        let inverted = DateWindow::new(date("2024-03-01"), date("2024-02-27"));
        assert_eq!(inverted.days().count(), 0);
        assert_eq!(inverted.len_days(), 0);
    }
}
