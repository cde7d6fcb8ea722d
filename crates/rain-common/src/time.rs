//! Coverage-window time math.
//!
//! The ingestion target is always "now through the end of the current
//! month"; everything downstream works in fractional hours relative to a
//! model run's start time.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The absolute time window a forecast remainder must cover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CoverageWindow {
    /// Window from `now` through the last second of the current month.
    ///
    /// Returns `None` when `now` already sits past the month end (can only
    /// happen with a skewed clock; the caller logs and skips the cycle).
    pub fn remaining_month(now: DateTime<Utc>) -> Option<Self> {
        let end = month_end(now);
        if now > end {
            return None;
        }
        Some(Self { start: now, end })
    }

    /// Window offsets in fractional hours relative to a model run.
    ///
    /// The start offset clamps at zero: lead times before the run itself
    /// are never requested.
    pub fn offsets_from(&self, run_time: DateTime<Utc>) -> (f64, f64) {
        let start = self.start.max(run_time);
        (
            hours_between(run_time, start),
            hours_between(run_time, self.end),
        )
    }
}

/// Last second of the month containing `t`.
pub fn month_end(t: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if t.month() == 12 {
        (t.year() + 1, 1)
    } else {
        (t.year(), t.month() + 1)
    };
    // First instant of next month is always a valid timestamp
    let next_month = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(t);
    next_month - Duration::seconds(1)
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_month_end_mid_month() {
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 9, 30, 0).unwrap();
        let end = month_end(now);
        assert_eq!((end.year(), end.month(), end.day()), (2024, 11, 30));
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
    }

    #[test]
    fn test_month_end_december_rollover() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let end = month_end(now);
        assert_eq!((end.year(), end.month(), end.day()), (2024, 12, 31));
    }

    #[test]
    fn test_offsets_run_before_window_start() {
        let run = Utc.with_ymd_and_hms(2024, 11, 18, 6, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 9, 30, 0).unwrap();
        let window = CoverageWindow::remaining_month(now).unwrap();

        let (start, end) = window.offsets_from(run);
        assert!((start - 3.5).abs() < 1e-9);
        // 2024-11-30T23:59:59 is 305h 59m 59s after the run
        assert!((end - (305.0 + 59.0 / 60.0 + 59.0 / 3600.0)).abs() < 1e-6);
    }

    #[test]
    fn test_offsets_run_after_window_start() {
        // A run newer than `now` clamps the start offset to zero
        let now = Utc.with_ymd_and_hms(2024, 11, 18, 5, 0, 0).unwrap();
        let run = Utc.with_ymd_and_hms(2024, 11, 18, 6, 0, 0).unwrap();
        let window = CoverageWindow::remaining_month(now).unwrap();

        let (start, _) = window.offsets_from(run);
        assert_eq!(start, 0.0);
    }
}
