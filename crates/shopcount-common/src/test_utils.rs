//! Test utilities and shared fixtures.
//!
//! Available to other crates through the `testing` feature.

use crate::types::{BranchId, CountRecord};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call multiple times.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Test fixture for creating a naive local timestamp.
///
/// # Panics
///
/// Panics when the components do not form a valid timestamp.
pub fn mock_timestamp(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    min: u32,
    sec: u32,
) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .expect("invalid mock timestamp")
}

/// Test fixture for a calendar date.
///
/// # Panics
///
/// Panics when the components do not form a valid date.
pub fn mock_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("invalid mock date")
}

/// Branch used by fixtures.
pub fn test_branch() -> BranchId {
    BranchId::from("BKK-001")
}

/// Builds a record for [`test_branch`].
pub fn record(timestamp: NaiveDateTime, entries: u32, exits: u32, current: u32) -> CountRecord {
    CountRecord::new(test_branch(), timestamp, entries, exits, current)
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
///
/// # Panics
///
/// Panics when the difference exceeds `tolerance`.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_init_logging_multiple_calls() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_mock_timestamp() {
        let timestamp = mock_timestamp(2024, 1, 1, 12, 0, 0);
        assert_eq!(timestamp.year(), 2024);
        assert_eq!(timestamp.hour(), 12);
    }

    #[test]
    fn test_record_fixture() {
        let r = record(mock_timestamp(2024, 1, 1, 9, 0, 0), 5, 2, 3);
        assert_eq!(r.branch_id, test_branch());
        assert_eq!(r.entry_count, 5);
        assert!(r.camera_id.is_none());
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.05);
    }
}
