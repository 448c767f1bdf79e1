//! Scalar summary statistics over a date range

use crate::bucketing::{bucket, Bucket};
use serde::{Deserialize, Serialize};
use shopcount_common::{average, CountRecord, DateRange, Granularity};
use std::cmp::Ordering;

/// Aggregates over one date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Sum of `entry_count` over in-range records
    pub total_entries: u64,
    /// Sum of `exit_count` over in-range records
    pub total_exits: u64,
    /// Highest `current_count` over in-range records
    pub max_concurrent: u32,
    /// `total_entries / max(1, days)`, two decimals
    pub avg_daily_entries: f64,
    /// Number of calendar days in the range
    pub days: i64,
    /// Granularity used to find the busiest sub-period
    pub sub_period: Granularity,
    /// Key of the bucket with the most entries
    pub busiest_sub_period: Option<String>,
    /// Entries in the busiest bucket, 0 when absent
    pub busiest_sub_period_entries: u64,
}

/// Summarizes `records` over `range`, finding the busiest bucket at
/// `sub_granularity`. Records outside `[start, end)` are ignored.
pub fn summarize(
    records: &[CountRecord],
    range: &DateRange,
    sub_granularity: Granularity,
) -> PeriodSummary {
    let in_range = within(records, range);

    let total_entries = in_range.iter().map(|r| u64::from(r.entry_count)).sum();
    let total_exits = in_range.iter().map(|r| u64::from(r.exit_count)).sum();
    let max_concurrent = in_range.iter().map(|r| r.current_count).max().unwrap_or(0);

    let buckets = bucket(&in_range, sub_granularity);
    let busiest = busiest_bucket(&buckets);

    let days = range.days();
    PeriodSummary {
        total_entries,
        total_exits,
        max_concurrent,
        avg_daily_entries: average(total_entries, u64::try_from(days.max(1)).unwrap_or(1)),
        days,
        sub_period: sub_granularity,
        busiest_sub_period: busiest.map(|b| b.bucket_key.clone()),
        busiest_sub_period_entries: busiest.map_or(0, |b| b.entries),
    }
}

/// Records whose timestamp falls inside `range`, cloned.
pub fn within(records: &[CountRecord], range: &DateRange) -> Vec<CountRecord> {
    records
        .iter()
        .filter(|record| range.contains(&record.timestamp))
        .cloned()
        .collect()
}

/// Bucket with the strictly largest entries; the earliest wins a tie.
///
/// Expects `buckets` in ascending key order, as produced by [`bucket`].
pub fn busiest_bucket(buckets: &[Bucket]) -> Option<&Bucket> {
    let mut iter = buckets.iter();
    let mut best = iter.next()?;
    for candidate in iter {
        if candidate.entries > best.entries {
            best = candidate;
        }
    }
    Some(best)
}

/// Up to `limit` buckets ordered by entries descending, then key ascending.
pub fn busiest_buckets(buckets: &[Bucket], limit: usize) -> Vec<Bucket> {
    let mut ranked = buckets.to_vec();
    ranked.sort_by(|a, b| match b.entries.cmp(&a.entries) {
        Ordering::Equal => a.bucket_key.cmp(&b.bucket_key),
        other => other,
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopcount_common::test_utils::{assert_approx_eq, mock_date, mock_timestamp, record};

    fn week() -> DateRange {
        DateRange::inclusive(mock_date(2024, 1, 1), mock_date(2024, 1, 7)).unwrap()
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[], &week(), Granularity::Day);
        assert_eq!(summary.total_entries, 0);
        assert_eq!(summary.total_exits, 0);
        assert_eq!(summary.max_concurrent, 0);
        assert_approx_eq(summary.avg_daily_entries, 0.0, 1e-9);
        assert!(summary.busiest_sub_period.is_none());
        assert_eq!(summary.busiest_sub_period_entries, 0);
        assert_eq!(summary.days, 7);
    }

    #[test]
    fn test_average_over_seven_days() {
        let records: Vec<CountRecord> = (1..=7)
            .map(|day| record(mock_timestamp(2024, 1, day, 12, 0, 0), 20, 18, 5))
            .collect();
        let summary = summarize(&records, &week(), Granularity::Day);
        assert_eq!(summary.total_entries, 140);
        assert_approx_eq(summary.avg_daily_entries, 20.0, 1e-9);
    }

    #[test]
    fn test_out_of_range_records_excluded() {
        let records = vec![
            record(mock_timestamp(2023, 12, 31, 23, 59, 59), 100, 0, 50),
            record(mock_timestamp(2024, 1, 3, 10, 0, 0), 4, 2, 3),
            record(mock_timestamp(2024, 1, 8, 0, 0, 0), 100, 0, 50),
        ];
        let summary = summarize(&records, &week(), Granularity::Day);
        assert_eq!(summary.total_entries, 4);
        assert_eq!(summary.total_exits, 2);
        assert_eq!(summary.max_concurrent, 3);
        assert_eq!(summary.busiest_sub_period.as_deref(), Some("2024-01-03"));
    }

    #[test]
    fn test_busiest_tie_prefers_earliest() {
        let records = vec![
            record(mock_timestamp(2024, 1, 5, 9, 0, 0), 10, 0, 1),
            record(mock_timestamp(2024, 1, 2, 9, 0, 0), 10, 0, 1),
            record(mock_timestamp(2024, 1, 4, 9, 0, 0), 3, 0, 1),
        ];
        let summary = summarize(&records, &week(), Granularity::Day);
        assert_eq!(summary.busiest_sub_period.as_deref(), Some("2024-01-02"));
        assert_eq!(summary.busiest_sub_period_entries, 10);
    }

    #[test]
    fn test_busiest_hour_is_dated() {
        let day = DateRange::single_day(mock_date(2024, 1, 1)).unwrap();
        let records = vec![
            record(mock_timestamp(2024, 1, 1, 9, 10, 0), 2, 0, 2),
            record(mock_timestamp(2024, 1, 1, 17, 30, 0), 6, 1, 8),
        ];
        let summary = summarize(&records, &day, Granularity::Hour);
        assert_eq!(summary.busiest_sub_period.as_deref(), Some("2024-01-01 17:00:00"));
    }

    #[test]
    fn test_busiest_present_for_zero_entry_records() {
        let day = DateRange::single_day(mock_date(2024, 1, 1)).unwrap();
        let records = vec![record(mock_timestamp(2024, 1, 1, 9, 0, 0), 0, 0, 4)];
        let summary = summarize(&records, &day, Granularity::Hour);
        assert_eq!(summary.busiest_sub_period.as_deref(), Some("2024-01-01 09:00:00"));
        assert_eq!(summary.busiest_sub_period_entries, 0);
    }

    #[test]
    fn test_busiest_buckets_ordering() {
        let buckets = vec![
            Bucket { bucket_key: "a".into(), entries: 3, exits: 0, max_count: 0 },
            Bucket { bucket_key: "b".into(), entries: 9, exits: 0, max_count: 0 },
            Bucket { bucket_key: "c".into(), entries: 3, exits: 0, max_count: 0 },
            Bucket { bucket_key: "d".into(), entries: 1, exits: 0, max_count: 0 },
        ];
        let keys: Vec<String> = busiest_buckets(&buckets, 3)
            .into_iter()
            .map(|b| b.bucket_key)
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
