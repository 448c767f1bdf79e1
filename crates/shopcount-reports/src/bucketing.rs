//! Grouping of raw count records into fixed-granularity time buckets

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use shopcount_common::{format_timestamp, CountRecord, Granularity};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Aggregated figures for one time slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Formatted slice label, e.g. `2024-01-01 09:00:00` or `2024-W01`
    pub bucket_key: String,
    /// Sum of `entry_count`
    pub entries: u64,
    /// Sum of `exit_count`
    pub exits: u64,
    /// Highest `current_count` observed
    pub max_count: u32,
}

/// Trait for turning raw records into ordered data points
pub trait DataAggregator<T> {
    /// Aggregate `records` into data points sorted by time
    fn aggregate(&self, records: &[CountRecord]) -> Vec<T>;
}

/// Aggregator producing [`Bucket`]s at a fixed granularity
#[derive(Debug, Clone, Copy)]
pub struct BucketAggregator {
    granularity: Granularity,
}

impl BucketAggregator {
    /// Creates an aggregator for `granularity`.
    pub const fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    /// Granularity this aggregator buckets at.
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }
}

impl DataAggregator<Bucket> for BucketAggregator {
    #[instrument(skip(self, records), fields(granularity = %self.granularity, records = records.len()))]
    fn aggregate(&self, records: &[CountRecord]) -> Vec<Bucket> {
        let mut ordered: Vec<&CountRecord> = records.iter().collect();
        ordered.sort_by_key(|record| record.timestamp);

        // Keyed by slice start so ordering stays chronological for any year.
        let mut slices: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();

        for record in ordered {
            let start = slice_start(record.timestamp, self.granularity);
            let bucket = slices.entry(start).or_insert_with(|| Bucket {
                bucket_key: format_key(start, self.granularity),
                entries: 0,
                exits: 0,
                max_count: 0,
            });
            bucket.entries += u64::from(record.entry_count);
            bucket.exits += u64::from(record.exit_count);
            bucket.max_count = bucket.max_count.max(record.current_count);
        }

        let result: Vec<Bucket> = slices.into_values().collect();

        debug!("Aggregated {} {} buckets", result.len(), self.granularity);
        result
    }
}

/// Groups `records` into buckets of `granularity`, ascending by time.
///
/// Slices without records are omitted. An empty input yields an empty output.
pub fn bucket(records: &[CountRecord], granularity: Granularity) -> Vec<Bucket> {
    BucketAggregator::new(granularity).aggregate(records)
}

/// Label of the slice containing `timestamp`.
pub fn bucket_key(timestamp: NaiveDateTime, granularity: Granularity) -> String {
    format_key(slice_start(timestamp, granularity), granularity)
}

/// Start of the slice containing `timestamp`.
pub fn slice_start(timestamp: NaiveDateTime, granularity: Granularity) -> NaiveDateTime {
    let date = timestamp.date();
    match granularity {
        Granularity::Hour => date.and_time(
            NaiveTime::from_hms_opt(timestamp.hour(), 0, 0).unwrap_or(NaiveTime::MIN),
        ),
        Granularity::Day => date.and_time(NaiveTime::MIN),
        Granularity::Week => monday_of(date).and_time(NaiveTime::MIN),
        Granularity::Month => date
            .with_day(1)
            .unwrap_or(date)
            .and_time(NaiveTime::MIN),
    }
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(NaiveDate::MIN)
}

fn format_key(start: NaiveDateTime, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hour => format_timestamp(start),
        Granularity::Day => start.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let week = start.date().iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        Granularity::Month => start.format("%Y-%m").to_string(),
    }
}
