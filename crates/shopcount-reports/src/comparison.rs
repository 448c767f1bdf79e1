//! Period-over-period comparison of count totals

use crate::summary::within;
use serde::{Deserialize, Serialize};
use shopcount_common::{percent_change, CountRecord, DateRange};

/// Totals for one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    /// Range the totals cover
    pub range: DateRange,
    /// Sum of `entry_count`
    pub entries: u64,
    /// Sum of `exit_count`
    pub exits: u64,
    /// Highest `current_count`
    pub max_count: u32,
}

impl PeriodTotals {
    /// Totals of the records inside `range`.
    pub fn from_records(records: &[CountRecord], range: DateRange) -> Self {
        let in_range = within(records, &range);
        Self {
            range,
            entries: in_range.iter().map(|r| u64::from(r.entry_count)).sum(),
            exits: in_range.iter().map(|r| u64::from(r.exit_count)).sum(),
            max_count: in_range.iter().map(|r| r.current_count).max().unwrap_or(0),
        }
    }
}

/// Percent change per metric from period 1 to period 2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    /// Change in entries, percent
    pub entries_change: f64,
    /// Change in exits, percent
    pub exits_change: f64,
    /// Change in maximum occupancy, percent
    pub max_count_change: f64,
}

/// Direction of change between periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthDirection {
    /// Period 2 is higher
    Positive,
    /// Period 2 is lower
    Negative,
    /// No change
    Neutral,
}

impl GrowthDirection {
    /// Direction of a percent change.
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Self::Positive
        } else if change < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Totals for two ranges and the change between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Baseline period
    pub period1: PeriodTotals,
    /// Compared period
    pub period2: PeriodTotals,
    /// Percent changes from `period1` to `period2`
    pub changes: Changes,
    /// Direction of the entries change
    pub trend: GrowthDirection,
}

/// Compares `records_b` over `range_b` against `records_a` over `range_a`.
///
/// Each side only counts records inside its own range. The ranges may
/// overlap or appear in any order.
pub fn compare(
    records_a: &[CountRecord],
    range_a: DateRange,
    records_b: &[CountRecord],
    range_b: DateRange,
) -> ComparisonResult {
    let period1 = PeriodTotals::from_records(records_a, range_a);
    let period2 = PeriodTotals::from_records(records_b, range_b);

    let changes = Changes {
        entries_change: percent_change(period1.entries, period2.entries),
        exits_change: percent_change(period1.exits, period2.exits),
        max_count_change: percent_change(
            u64::from(period1.max_count),
            u64::from(period2.max_count),
        ),
    };

    ComparisonResult {
        period1,
        period2,
        trend: GrowthDirection::of(changes.entries_change),
        changes,
    }
}
