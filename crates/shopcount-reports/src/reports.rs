//! Report documents built from fetched records

use crate::bucketing::{bucket, Bucket};
use crate::comparison::{compare, ComparisonResult};
use crate::formatter::{format_optional, format_percent, CsvSheet, TabularReport};
use crate::summary::{busiest_bucket, busiest_buckets, summarize, within, PeriodSummary};
use chrono::NaiveDateTime;
use serde::Serialize;
use shopcount_common::{BranchInfo, CountRecord, DateRange, Granularity, Result};

/// Hourly breakdown of a single day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    /// Branch covered
    pub branch: BranchInfo,
    /// The day, as a one-day range
    pub range: DateRange,
    /// Hourly buckets
    pub hourly: Vec<Bucket>,
    /// Totals with the busiest hour
    pub summary: PeriodSummary,
}

impl DailyReport {
    /// Builds the report for the one-day `range`.
    pub fn build(branch: BranchInfo, range: DateRange, records: &[CountRecord]) -> Self {
        let in_range = within(records, &range);
        Self {
            hourly: bucket(&in_range, Granularity::Hour),
            summary: summarize(&in_range, &range, Granularity::Hour),
            branch,
            range,
        }
    }
}

impl TabularReport for DailyReport {
    fn report_type(&self) -> &'static str {
        "daily_report"
    }

    fn branch(&self) -> &BranchInfo {
        &self.branch
    }

    fn period_label(&self) -> String {
        self.range.start().format("%Y-%m-%d").to_string()
    }

    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()> {
        sheet.header("Daily Report", &self.period_label(), &self.branch)?;
        sheet.bucket_table("Hour", &self.hourly)?;
        sheet.summary_block(&[
            ("Total Entries", self.summary.total_entries.to_string()),
            ("Total Exits", self.summary.total_exits.to_string()),
            ("Max Concurrent", self.summary.max_concurrent.to_string()),
            ("Busiest Hour", format_optional(self.summary.busiest_sub_period.as_deref())),
            ("Busiest Hour Entries", self.summary.busiest_sub_period_entries.to_string()),
        ])
    }
}

/// Daily breakdown of a Monday-start week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    /// Branch covered
    pub branch: BranchInfo,
    /// The seven-day range
    pub range: DateRange,
    /// Daily buckets
    pub daily: Vec<Bucket>,
    /// Totals with the busiest day
    pub summary: PeriodSummary,
}

impl WeeklyReport {
    /// Builds the report for the week `range`.
    pub fn build(branch: BranchInfo, range: DateRange, records: &[CountRecord]) -> Self {
        let in_range = within(records, &range);
        Self {
            daily: bucket(&in_range, Granularity::Day),
            summary: summarize(&in_range, &range, Granularity::Day),
            branch,
            range,
        }
    }
}

impl TabularReport for WeeklyReport {
    fn report_type(&self) -> &'static str {
        "weekly_report"
    }

    fn branch(&self) -> &BranchInfo {
        &self.branch
    }

    fn period_label(&self) -> String {
        self.range.label()
    }

    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()> {
        sheet.header("Weekly Report", &self.range.to_string(), &self.branch)?;
        sheet.bucket_table("Date", &self.daily)?;
        sheet.summary_block(&[
            ("Total Entries", self.summary.total_entries.to_string()),
            ("Total Exits", self.summary.total_exits.to_string()),
            ("Average Daily Entries", format!("{:.2}", self.summary.avg_daily_entries)),
            ("Max Concurrent", self.summary.max_concurrent.to_string()),
            ("Busiest Day", format_optional(self.summary.busiest_sub_period.as_deref())),
            ("Busiest Day Entries", self.summary.busiest_sub_period_entries.to_string()),
        ])
    }
}

/// Daily and weekly breakdown of a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    /// Branch covered
    pub branch: BranchInfo,
    /// Month as `YYYY-MM`
    pub month: String,
    /// First to last day of the month
    pub range: DateRange,
    /// Daily buckets
    pub daily: Vec<Bucket>,
    /// ISO-week buckets
    pub weekly: Vec<Bucket>,
    /// Totals with the busiest day
    pub summary: PeriodSummary,
    /// ISO week with the most entries
    pub busiest_week: Option<String>,
    /// Entries in the busiest week, 0 when absent
    pub busiest_week_entries: u64,
}

impl MonthlyReport {
    /// Builds the report for the month `range`.
    pub fn build(branch: BranchInfo, range: DateRange, records: &[CountRecord]) -> Self {
        let in_range = within(records, &range);
        let weekly = bucket(&in_range, Granularity::Week);
        let busiest = busiest_bucket(&weekly);
        let busiest_week = busiest.map(|b| b.bucket_key.clone());
        let busiest_week_entries = busiest.map_or(0, |b| b.entries);

        Self {
            month: range.start().format("%Y-%m").to_string(),
            daily: bucket(&in_range, Granularity::Day),
            summary: summarize(&in_range, &range, Granularity::Day),
            weekly,
            busiest_week,
            busiest_week_entries,
            branch,
            range,
        }
    }
}

impl TabularReport for MonthlyReport {
    fn report_type(&self) -> &'static str {
        "monthly_report"
    }

    fn branch(&self) -> &BranchInfo {
        &self.branch
    }

    fn period_label(&self) -> String {
        self.month.clone()
    }

    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()> {
        sheet.header("Monthly Report", &self.month, &self.branch)?;
        sheet.row(["Daily"])?;
        sheet.bucket_table("Date", &self.daily)?;
        sheet.blank()?;
        sheet.row(["Weekly"])?;
        sheet.bucket_table("Week", &self.weekly)?;
        sheet.summary_block(&[
            ("Total Entries", self.summary.total_entries.to_string()),
            ("Total Exits", self.summary.total_exits.to_string()),
            ("Average Daily Entries", format!("{:.2}", self.summary.avg_daily_entries)),
            ("Max Concurrent", self.summary.max_concurrent.to_string()),
            ("Busiest Day", format_optional(self.summary.busiest_sub_period.as_deref())),
            ("Busiest Day Entries", self.summary.busiest_sub_period_entries.to_string()),
            ("Busiest Week", format_optional(self.busiest_week.as_deref())),
            ("Busiest Week Entries", self.busiest_week_entries.to_string()),
        ])
    }
}

/// Buckets at an arbitrary granularity over an arbitrary range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryReport {
    /// Branch covered
    pub branch: BranchInfo,
    /// Range covered
    pub range: DateRange,
    /// Bucket granularity
    pub interval: Granularity,
    /// Buckets in ascending order
    pub buckets: Vec<Bucket>,
}

impl HistoryReport {
    /// Builds the report for `range` at `interval`.
    pub fn build(
        branch: BranchInfo,
        range: DateRange,
        interval: Granularity,
        records: &[CountRecord],
    ) -> Self {
        let in_range = within(records, &range);
        Self {
            buckets: bucket(&in_range, interval),
            branch,
            range,
            interval,
        }
    }
}

impl TabularReport for HistoryReport {
    fn report_type(&self) -> &'static str {
        "history_report"
    }

    fn branch(&self) -> &BranchInfo {
        &self.branch
    }

    fn period_label(&self) -> String {
        format!("{}_{}", self.range.label(), self.interval)
    }

    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()> {
        sheet.header("History Report", &self.range.to_string(), &self.branch)?;
        sheet.bucket_table(self.interval.as_str(), &self.buckets)?;
        sheet.summary_block(&[
            ("Buckets", self.buckets.len().to_string()),
            ("Total Entries", self.buckets.iter().map(|b| b.entries).sum::<u64>().to_string()),
            ("Total Exits", self.buckets.iter().map(|b| b.exits).sum::<u64>().to_string()),
            (
                "Max Count",
                self.buckets.iter().map(|b| b.max_count).max().unwrap_or(0).to_string(),
            ),
        ])
    }
}

/// Period totals plus the busiest dated hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    /// Branch covered
    pub branch: BranchInfo,
    /// Range covered
    pub range: DateRange,
    /// Totals with the busiest day
    pub summary: PeriodSummary,
    /// Busiest hourly buckets, entries descending then key ascending
    pub busy_periods: Vec<Bucket>,
}

impl SummaryReport {
    /// Builds the report for `range`, listing up to `busy_period_limit` hours.
    pub fn build(
        branch: BranchInfo,
        range: DateRange,
        busy_period_limit: usize,
        records: &[CountRecord],
    ) -> Self {
        let in_range = within(records, &range);
        let hourly = bucket(&in_range, Granularity::Hour);
        Self {
            summary: summarize(&in_range, &range, Granularity::Day),
            busy_periods: busiest_buckets(&hourly, busy_period_limit),
            branch,
            range,
        }
    }
}

impl TabularReport for SummaryReport {
    fn report_type(&self) -> &'static str {
        "summary_report"
    }

    fn branch(&self) -> &BranchInfo {
        &self.branch
    }

    fn period_label(&self) -> String {
        self.range.label()
    }

    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()> {
        sheet.header("Summary Report", &self.range.to_string(), &self.branch)?;
        sheet.bucket_table("Busy Hour", &self.busy_periods)?;
        sheet.summary_block(&[
            ("Total Entries", self.summary.total_entries.to_string()),
            ("Total Exits", self.summary.total_exits.to_string()),
            ("Average Daily Entries", format!("{:.2}", self.summary.avg_daily_entries)),
            ("Max Concurrent", self.summary.max_concurrent.to_string()),
            ("Busiest Day", format_optional(self.summary.busiest_sub_period.as_deref())),
        ])
    }
}

/// Two periods side by side with percent changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Branch covered
    pub branch: BranchInfo,
    /// Totals and changes
    #[serde(flatten)]
    pub comparison: ComparisonResult,
}

impl ComparisonReport {
    /// Builds the report comparing `period2` against `period1`.
    pub fn build(
        branch: BranchInfo,
        period1: DateRange,
        records1: &[CountRecord],
        period2: DateRange,
        records2: &[CountRecord],
    ) -> Self {
        Self {
            branch,
            comparison: compare(records1, period1, records2, period2),
        }
    }
}

impl TabularReport for ComparisonReport {
    fn report_type(&self) -> &'static str {
        "comparison_report"
    }

    fn branch(&self) -> &BranchInfo {
        &self.branch
    }

    fn period_label(&self) -> String {
        format!(
            "{}_vs_{}",
            self.comparison.period1.range.start().format("%Y-%m-%d"),
            self.comparison.period2.range.start().format("%Y-%m-%d")
        )
    }

    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()> {
        let periods = format!(
            "{} vs {}",
            self.comparison.period1.range.start().format("%Y-%m-%d"),
            self.comparison.period2.range.start().format("%Y-%m-%d")
        );
        sheet.header("Comparison Report", &periods, &self.branch)?;

        for (label, period) in [
            ("Period 1", &self.comparison.period1),
            ("Period 2", &self.comparison.period2),
        ] {
            let start = period.range.start().format("%Y-%m-%d").to_string();
            let last = period.range.last_day().format("%Y-%m-%d").to_string();
            sheet.row([label, start.as_str(), "to", last.as_str()])?;
            sheet.row(["Entries".to_string(), period.entries.to_string()])?;
            sheet.row(["Exits".to_string(), period.exits.to_string()])?;
            sheet.row(["Max Count".to_string(), period.max_count.to_string()])?;
            sheet.blank()?;
        }

        let changes = &self.comparison.changes;
        sheet.row(["Change (%)"])?;
        sheet.row(["Entries".to_string(), format_percent(changes.entries_change)])?;
        sheet.row(["Exits".to_string(), format_percent(changes.exits_change)])?;
        sheet.row(["Max Count".to_string(), format_percent(changes.max_count_change)])
    }
}

/// Latest observation of one camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraOccupancy {
    /// Camera id, when the device reported one
    pub camera_id: Option<String>,
    /// Occupancy seen by the camera
    pub current_count: u32,
    /// Time of the observation
    pub timestamp: NaiveDateTime,
}

/// Current occupancy of a branch, summed over cameras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentOccupancy {
    /// Branch covered
    pub branch: BranchInfo,
    /// Sum of the cameras' latest `current_count`
    pub current_count: u64,
    /// Latest observation per camera
    pub cameras: Vec<CameraOccupancy>,
    /// Most recent observation time across cameras
    pub last_updated: Option<NaiveDateTime>,
}

impl CurrentOccupancy {
    /// Builds the occupancy view from the latest record of each camera.
    pub fn build(branch: BranchInfo, latest: &[CountRecord]) -> Self {
        let mut cameras: Vec<CameraOccupancy> = latest
            .iter()
            .map(|record| CameraOccupancy {
                camera_id: record.camera_id.clone(),
                current_count: record.current_count,
                timestamp: record.timestamp,
            })
            .collect();
        cameras.sort_by(|a, b| a.camera_id.cmp(&b.camera_id));

        Self {
            current_count: cameras.iter().map(|c| u64::from(c.current_count)).sum(),
            last_updated: cameras.iter().map(|c| c.timestamp).max(),
            cameras,
            branch,
        }
    }
}
