//! Report service tying the store to the aggregation core

use crate::reports::{
    ComparisonReport, CurrentOccupancy, DailyReport, HistoryReport, MonthlyReport, SummaryReport,
    WeeklyReport,
};
use crate::request::today_in;
use crate::store::CountRecordStore;
use chrono::NaiveDate;
use chrono_tz::Tz;
use shopcount_common::{BranchId, BranchInfo, DateRange, Granularity, ReportFormat, Result, ShopCountError};
use shopcount_config::{ConfigCache, ReportsConfig};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Limits and defaults applied by [`ReportService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Timezone used to determine "today"
    pub timezone: Tz,
    /// Longest accepted range in days
    pub max_range_days: u32,
    /// Format used when a request does not name one
    pub default_format: ReportFormat,
    /// Number of busy hours listed in summaries
    pub busy_period_limit: usize,
}

impl ReportSettings {
    /// Builds settings from the `reports` configuration section.
    pub fn from_config(config: &ReportsConfig) -> Result<Self> {
        Ok(Self {
            timezone: config.tz()?,
            max_range_days: config.max_range_days,
            default_format: config.default_format,
            busy_period_limit: config.busy_period_limit,
        })
    }
}

/// Fetches records for a request and builds the matching report.
///
/// Settings are read from the shared [`ConfigCache`] on every request, so a
/// configuration reload applies without restarting the service.
pub struct ReportService<S> {
    store: S,
    config: Arc<ConfigCache>,
}

impl<S: CountRecordStore> ReportService<S> {
    /// Creates a service over `store`.
    pub const fn new(store: S, config: Arc<ConfigCache>) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Settings from the current configuration.
    pub fn settings(&self) -> Result<ReportSettings> {
        ReportSettings::from_config(&self.config.get().reports)
    }

    /// Current date in the report timezone.
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(today_in(self.settings()?.timezone))
    }

    /// Hourly report for `date`.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn daily(&self, branch_id: &BranchId, date: NaiveDate) -> Result<DailyReport> {
        let range = DateRange::single_day(date)?;
        let branch = self.branch(branch_id).await?;
        let records = self.store.fetch_records(branch_id, &range).await?;

        info!(records = records.len(), "Built daily report");
        Ok(DailyReport::build(branch, range, &records))
    }

    /// Daily report for the Monday-start week containing `date`.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn weekly(&self, branch_id: &BranchId, date: NaiveDate) -> Result<WeeklyReport> {
        let range = DateRange::week_containing(date)?;
        let branch = self.branch(branch_id).await?;
        let records = self.store.fetch_records(branch_id, &range).await?;

        info!(records = records.len(), "Built weekly report");
        Ok(WeeklyReport::build(branch, range, &records))
    }

    /// Daily and weekly report for `year`-`month`.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn monthly(&self, branch_id: &BranchId, year: i32, month: u32) -> Result<MonthlyReport> {
        let range = DateRange::month(year, month)?;
        let branch = self.branch(branch_id).await?;
        let records = self.store.fetch_records(branch_id, &range).await?;

        info!(records = records.len(), "Built monthly report");
        Ok(MonthlyReport::build(branch, range, &records))
    }

    /// Buckets over `range` at `interval`.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn history(
        &self,
        branch_id: &BranchId,
        range: DateRange,
        interval: Granularity,
    ) -> Result<HistoryReport> {
        self.check_range(&range)?;
        let branch = self.branch(branch_id).await?;
        let records = self.store.fetch_records(branch_id, &range).await?;

        info!(records = records.len(), "Built history report");
        Ok(HistoryReport::build(branch, range, interval, &records))
    }

    /// Totals and busiest hours over `range`.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn summary(&self, branch_id: &BranchId, range: DateRange) -> Result<SummaryReport> {
        self.check_range(&range)?;
        let busy_period_limit = self.settings()?.busy_period_limit;
        let branch = self.branch(branch_id).await?;
        let records = self.store.fetch_records(branch_id, &range).await?;

        info!(records = records.len(), "Built summary report");
        Ok(SummaryReport::build(branch, range, busy_period_limit, &records))
    }

    /// Compares `period2` against `period1`.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn comparison(
        &self,
        branch_id: &BranchId,
        period1: DateRange,
        period2: DateRange,
    ) -> Result<ComparisonReport> {
        self.check_range(&period1)?;
        self.check_range(&period2)?;
        let branch = self.branch(branch_id).await?;
        let records1 = self.store.fetch_records(branch_id, &period1).await?;
        let records2 = self.store.fetch_records(branch_id, &period2).await?;

        info!(
            period1_records = records1.len(),
            period2_records = records2.len(),
            "Built comparison report"
        );
        Ok(ComparisonReport::build(branch, period1, &records1, period2, &records2))
    }

    /// Latest occupancy per camera.
    #[instrument(skip(self, branch_id), fields(branch = %branch_id))]
    pub async fn current(&self, branch_id: &BranchId) -> Result<CurrentOccupancy> {
        let branch = self.branch(branch_id).await?;
        let latest = self.store.latest_per_camera(branch_id).await?;
        Ok(CurrentOccupancy::build(branch, &latest))
    }

    async fn branch(&self, branch_id: &BranchId) -> Result<BranchInfo> {
        self.store.find_branch(branch_id).await?.ok_or_else(|| {
            warn!(branch = %branch_id, "Unknown branch requested");
            ShopCountError::not_found(format!("branch '{branch_id}' not found"))
        })
    }

    fn check_range(&self, range: &DateRange) -> Result<()> {
        let max = self.settings()?.max_range_days;
        if range.days() > i64::from(max) {
            warn!(days = range.days(), max, "Rejected oversized range");
            return Err(ShopCountError::invalid_range(format!(
                "range of {} days exceeds the limit of {max} days",
                range.days()
            )));
        }
        Ok(())
    }
}
