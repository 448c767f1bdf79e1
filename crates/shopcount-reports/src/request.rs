//! Parsing and normalization of report request parameters.
//!
//! Query structs deserialize straight from URL query strings. Their
//! `resolve` methods turn optional calendar strings into half-open
//! [`DateRange`]s, filling gaps with defaults relative to `today`.

use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use shopcount_common::{shift_days, DateRange, Granularity, ReportFormat, Result, ShopCountError};

/// Days before `today` that history and summary ranges start at by default.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Current calendar date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ShopCountError::validation_field(
            format!("invalid date '{value}', expected YYYY-MM-DD"),
            field,
        )
    })
}

/// Parses a `YYYY-MM` month into `(year, month)`.
pub fn parse_month(value: &str) -> Result<(i32, u32)> {
    let invalid = || {
        ShopCountError::validation_field(
            format!("invalid month '{value}', expected YYYY-MM"),
            "month",
        )
    };
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// Parses an optional granularity, defaulting to hourly.
pub fn parse_granularity(value: Option<&str>) -> Result<Granularity> {
    value.map_or(Ok(Granularity::Hour), str::parse::<Granularity>)
}

/// Parses an optional format, falling back to `default`.
pub fn parse_format(value: Option<&str>, default: ReportFormat) -> Result<ReportFormat> {
    value.map_or(Ok(default), str::parse::<ReportFormat>)
}

fn optional_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>> {
    value.map(|v| parse_date(v, field)).transpose()
}

/// `?date=&format=` for daily and weekly reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    /// Day of the report, or any day inside the week
    pub date: Option<String>,
    /// `json` or `csv`
    pub format: Option<String>,
}

impl DateQuery {
    /// The requested day, or `today`.
    pub fn resolve_date(&self, today: NaiveDate) -> Result<NaiveDate> {
        Ok(optional_date(self.date.as_deref(), "date")?.unwrap_or(today))
    }

    /// The requested format, or `default`.
    pub fn resolve_format(&self, default: ReportFormat) -> Result<ReportFormat> {
        parse_format(self.format.as_deref(), default)
    }
}

/// `?month=&format=` for monthly reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthQuery {
    /// Month as `YYYY-MM`, also accepted as `date`
    #[serde(alias = "date")]
    pub month: Option<String>,
    /// `json` or `csv`
    pub format: Option<String>,
}

impl MonthQuery {
    /// The requested month, or the month containing `today`.
    pub fn resolve_month(&self, today: NaiveDate) -> Result<(i32, u32)> {
        self.month
            .as_deref()
            .map_or(Ok((today.year(), today.month())), parse_month)
    }

    /// The requested format, or `default`.
    pub fn resolve_format(&self, default: ReportFormat) -> Result<ReportFormat> {
        parse_format(self.format.as_deref(), default)
    }
}

/// `?start_date=&end_date=&interval=&format=` for history and summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    /// First day, inclusive
    pub start_date: Option<String>,
    /// Last day, inclusive
    pub end_date: Option<String>,
    /// `hour`, `day`, `week` or `month`
    pub interval: Option<String>,
    /// `json` or `csv`
    pub format: Option<String>,
}

impl RangeQuery {
    /// The requested range. The end defaults to `today` and the start to
    /// seven days before the end.
    pub fn resolve_range(&self, today: NaiveDate) -> Result<DateRange> {
        let last = optional_date(self.end_date.as_deref(), "end_date")?.unwrap_or(today);
        let start = match optional_date(self.start_date.as_deref(), "start_date")? {
            Some(start) => start,
            None => shift_days(last, -DEFAULT_LOOKBACK_DAYS)?,
        };
        DateRange::inclusive(start, last)
    }

    /// The requested interval, or hourly.
    pub fn resolve_interval(&self) -> Result<Granularity> {
        parse_granularity(self.interval.as_deref())
    }

    /// The requested format, or `default`.
    pub fn resolve_format(&self, default: ReportFormat) -> Result<ReportFormat> {
        parse_format(self.format.as_deref(), default)
    }
}

/// `?period1_start=&period1_end=&period2_start=&period2_end=&format=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonQuery {
    /// First day of the baseline period
    pub period1_start: Option<String>,
    /// Last day of the baseline period
    pub period1_end: Option<String>,
    /// First day of the compared period
    pub period2_start: Option<String>,
    /// Last day of the compared period
    pub period2_end: Option<String>,
    /// `json` or `csv`
    pub format: Option<String>,
}

impl ComparisonQuery {
    /// Resolves both periods.
    ///
    /// Period 2 defaults to the week ending `today`. When period 1 is
    /// omitted entirely it becomes the equally long range right before
    /// period 2; when only one of its ends is given the request is rejected.
    pub fn resolve_periods(&self, today: NaiveDate) -> Result<(DateRange, DateRange)> {
        let p2_last = optional_date(self.period2_end.as_deref(), "period2_end")?.unwrap_or(today);
        let p2_start = match optional_date(self.period2_start.as_deref(), "period2_start")? {
            Some(start) => start,
            None => shift_days(p2_last, 1 - DEFAULT_LOOKBACK_DAYS)?,
        };
        let period2 = DateRange::inclusive(p2_start, p2_last)?;

        let p1_start = optional_date(self.period1_start.as_deref(), "period1_start")?;
        let p1_last = optional_date(self.period1_end.as_deref(), "period1_end")?;
        let period1 = match (p1_start, p1_last) {
            (Some(start), Some(last)) => DateRange::inclusive(start, last)?,
            (None, None) => period2.preceding()?,
            (Some(_), None) => {
                return Err(ShopCountError::validation_field(
                    "period1_end is required when period1_start is given",
                    "period1_end",
                ))
            }
            (None, Some(_)) => {
                return Err(ShopCountError::validation_field(
                    "period1_start is required when period1_end is given",
                    "period1_start",
                ))
            }
        };

        Ok((period1, period2))
    }

    /// The requested format, or `default`.
    pub fn resolve_format(&self, default: ReportFormat) -> Result<ReportFormat> {
        parse_format(self.format.as_deref(), default)
    }
}
