//! Common type definitions and newtype wrappers for domain modeling.

use crate::error::{Result, ShopCountError};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A stable branch identifier (e.g. `"BKK-001"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub String);

impl BranchId {
    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BranchId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Branch metadata carried by every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// Branch identifier.
    pub branch_id: BranchId,
    /// Human-readable branch name.
    pub name: String,
}

impl BranchInfo {
    /// Creates branch metadata.
    pub fn new(branch_id: impl Into<BranchId>, name: impl Into<String>) -> Self {
        Self {
            branch_id: branch_id.into(),
            name: name.into(),
        }
    }
}

/// A single raw observation pushed by a counting device.
///
/// `timestamp` is naive branch-local wall-clock time. Counts are unsigned, so
/// negative values can never reach the aggregation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    /// Branch the device belongs to.
    pub branch_id: BranchId,
    /// Camera that produced the observation, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<String>,
    /// Observation time.
    pub timestamp: NaiveDateTime,
    /// People entering since the previous observation.
    pub entry_count: u32,
    /// People leaving since the previous observation.
    pub exit_count: u32,
    /// Occupancy at `timestamp`.
    pub current_count: u32,
}

impl CountRecord {
    /// Creates a record without a camera id.
    pub fn new(
        branch_id: impl Into<BranchId>,
        timestamp: NaiveDateTime,
        entry_count: u32,
        exit_count: u32,
        current_count: u32,
    ) -> Self {
        Self {
            branch_id: branch_id.into(),
            camera_id: None,
            timestamp,
            entry_count,
            exit_count,
            current_count,
        }
    }

    /// Attaches a camera id.
    #[must_use]
    pub fn with_camera(mut self, camera_id: impl Into<String>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }
}

/// Bucketing resolution for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One bucket per dated hour.
    Hour,
    /// One bucket per calendar day.
    Day,
    /// One bucket per ISO week (Monday start).
    Week,
    /// One bucket per calendar month.
    Month,
}

impl Granularity {
    /// Wire name of the granularity.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ShopCountError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(Self::Hour),
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(ShopCountError::validation_field(
                format!("unknown granularity '{other}' (expected hour, day, week or month)"),
                "interval",
            )),
        }
    }
}

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Structured JSON document.
    #[default]
    Json,
    /// Tabular CSV download.
    Csv,
}

impl ReportFormat {
    /// MIME type announced for this format.
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    /// File extension used in suggested filenames.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = ShopCountError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(ShopCountError::validation_field(
                format!("unknown format '{other}' (expected json or csv)"),
                "format",
            )),
        }
    }
}

/// Moves `date` by `days`, failing with `InvalidRange` past the calendar's limits.
pub fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    date.checked_add_signed(Duration::days(days)).ok_or_else(|| {
        ShopCountError::invalid_range(format!("date {date} shifted by {days} days is out of range"))
    })
}

/// Half-open calendar range `[start, end)`.
///
/// Always non-empty: `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range from an inclusive start and an exclusive end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(ShopCountError::invalid_range(format!(
                "range end {end} must be after start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a range from two inclusive calendar dates, advancing the end
    /// by one day.
    pub fn inclusive(start: NaiveDate, last: NaiveDate) -> Result<Self> {
        if last < start {
            return Err(ShopCountError::invalid_range(format!(
                "end date {last} is before start date {start}"
            )));
        }
        let end = last
            .succ_opt()
            .ok_or_else(|| ShopCountError::invalid_range(format!("end date {last} is out of range")))?;
        Ok(Self { start, end })
    }

    /// The single calendar day `date`.
    pub fn single_day(date: NaiveDate) -> Result<Self> {
        Self::inclusive(date, date)
    }

    /// The Monday-start week containing `date`.
    pub fn week_containing(date: NaiveDate) -> Result<Self> {
        let offset = i64::from(date.weekday().num_days_from_monday());
        let start = shift_days(date, -offset)?;
        Self::new(start, shift_days(start, 7)?)
    }

    /// The calendar month `year`-`month`.
    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            ShopCountError::validation_field(format!("invalid month {year}-{month:02}"), "month")
        })?;
        let out_of_range =
            || ShopCountError::invalid_range(format!("month {year}-{month:02} is out of range"));
        let (next_year, next_month) = if month == 12 {
            (year.checked_add(1).ok_or_else(out_of_range)?, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(out_of_range)?;
        Self::new(start, end)
    }

    /// First day of the range.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end of the range.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Last day included in the range.
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }

    /// Number of whole calendar days covered (`end - start`).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Midnight at the start of the range.
    pub fn start_datetime(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Midnight at the exclusive end of the range.
    pub fn end_datetime(&self) -> NaiveDateTime {
        self.end.and_time(NaiveTime::MIN)
    }

    /// Whether `timestamp` falls inside `[start, end)`.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        *timestamp >= self.start_datetime() && *timestamp < self.end_datetime()
    }

    /// The range of equal length ending where this one starts.
    pub fn preceding(&self) -> Result<Self> {
        Self::new(shift_days(self.start, -self.days())?, self.start)
    }

    /// Stable label: `YYYY-MM-DD` for a single day, otherwise
    /// `YYYY-MM-DD_to_YYYY-MM-DD` (inclusive last day).
    pub fn label(&self) -> String {
        if self.days() == 1 {
            self.start.format("%Y-%m-%d").to_string()
        } else {
            format!(
                "{}_to_{}",
                self.start.format("%Y-%m-%d"),
                self.last_day().format("%Y-%m-%d")
            )
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.last_day().format("%Y-%m-%d")
        )
    }
}

impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DateRange", 3)?;
        state.serialize_field("start_date", &self.start)?;
        state.serialize_field("end_date", &self.last_day())?;
        state.serialize_field("days", &self.days())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inclusive_range_advances_end() {
        let range = DateRange::inclusive(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        assert_eq!(range.end(), date(2024, 1, 8));
        assert_eq!(range.days(), 7);
        assert_eq!(range.last_day(), date(2024, 1, 7));
    }

    #[test]
    fn test_inclusive_range_rejects_reversed_dates() {
        let err = DateRange::inclusive(date(2024, 1, 7), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, ShopCountError::InvalidRange { .. }));
    }

    #[test]
    fn test_week_containing_starts_on_monday() {
        // 2024-01-04 is a Thursday
        let range = DateRange::week_containing(date(2024, 1, 4)).unwrap();
        assert_eq!(range.start(), date(2024, 1, 1));
        assert_eq!(range.end(), date(2024, 1, 8));
    }

    #[test]
    fn test_month_range_handles_december() {
        let range = DateRange::month(2023, 12).unwrap();
        assert_eq!(range.start(), date(2023, 12, 1));
        assert_eq!(range.end(), date(2024, 1, 1));
        assert_eq!(range.days(), 31);

        assert!(DateRange::month(2024, 13).is_err());
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = DateRange::single_day(date(2024, 1, 1)).unwrap();
        assert!(range.contains(&date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap()));
        assert!(range.contains(&date(2024, 1, 1).and_hms_opt(23, 59, 59).unwrap()));
        assert!(!range.contains(&date(2024, 1, 2).and_hms_opt(0, 0, 0).unwrap()));
    }

    #[test]
    fn test_preceding_range_has_same_length() {
        let range = DateRange::inclusive(date(2024, 1, 8), date(2024, 1, 14)).unwrap();
        let previous = range.preceding().unwrap();
        assert_eq!(previous.start(), date(2024, 1, 1));
        assert_eq!(previous.end(), date(2024, 1, 8));
    }

    #[test]
    fn test_calendar_edges_are_invalid_ranges() {
        let err = DateRange::week_containing(NaiveDate::MAX).unwrap_err();
        assert!(matches!(err, ShopCountError::InvalidRange { .. }));

        let first = DateRange::single_day(NaiveDate::MIN).unwrap();
        assert!(matches!(first.preceding(), Err(ShopCountError::InvalidRange { .. })));

        assert!(matches!(
            shift_days(NaiveDate::MIN, -7),
            Err(ShopCountError::InvalidRange { .. })
        ));
        assert_eq!(shift_days(date(2024, 1, 1), -1).unwrap(), date(2023, 12, 31));
    }

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("hour".parse::<Granularity>().unwrap(), Granularity::Hour);
        assert_eq!("Weekly".parse::<Granularity>().unwrap(), Granularity::Week);
        assert!("fortnight".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_range_serializes_inclusive_end() {
        let range = DateRange::inclusive(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        let json = serde_json::to_value(range).unwrap();
        assert_eq!(json["start_date"], "2024-01-01");
        assert_eq!(json["end_date"], "2024-01-07");
        assert_eq!(json["days"], 7);
    }
}
