//! JSON and CSV rendering of reports

use crate::bucketing::Bucket;
use serde::Serialize;
use shopcount_common::{
    sanitize_filename_component, BranchInfo, ReportFormat, Result, ShopCountError,
};
use tracing::debug;

/// A rendered report ready to be sent to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Document body
    pub body: String,
    /// MIME type of `body`
    pub content_type: &'static str,
    /// Suggested download filename
    pub filename: String,
}

/// A report that can be rendered as a JSON document or a CSV sheet.
pub trait TabularReport: Serialize {
    /// Prefix of the download filename, e.g. `daily_report`.
    fn report_type(&self) -> &'static str;

    /// Branch the report covers.
    fn branch(&self) -> &BranchInfo;

    /// Date or range part of the filename, e.g. `2024-01-01`.
    fn period_label(&self) -> String;

    /// Writes the CSV form of the report.
    fn write_csv(&self, sheet: &mut CsvSheet) -> Result<()>;
}

/// Suggested filename: `{report_type}_{branch_id}_{period}.{ext}`.
pub fn filename<R: TabularReport + ?Sized>(report: &R, format: ReportFormat) -> String {
    format!(
        "{}_{}_{}.{}",
        report.report_type(),
        sanitize_filename_component(report.branch().branch_id.as_str()),
        report.period_label(),
        format.extension()
    )
}

/// Renders `report` in `format`.
pub fn render<R: TabularReport>(report: &R, format: ReportFormat) -> Result<RenderedReport> {
    let body = match format {
        ReportFormat::Json => serde_json::to_string_pretty(report)?,
        ReportFormat::Csv => {
            let mut sheet = CsvSheet::new();
            report.write_csv(&mut sheet)?;
            sheet.finish()?
        }
    };

    let filename = filename(report, format);
    debug!(%filename, bytes = body.len(), "Rendered report");

    Ok(RenderedReport {
        body,
        content_type: format.content_type(),
        filename,
    })
}

/// Row-oriented CSV builder with support for blank separator lines and
/// rows of varying width.
///
/// Each row is written through a short-lived `csv::Writer` borrowing the
/// buffer, so blank lines can go straight into the buffer between rows.
#[derive(Debug, Default)]
pub struct CsvSheet {
    buffer: Vec<u8>,
}

impl CsvSheet {
    /// Creates an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one row.
    pub fn row<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut self.buffer);
        writer
            .write_record(fields)
            .map_err(|e| ShopCountError::report_with_source("Failed to write CSV row", e))?;
        writer.flush()?;
        Ok(())
    }

    /// Appends an empty line.
    pub fn blank(&mut self) -> Result<()> {
        self.buffer.push(b'\n');
        Ok(())
    }

    /// Writes the report title, period and branch lines followed by a blank line.
    pub fn header(&mut self, title: &str, period: &str, branch: &BranchInfo) -> Result<()> {
        self.row([title, period])?;
        self.row(["Branch", branch.branch_id.as_str(), branch.name.as_str()])?;
        self.blank()
    }

    /// Writes a column header row and one row per bucket.
    pub fn bucket_table(&mut self, key_label: &str, buckets: &[Bucket]) -> Result<()> {
        self.row([key_label, "Entries", "Exits", "Max Count"])?;
        for bucket in buckets {
            self.row([
                bucket.bucket_key.clone(),
                bucket.entries.to_string(),
                bucket.exits.to_string(),
                bucket.max_count.to_string(),
            ])?;
        }
        Ok(())
    }

    /// Writes a blank line, a `Summary` label and `label,value` rows.
    pub fn summary_block(&mut self, rows: &[(&str, String)]) -> Result<()> {
        self.blank()?;
        self.row(["Summary"])?;
        for (label, value) in rows {
            self.row([*label, value.as_str()])?;
        }
        Ok(())
    }

    /// Returns the sheet as text.
    pub fn finish(self) -> Result<String> {
        String::from_utf8(self.buffer)
            .map_err(|e| ShopCountError::report_with_source("CSV output is not UTF-8", e))
    }
}

/// Formats a percent value with two decimals and a `%` suffix.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Formats an optional bucket key, using `-` when absent.
pub fn format_optional(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
