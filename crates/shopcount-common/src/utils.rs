//! Shared numeric and formatting helpers.

use chrono::NaiveDateTime;

/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Average of `total` over `count`, rounded to two decimals. Zero when
/// `count` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn average(total: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round2(total as f64 / count as f64)
}

/// Percentage change from `before` to `after`.
///
/// The denominator is floored at 1 so a zero baseline yields the raw
/// difference times 100 instead of a division by zero.
#[allow(clippy::cast_precision_loss)]
pub fn percent_change(before: u64, after: u64) -> f64 {
    let delta = after as f64 - before as f64;
    let base = before.max(1) as f64;
    round2(delta / base * 100.0)
}

/// Formats a naive local timestamp for display.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Keeps only characters that are safe inside a download filename.
pub fn sanitize_filename_component(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_round2() {
        assert!((round2(14.285_714) - 14.29).abs() < f64::EPSILON);
        assert!((round2(-33.333) + 33.33).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(100, 150) - 50.0).abs() < f64::EPSILON);
        assert!((percent_change(200, 150) + 25.0).abs() < f64::EPSILON);
        assert!((percent_change(0, 10) - 1000.0).abs() < f64::EPSILON);
        assert!(percent_change(0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_of_zero_count() {
        assert!(average(10, 0).abs() < f64::EPSILON);
        assert!((average(100, 7) - 14.29).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_timestamp() {
        let timestamp = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(format_timestamp(timestamp), "2024-01-01 12:00:00");
    }

    #[test]
    fn test_sanitize_filename_component() {
        assert_eq!(sanitize_filename_component("BKK-001"), "BKK-001");
        assert_eq!(sanitize_filename_component("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_filename_component(""), "unknown");
    }
}
