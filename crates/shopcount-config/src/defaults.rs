//! Default values for every configuration section.

use crate::schema::{DatabaseConfig, LoggingSettings, ReportsConfig, ServerConfig};
use shopcount_common::ReportFormat;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default SQLite database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_counter.db?mode=rwc";
/// Default report timezone.
pub const DEFAULT_TIMEZONE: &str = "Asia/Bangkok";
/// Default longest report range.
pub const DEFAULT_MAX_RANGE_DAYS: u32 = 366;
/// Default number of busy periods in summaries.
pub const DEFAULT_BUSY_PERIOD_LIMIT: usize = 5;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
            default_format: ReportFormat::Json,
            busy_period_limit: DEFAULT_BUSY_PERIOD_LIMIT,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}
