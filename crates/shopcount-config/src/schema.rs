//! Application configuration structures

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shopcount_common::logging::{LogFormat, LoggingConfig};
use shopcount_common::{ReportFormat, Result, ShopCountError};
use std::path::PathBuf;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    #[validate]
    pub server: ServerConfig,

    /// Count record store settings
    #[validate]
    pub database: DatabaseConfig,

    /// Report generation settings
    #[validate]
    pub reports: ReportsConfig,

    /// Logging settings
    #[validate]
    pub logging: LoggingSettings,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    #[validate(length(min = 1, message = "Server host cannot be empty"))]
    pub host: String,

    /// Bind port
    #[validate(range(min = 1, message = "Server port must be non-zero"))]
    pub port: u16,
}

/// Count record store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL (e.g. `sqlite://data/shop_counter.db`)
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of pooled connections
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,
}

/// Report generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ReportsConfig {
    /// IANA timezone that stored timestamps are expressed in
    #[validate(custom(function = "crate::validation::validate_timezone", message = "Timezone must be a valid IANA name"))]
    pub timezone: String,

    /// Longest accepted report range in days
    #[validate(range(min = 1, max = 3660, message = "Max range must be between 1 and 3660 days"))]
    pub max_range_days: u32,

    /// Format used when a request does not name one
    pub default_format: ReportFormat,

    /// Number of busiest hours listed by the summary report
    #[validate(range(min = 1, max = 100, message = "Busy period limit must be between 1 and 100"))]
    pub busy_period_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level filter directive (trace, debug, info, warn, error)
    #[validate(custom(function = "crate::validation::validate_log_level", message = "Log level must be one of: trace, debug, info, warn, error"))]
    pub level: String,

    /// Output style (pretty, compact, json)
    #[validate(custom(function = "crate::validation::validate_log_format", message = "Log format must be one of: pretty, compact, json"))]
    pub format: String,

    /// Directory for daily-rotated log files; stdout when unset
    pub directory: Option<String>,
}

impl Config {
    /// Comprehensive validation of the entire configuration
    pub fn validate_all(&self) -> std::result::Result<(), validator::ValidationErrors> {
        self.validate()
    }
}

impl ReportsConfig {
    /// Parsed report timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            ShopCountError::config(format!("invalid timezone '{}': {e}", self.timezone))
        })
    }
}

impl LoggingSettings {
    /// Builds the subscriber configuration used by `init_logging`.
    pub fn to_logging_config(&self) -> LoggingConfig {
        let format = match self.format.as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        LoggingConfig {
            level: self.level.clone(),
            format,
            directory: self.directory.as_ref().map(PathBuf::from),
            ..LoggingConfig::default()
        }
    }
}
