//! Error types and utilities for shopcount

use thiserror::Error;

/// Result type alias for shopcount operations
pub type Result<T> = std::result::Result<T, ShopCountError>;

/// Main error type for shopcount operations
#[derive(Error, Debug)]
pub enum ShopCountError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record store errors
    #[error("Database error: {message}")]
    Database {
        /// Human-readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed caller input
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description
        message: String,
        /// Offending request field, when known
        field: Option<String>,
    },

    /// A date range that is reversed, empty or too long
    #[error("Invalid range: {message}")]
    InvalidRange {
        /// Human-readable description
        message: String,
    },

    /// A referenced branch or resource does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable description
        message: String,
    },

    /// Report rendering failures
    #[error("Report error: {message}")]
    Report {
        /// Human-readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Human-readable description
        message: String,
        /// Underlying cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ShopCountError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new database error with source
    pub fn database_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new invalid range error
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: msg.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound {
            message: msg.into(),
        }
    }

    /// Create a new report error
    pub fn report(msg: impl Into<String>) -> Self {
        Self::Report {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new report error with source
    pub fn report_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Report {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether the error was caused by the caller rather than the service.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidRange { .. } | Self::NotFound { .. }
        )
    }
}

/// Convert from `toml::de::Error` to `ShopCountError`
impl From<toml::de::Error> for ShopCountError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML parsing error", err)
    }
}

/// Convert from `serde_yaml::Error` to `ShopCountError`
impl From<serde_yaml::Error> for ShopCountError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing error", err)
    }
}
