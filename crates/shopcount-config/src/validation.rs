//! Custom field validators used by the configuration schema

use chrono_tz::Tz;
use validator::ValidationError;

/// Validate an IANA timezone name such as `Asia/Bangkok` or `UTC`
pub fn validate_timezone(timezone: &str) -> Result<(), ValidationError> {
    if timezone.is_empty() {
        return Err(ValidationError::new("empty_timezone"));
    }

    timezone
        .parse::<Tz>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_timezone"))
}

/// Validate a log level name
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

/// Validate a log output format name
pub fn validate_log_format(format: &str) -> Result<(), ValidationError> {
    match format {
        "pretty" | "compact" | "json" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("Asia/Bangkok").is_ok());
        assert!(validate_timezone("America/New_York").is_ok());

        assert!(validate_timezone("").is_err());
        assert!(validate_timezone("Invalid/Zone").is_err());
        assert!(validate_timezone("bangkok").is_err());
    }

    #[test]
    fn test_validate_log_format() {
        assert!(validate_log_format("json").is_ok());
        assert!(validate_log_format("xml").is_err());
    }
}
