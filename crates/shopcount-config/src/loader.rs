//! Configuration loading utilities

use crate::Config;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "SHOPCOUNT_CONFIG_PATH";

/// File names searched, in order, when no explicit path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 3] = ["config.yaml", "config.yml", "config.toml"];

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// File extension is neither YAML nor TOML
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Variable name
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

impl From<ConfigError> for shopcount_common::ShopCountError {
    fn from(err: ConfigError) -> Self {
        Self::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file with environment variable
    /// overrides applied from the process environment.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        Self::load_config_with(path, |var| env::var(var).ok())
    }

    /// Same as [`ConfigLoader::load_config`] with an explicit variable lookup.
    pub fn load_config_with<P, F>(path: P, lookup: F) -> Result<Config, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let mut config = Self::parse_file(path)?;

        Self::apply_env_overrides(&mut config, &lookup)?;
        config.validate_all()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from the first location that exists:
    /// `SHOPCOUNT_CONFIG_PATH`, then `config.yaml`, `config.yml`,
    /// `config.toml`; otherwise defaults with environment overrides.
    pub fn load() -> shopcount_common::Result<Config> {
        Ok(Self::load_with(|var| env::var(var).ok())?)
    }

    /// Same as [`ConfigLoader::load`] with an explicit variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(CONFIG_PATH_VAR) {
            return Self::load_config_with(path, lookup);
        }

        if let Some(path) = Self::find_default_file() {
            return Self::load_config_with(path, lookup);
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config, &lookup)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> shopcount_common::Result<Config> {
        Ok(Self::load_config(path)?)
    }

    fn find_default_file() -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
    }

    fn parse_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml" | "yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides<F>(config: &mut Config, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SHOPCOUNT_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("SHOPCOUNT_PORT") {
            config.server.port = parse_var("SHOPCOUNT_PORT", &port)?;
        }

        if let Some(url) = lookup("SHOPCOUNT_DATABASE_URL") {
            config.database.url = url;
        }

        if let Some(timezone) = lookup("SHOPCOUNT_TIMEZONE") {
            config.reports.timezone = timezone;
        }

        if let Some(days) = lookup("SHOPCOUNT_MAX_RANGE_DAYS") {
            config.reports.max_range_days = parse_var("SHOPCOUNT_MAX_RANGE_DAYS", &days)?;
        }

        if let Some(level) = lookup("SHOPCOUNT_LOG_LEVEL") {
            config.logging.level = level.to_ascii_lowercase();
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
