//! Thread-safe configuration caching with arc-swap for lock-free reads.

use crate::loader::{ConfigError, ConfigLoader};
use crate::schema::Config;
use arc_swap::ArcSwap;
use std::env;
use std::sync::Arc;
use tracing::info;

/// Thread-safe configuration cache using arc-swap for lock-free reads.
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Creates a new configuration cache with the given initial configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Gets the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Loads configuration again the way [`ConfigLoader::load`] does and
    /// swaps it in. The current configuration is kept when loading or
    /// validation fails.
    pub fn reload(&self) -> Result<Arc<Config>, ConfigError> {
        self.reload_with(|var| env::var(var).ok())
    }

    /// Same as [`ConfigCache::reload`] with an explicit variable lookup.
    pub fn reload_with<F>(&self, lookup: F) -> Result<Arc<Config>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Arc::new(ConfigLoader::load_with(lookup)?);
        self.config.store(Arc::clone(&config));
        info!("Configuration reloaded");
        Ok(config)
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("config", &self.config.load())
            .finish()
    }
}
