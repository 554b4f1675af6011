//! Configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [engine]
//! resync_delay_ms = 10000
//! delete_resync_delay_ms = 5000
//! activity_capacity = 256
//!
//! [youtube]
//! base_url = "https://www.googleapis.com/youtube/v3"
//! max_results = 20
//! request_timeout_ms = 30000
//! ```

use crate::error::ConfigError;
use cdesk_gateway::YouTubeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Delay before re-listing after a successful write
///
/// Chosen to exceed the remote API's observed propagation lag.
pub const DEFAULT_RESYNC_DELAY_MS: u64 = 10_000;

/// Reconciliation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deferred resync delay after posts and replies, in milliseconds
    pub resync_delay_ms: u64,
    /// Deferred resync delay after deletions; falls back to `resync_delay_ms`
    pub delete_resync_delay_ms: Option<u64>,
    /// Activity log entries kept in memory
    pub activity_capacity: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With resync delay
    #[inline]
    #[must_use]
    pub fn with_resync_delay(mut self, delay: Duration) -> Self {
        self.resync_delay_ms = duration_ms(delay);
        self
    }

    /// With a separate resync delay for deletions
    #[inline]
    #[must_use]
    pub fn with_delete_resync_delay(mut self, delay: Duration) -> Self {
        self.delete_resync_delay_ms = Some(duration_ms(delay));
        self
    }

    /// With activity log capacity
    #[inline]
    #[must_use]
    pub fn with_activity_capacity(mut self, capacity: usize) -> Self {
        self.activity_capacity = capacity;
        self
    }

    /// Resync delay after posts and replies
    #[inline]
    #[must_use]
    pub fn resync_delay(&self) -> Duration {
        Duration::from_millis(self.resync_delay_ms)
    }

    /// Resync delay after deletions
    #[inline]
    #[must_use]
    pub fn delete_resync_delay(&self) -> Duration {
        Duration::from_millis(self.delete_resync_delay_ms.unwrap_or(self.resync_delay_ms))
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` for a zero delay or zero capacity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resync_delay_ms == 0 {
            return Err(ConfigError::Invalid("engine.resync_delay_ms must be > 0".into()));
        }
        if self.delete_resync_delay_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "engine.delete_resync_delay_ms must be > 0".into(),
            ));
        }
        if self.activity_capacity == 0 {
            return Err(ConfigError::Invalid("engine.activity_capacity must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_delay_ms: DEFAULT_RESYNC_DELAY_MS,
            delete_resync_delay_ms: None,
            activity_capacity: 256,
        }
    }
}

fn duration_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Engine settings
    pub engine: EngineConfig,
    /// YouTube gateway settings
    pub youtube: YouTubeConfig,
}

impl DeskConfig {
    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` on invalid TOML
    /// - `ConfigError::Invalid` on out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges of every section
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if !(1..=100).contains(&self.youtube.max_results) {
            return Err(ConfigError::Invalid(
                "youtube.max_results must be within 1..=100".into(),
            ));
        }
        if self.youtube.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("youtube.base_url must not be empty".into()));
        }
        if self.youtube.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "youtube.request_timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
