//! Pipeline configuration.
//!
//! [`PipelineConfig`] is plain serde data: hosts load it from whatever format
//! they already use (TOML, JSON, environment) and hand it to
//! [`standard_chain`](crate::standard::standard_chain) and
//! [`Publisher::with_config`](crate::publish::Publisher::with_config).
//! Every field has a default, so an empty document is a valid configuration.
//!
//! Durations are stored in whole milliseconds.
//!
//! ```json
//! {
//!   "default_strategy": "parallel",
//!   "intercepts": { "caching": false },
//!   "cache": { "default_expiration_ms": 60000 },
//!   "performance": { "slow_threshold_ms": 250 }
//! }
//! ```

use courier_core::FanOut;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors found by [`PipelineConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A zero cache expiration would store entries that are never served.
    #[error("cache.default_expiration_ms must be greater than zero")]
    ZeroCacheExpiration,
    /// A zero threshold would flag every request as slow.
    #[error("performance.slow_threshold_ms must be greater than zero")]
    ZeroSlowThreshold,
}

/// Top-level pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fan-out strategy used when neither caller nor notification picks one.
    pub default_strategy: FanOut,
    /// Which built-in intercepts are enabled.
    pub intercepts: InterceptToggles,
    /// Response cache settings.
    pub cache: CacheConfig,
    /// Performance capture settings.
    pub performance: PerformanceConfig,
}

impl PipelineConfig {
    /// Set the default fan-out strategy.
    pub fn with_default_strategy(mut self, strategy: FanOut) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Set the default cache expiration.
    ///
    /// Rounded up to whole milliseconds; only `Duration::ZERO` stores zero.
    pub fn with_cache_expiration(mut self, expiration: Duration) -> Self {
        self.cache.default_expiration_ms = whole_millis(expiration);
        self
    }

    /// Set the slow-request threshold, rounded up to whole milliseconds.
    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.performance.slow_threshold_ms = Some(whole_millis(threshold));
        self
    }

    /// Set the intercept toggles.
    pub fn with_intercepts(mut self, intercepts: InterceptToggles) -> Self {
        self.intercepts = intercepts;
        self
    }

    /// Check values serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.default_expiration_ms == 0 {
            return Err(ConfigError::ZeroCacheExpiration);
        }
        if self.performance.slow_threshold_ms == Some(0) {
            return Err(ConfigError::ZeroSlowThreshold);
        }
        Ok(())
    }
}

/// Milliseconds in `duration`, rounded up and saturating at `u64::MAX`.
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

/// On/off switches for the built-in intercepts. All default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptToggles {
    /// Run validation.
    pub validation: bool,
    /// Run auditing.
    pub audit: bool,
    /// Run authorization.
    pub authorization: bool,
    /// Run performance capture.
    pub performance: bool,
    /// Run response caching.
    pub caching: bool,
}

impl Default for InterceptToggles {
    fn default() -> Self {
        Self {
            validation: true,
            audit: true,
            authorization: true,
            performance: true,
            caching: true,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Expiration for requests that do not set one, in milliseconds.
    pub default_expiration_ms: u64,
}

impl CacheConfig {
    /// The default expiration as a `Duration`.
    pub fn default_expiration(&self) -> Duration {
        Duration::from_millis(self.default_expiration_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expiration_ms: 300_000,
        }
    }
}

/// Performance capture settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Requests slower than this are logged as warnings, in milliseconds.
    pub slow_threshold_ms: Option<u64>,
}

impl PerformanceConfig {
    /// The slow threshold as a `Duration`.
    pub fn slow_threshold(&self) -> Option<Duration> {
        self.slow_threshold_ms.map(Duration::from_millis)
    }
}
