//! Engine configuration.

use calfuse_core::FETCH_HORIZON_DAYS;
use chrono::Duration;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Key of the single cache entry holding the merged events.
    pub cache_key: String,

    /// Entries younger than this are served without touching providers.
    pub freshness: Duration,

    /// How far ahead of "now" providers are queried.
    pub horizon: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_key: Self::DEFAULT_CACHE_KEY.to_string(),
            freshness: Duration::hours(1),
            horizon: Duration::days(FETCH_HORIZON_DAYS),
        }
    }
}

impl EngineConfig {
    pub const DEFAULT_CACHE_KEY: &'static str = "calendar_events";

    /// Builder: set the cache key.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    /// Builder: set the freshness threshold.
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    /// Builder: set the fetch horizon.
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }
}
