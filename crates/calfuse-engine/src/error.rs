//! Engine error types.

use std::io;

use calfuse_providers::ProviderError;
use thiserror::Error;

/// Result type for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a [`CacheStore`](crate::CacheStore).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store could not be reached.
    #[error("cache store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// A stored entry could not be decoded back into events.
    #[error("cache entry '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    /// An entry could not be serialized.
    #[error("failed to encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the aggregation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A provider failed, aborting the whole refresh.
    ///
    /// When several providers fail, this is the first one in configured order.
    #[error("provider fetch failed: {0}")]
    Provider(#[from] ProviderError),

    /// Events were fetched but could not be written to the cache.
    #[error("cache write failed: {0}")]
    Cache(#[from] CacheError),
}

impl EngineError {
    /// Returns the provider error, if this is one.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(err) => Some(err),
            Self::Cache(_) => None,
        }
    }
}
