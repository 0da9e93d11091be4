//! Aggregation engine: provider fan-out, merge, TTL cache.
//!
//! This crate combines any number of [`CalendarProvider`]s into one
//! chronologically sorted event list:
//! - Concurrent fetches over a shared time window
//! - All-or-nothing refreshes that never overwrite the cache on failure
//! - A single cache entry with a configurable freshness threshold
//! - An observable [`CalendarFeed`] for front ends
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use calfuse_engine::{Aggregator, FileCacheStore};
//!
//! # async fn run(providers: Vec<Arc<dyn calfuse_providers::CalendarProvider>>) -> Result<(), calfuse_engine::EngineError> {
//! let store = Arc::new(FileCacheStore::new("/tmp/calfuse"));
//! let engine = Aggregator::new(providers, store);
//!
//! for event in engine.get_events().await? {
//!     println!("{} {}", event.start(), event.title());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`CalendarProvider`]: calfuse_providers::CalendarProvider

mod cache;
mod clock;
mod config;
mod engine;
mod error;
mod feed;

#[cfg(test)]
mod testing;

pub use cache::{
    CacheEntry, CacheStore, FileCacheStore, MemoryCacheStore, decode_entry, encode_entry,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{Aggregator, PartialAggregation};
pub use error::{CacheError, CacheResult, EngineError, EngineResult};
pub use feed::{CalendarFeed, FeedSnapshot};
