//! The aggregation engine.
//!
//! [`Aggregator`] decides between the cache and the providers:
//!
//! ```text
//! get_events ──► cache fresh? ──yes──► cached events
//!                     │ no / unreadable
//!                     ▼
//! refresh ──► fan out to every provider ──► all ok? ──no──► first error, cache untouched
//!                                              │ yes
//!                                              ▼
//!                         concat in provider order, stable sort by start
//!                                              │
//!                                              ▼
//!                               write {events, now} ──► events
//! ```

use std::sync::Arc;

use calfuse_core::{Event, TimeWindow};
use calfuse_providers::{CalendarProvider, ProviderError};
use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheEntry, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Outcome of [`Aggregator::refresh_partial`].
#[derive(Debug)]
pub struct PartialAggregation {
    /// Merged, sorted events of the providers that succeeded.
    pub events: Vec<Event>,
    /// Errors of the providers that failed, in provider order.
    pub failures: Vec<ProviderError>,
}

impl PartialAggregation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Merges provider results into one event list backed by a TTL cache.
pub struct Aggregator {
    providers: Vec<Arc<dyn CalendarProvider>>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish()
    }
}

impl Aggregator {
    /// Creates an aggregator over `providers`. Their order is the merge
    /// order for events with equal start times and the order in which
    /// failures are reported.
    pub fn new(providers: Vec<Arc<dyn CalendarProvider>>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            providers,
            store,
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Names of the configured providers, in order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Returns cached events while they are fresh, otherwise refreshes.
    ///
    /// A cache that cannot be read is treated as empty.
    pub async fn get_events(&self) -> EngineResult<Vec<Event>> {
        let now = self.clock.now();
        let key = self.config.cache_key.as_str();

        match self.store.get(key).await {
            Ok(Some(entry)) if entry.is_fresh(now, self.config.freshness) => {
                debug!(
                    key,
                    age_secs = entry.age(now).num_seconds(),
                    events = entry.events.len(),
                    "serving fresh cache entry"
                );
                return Ok(entry.events);
            }
            Ok(Some(entry)) => {
                debug!(key, age_secs = entry.age(now).num_seconds(), "cache entry is stale");
            }
            Ok(None) => debug!(key, "no cache entry"),
            Err(err) => warn!(key, error = %err, "cache read failed, treating as miss"),
        }

        self.refresh().await
    }

    /// Fetches from every provider and overwrites the cache.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Provider`] with the first failure in provider
    /// order if any provider fails; the cache is left as it was. Returns
    /// [`EngineError::Cache`] if the merged events cannot be stored.
    pub async fn refresh(&self) -> EngineResult<Vec<Event>> {
        let now = self.clock.now();
        let results = self.fan_out(now).await;

        let mut batches = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(events) => batches.push(events),
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        if let Some(err) = first_error {
            warn!(error = %err, "refresh aborted, cache left untouched");
            return Err(EngineError::Provider(err));
        }

        let events = merge(batches);
        self.store
            .set(&self.config.cache_key, CacheEntry::new(events.clone(), now))
            .await?;

        info!(
            providers = self.providers.len(),
            events = events.len(),
            "refresh complete"
        );
        Ok(events)
    }

    /// Fetches from every provider and keeps whatever succeeded.
    ///
    /// The result is never written to the cache.
    pub async fn refresh_partial(&self) -> PartialAggregation {
        let results = self.fan_out(self.clock.now()).await;

        let mut batches = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(events) => batches.push(events),
                Err(err) => failures.push(err),
            }
        }

        let events = merge(batches);
        info!(
            events = events.len(),
            failed = failures.len(),
            "partial refresh complete"
        );
        PartialAggregation { events, failures }
    }

    /// Queries every provider concurrently and waits for all of them.
    async fn fan_out(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Vec<Result<Vec<Event>, ProviderError>> {
        let window = TimeWindow::from_duration(now, self.config.horizon);
        debug!(
            providers = self.providers.len(),
            start = %window.start,
            end = %window.end,
            "fetching from providers"
        );

        let fetches = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            async move {
                let result = provider.fetch_events(window).await;
                match &result {
                    Ok(events) => {
                        debug!(provider = provider.name(), events = events.len(), "provider ok")
                    }
                    Err(err) => error!(
                        provider = provider.name(),
                        code = %err.code(),
                        kind = %err.kind(),
                        error = %err,
                        "provider failed"
                    ),
                }
                result
            }
        });

        join_all(fetches).await
    }
}

/// Concatenates batches in order and stable-sorts by start.
fn merge(batches: Vec<Vec<Event>>) -> Vec<Event> {
    let mut events: Vec<Event> = batches.into_iter().flatten().collect();
    events.sort_by_key(Event::start);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStore, decode_entry, encode_entry};
    use crate::clock::ManualClock;
    use crate::testing::{BrokenStore, FakeProvider, dyn_provider, event};
    use calfuse_core::EventSource;
    use calfuse_providers::ProviderErrorCode;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    const KEY: &str = "calendar_events";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    struct Harness {
        a: Arc<FakeProvider>,
        b: Arc<FakeProvider>,
        store: Arc<MemoryCacheStore>,
        clock: Arc<ManualClock>,
        engine: Aggregator,
    }

    /// Provider A returns events at T+1d and T+3d, provider B at T+2d.
    fn harness() -> Harness {
        let a = Arc::new(FakeProvider::new(
            "a",
            EventSource::Google,
            vec![
                event("A1", EventSource::Google, t0() + Duration::days(1)),
                event("A2", EventSource::Google, t0() + Duration::days(3)),
            ],
        ));
        let b = Arc::new(FakeProvider::new(
            "b",
            EventSource::Outlook,
            vec![event("B1", EventSource::Outlook, t0() + Duration::days(2))],
        ));
        let store = Arc::new(MemoryCacheStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let engine = Aggregator::new(
            vec![dyn_provider(&a), dyn_provider(&b)],
            store.clone(),
        )
        .with_clock(clock.clone());

        Harness {
            a,
            b,
            store,
            clock,
            engine,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(Event::id).collect()
    }

    #[tokio::test]
    async fn merges_sorts_and_caches() {
        let h = harness();

        let events = h.engine.get_events().await.unwrap();
        assert_eq!(ids(&events), vec!["A1", "B1", "A2"]);

        let entry = decode_entry(KEY, &h.store.raw(KEY).unwrap()).unwrap();
        assert_eq!(entry.timestamp, t0());
        assert_eq!(entry.events, events);

        h.clock.advance(Duration::minutes(30));
        let again = h.engine.get_events().await.unwrap();
        assert_eq!(again, events);
        assert_eq!(h.a.calls(), 1);
        assert_eq!(h.b.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_reads_are_identical_and_free() {
        let h = harness();
        h.engine.refresh().await.unwrap();
        let calls = (h.a.calls(), h.b.calls());

        let first = h.engine.get_events().await.unwrap();
        h.clock.advance(Duration::minutes(59));
        let second = h.engine.get_events().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            encode_entry(&CacheEntry::new(first, t0())).unwrap(),
            encode_entry(&CacheEntry::new(second, t0())).unwrap()
        );
        assert_eq!((h.a.calls(), h.b.calls()), calls);
    }

    #[tokio::test]
    async fn stale_entry_triggers_exactly_one_refetch() {
        let h = harness();
        h.engine.get_events().await.unwrap();

        h.clock.advance(Duration::hours(1));
        h.engine.get_events().await.unwrap();
        assert_eq!(h.a.calls(), 2);
        assert_eq!(h.b.calls(), 2);

        h.engine.get_events().await.unwrap();
        assert_eq!(h.a.calls(), 2);

        let entry = decode_entry(KEY, &h.store.raw(KEY).unwrap()).unwrap();
        assert_eq!(entry.timestamp, t0() + Duration::hours(1));
    }

    #[tokio::test]
    async fn refresh_ignores_freshness() {
        let h = harness();
        h.engine.get_events().await.unwrap();
        h.engine.refresh().await.unwrap();
        assert_eq!(h.a.calls(), 2);
    }

    #[tokio::test]
    async fn any_failure_fails_refresh_and_keeps_cache() {
        let h = harness();
        h.engine.get_events().await.unwrap();
        let before = h.store.raw(KEY).unwrap();

        h.clock.advance(Duration::hours(2));
        h.b.set_failure(Some(ProviderErrorCode::Timeout));

        let err = h.engine.get_events().await.unwrap_err();
        let provider_err = err.provider_error().unwrap();
        assert_eq!(provider_err.code(), ProviderErrorCode::Timeout);
        assert_eq!(provider_err.provider(), Some("b"));
        assert_eq!(h.store.raw(KEY).unwrap(), before);

        // The stale entry is still there and the next call retries.
        h.b.set_failure(None);
        let events = h.engine.get_events().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(h.b.calls(), 3);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_fresh_cache_serving() {
        let h = harness();
        h.engine.get_events().await.unwrap();
        let before = h.store.raw(KEY).unwrap();

        h.b.set_failure(Some(ProviderErrorCode::NetworkError));
        assert!(h.engine.refresh().await.is_err());
        assert_eq!((h.a.calls(), h.b.calls()), (2, 2));
        assert_eq!(h.store.raw(KEY).unwrap(), before);

        h.b.set_failure(None);
        h.clock.advance(Duration::minutes(10));
        let events = h.engine.get_events().await.unwrap();
        assert_eq!(ids(&events), vec!["A1", "B1", "A2"]);
        assert_eq!((h.a.calls(), h.b.calls()), (2, 2));
    }

    #[tokio::test]
    async fn reports_first_failure_in_provider_order() {
        let h = harness();
        h.a.set_failure(Some(ProviderErrorCode::NetworkError));
        h.b.set_failure(Some(ProviderErrorCode::InvalidResponse));

        let err = h.engine.refresh().await.unwrap_err();
        let provider_err = err.provider_error().unwrap();
        assert_eq!(provider_err.provider(), Some("a"));
        assert!(!provider_err.is_parse_error());
        assert!(h.store.raw(KEY).is_none());
    }

    #[tokio::test]
    async fn parse_failure_surfaces_as_parse_error() {
        let h = harness();
        h.a.set_failure(Some(ProviderErrorCode::InvalidResponse));

        let err = h.engine.refresh().await.unwrap_err();
        assert!(err.provider_error().unwrap().is_parse_error());
    }

    #[tokio::test]
    async fn equal_starts_keep_provider_order() {
        let at = t0() + Duration::days(1);
        let a = Arc::new(FakeProvider::new(
            "a",
            EventSource::Google,
            vec![
                event("late", EventSource::Google, at + Duration::hours(5)),
                event("a-tie", EventSource::Google, at),
            ],
        ));
        let b = Arc::new(FakeProvider::new(
            "b",
            EventSource::Ics,
            vec![
                event("b-tie", EventSource::Ics, at),
                event("early", EventSource::Ics, at - Duration::hours(5)),
            ],
        ));
        let engine = Aggregator::new(
            vec![dyn_provider(&a), dyn_provider(&b)],
            Arc::new(MemoryCacheStore::new()),
        )
        .with_clock(Arc::new(ManualClock::new(t0())));

        let events = engine.refresh().await.unwrap();
        assert_eq!(ids(&events), vec!["early", "a-tie", "b-tie", "late"]);
        assert!(events.windows(2).all(|w| w[0].start() <= w[1].start()));
    }

    #[tokio::test]
    async fn duplicates_across_providers_are_kept() {
        let at = t0() + Duration::days(1);
        let a = Arc::new(FakeProvider::new(
            "a",
            EventSource::Google,
            vec![event("same", EventSource::Google, at)],
        ));
        let b = Arc::new(FakeProvider::new(
            "b",
            EventSource::Outlook,
            vec![event("same", EventSource::Outlook, at)],
        ));
        let engine = Aggregator::new(
            vec![dyn_provider(&a), dyn_provider(&b)],
            Arc::new(MemoryCacheStore::new()),
        );

        let events = engine.refresh().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_ne!(events[0].source(), events[1].source());
    }

    #[tokio::test]
    async fn unreadable_cache_is_a_miss() {
        let h = harness();
        h.store.insert_raw(KEY, "{ definitely not an entry");

        let events = h.engine.get_events().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(h.a.calls(), 1);
        assert!(decode_entry(KEY, &h.store.raw(KEY).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn cache_write_failure_is_an_error() {
        let a = Arc::new(FakeProvider::new(
            "a",
            EventSource::Google,
            vec![event("A1", EventSource::Google, t0())],
        ));
        let engine = Aggregator::new(vec![dyn_provider(&a)], Arc::new(BrokenStore));

        let err = engine.get_events().await.unwrap_err();
        assert!(matches!(err, EngineError::Cache(_)));
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn no_providers_yields_empty_list() {
        let store = Arc::new(MemoryCacheStore::new());
        let engine = Aggregator::new(Vec::new(), store.clone());

        assert!(engine.get_events().await.unwrap().is_empty());
        assert!(store.raw(KEY).is_some());
    }

    #[tokio::test]
    async fn providers_get_the_configured_window() {
        let h = harness();
        let engine = h
            .engine
            .with_config(EngineConfig::default().with_horizon(Duration::days(7)));
        engine.refresh().await.unwrap();

        let windows = h.a.windows();
        assert_eq!(windows, vec![TimeWindow::new(t0(), t0() + Duration::days(7))]);
        assert_eq!(h.b.windows(), windows);
    }

    #[tokio::test]
    async fn custom_cache_key_and_freshness() {
        let h = harness();
        let engine = h.engine.with_config(
            EngineConfig::default()
                .with_cache_key("work")
                .with_freshness(Duration::minutes(5)),
        );

        engine.get_events().await.unwrap();
        assert!(h.store.raw("work").is_some());
        assert!(h.store.raw(KEY).is_none());

        h.clock.advance(Duration::minutes(5));
        engine.get_events().await.unwrap();
        assert_eq!(h.a.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn providers_are_queried_concurrently() {
        let a = Arc::new(
            FakeProvider::new("a", EventSource::Google, Vec::new())
                .with_delay(std::time::Duration::from_secs(10)),
        );
        let b = Arc::new(
            FakeProvider::new("b", EventSource::Outlook, Vec::new())
                .with_delay(std::time::Duration::from_secs(10)),
        );
        let engine = Aggregator::new(
            vec![dyn_provider(&a), dyn_provider(&b)],
            Arc::new(MemoryCacheStore::new()),
        );

        let started = tokio::time::Instant::now();
        engine.refresh().await.unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(15));
    }

    #[tokio::test]
    async fn partial_refresh_keeps_successes_and_skips_cache() {
        let h = harness();
        h.b.set_failure(Some(ProviderErrorCode::ServerError));

        let partial = h.engine.refresh_partial().await;
        assert!(!partial.is_complete());
        assert_eq!(ids(&partial.events), vec!["A1", "A2"]);
        assert_eq!(partial.failures.len(), 1);
        assert_eq!(partial.failures[0].provider(), Some("b"));
        assert!(h.store.raw(KEY).is_none());
    }

    #[tokio::test]
    async fn partial_refresh_without_failures_is_complete() {
        let h = harness();
        let partial = h.engine.refresh_partial().await;
        assert!(partial.is_complete());
        assert_eq!(ids(&partial.events), vec!["A1", "B1", "A2"]);
    }
}
