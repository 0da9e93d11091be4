//! Fakes shared by the engine tests.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use calfuse_core::{Event, EventSource, TimeWindow};
use calfuse_providers::{
    BoxFuture, CalendarProvider, ProviderError, ProviderErrorCode, ProviderResult,
};
use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, CacheStore};
use crate::error::{CacheError, CacheResult};

/// A provider that returns canned events and counts its calls.
#[derive(Debug)]
pub struct FakeProvider {
    name: String,
    source: EventSource,
    events: Mutex<Vec<Event>>,
    failure: Mutex<Option<ProviderErrorCode>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    windows: Mutex<Vec<TimeWindow>>,
}

impl FakeProvider {
    pub fn new(name: &str, source: EventSource, events: Vec<Event>) -> Self {
        Self {
            name: name.to_string(),
            source,
            events: Mutex::new(events),
            failure: Mutex::new(None),
            delay: None,
            calls: AtomicUsize::new(0),
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, source: EventSource, code: ProviderErrorCode) -> Self {
        let provider = Self::new(name, source, Vec::new());
        provider.set_failure(Some(code));
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failure(&self, code: Option<ProviderErrorCode>) {
        *self.failure.lock().unwrap() = code;
    }

    pub fn set_events(&self, events: Vec<Event>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn windows(&self) -> Vec<TimeWindow> {
        self.windows.lock().unwrap().clone()
    }
}

impl CalendarProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> EventSource {
        self.source
    }

    fn fetch_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push(window);
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match *self.failure.lock().unwrap() {
                Some(code) => Err(ProviderError::new(code, "injected failure").with_provider(&self.name)),
                None => Ok(self.events.lock().unwrap().clone()),
            }
        })
    }
}

/// A store whose reads and writes always fail.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl CacheStore for BrokenStore {
    fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, CacheResult<Option<CacheEntry>>> {
        Box::pin(async { Err(CacheError::unavailable("store offline")) })
    }

    fn set<'a>(&'a self, _key: &'a str, _entry: CacheEntry) -> BoxFuture<'a, CacheResult<()>> {
        Box::pin(async { Err(CacheError::unavailable("store offline")) })
    }
}

pub fn event(id: &str, source: EventSource, start: DateTime<Utc>) -> Event {
    Event::new(id, source, start, start + chrono::Duration::hours(1))
        .unwrap()
        .with_title(id)
}

pub fn dyn_provider(provider: &Arc<FakeProvider>) -> Arc<dyn CalendarProvider> {
    provider.clone()
}
