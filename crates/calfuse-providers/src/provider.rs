//! CalendarProvider trait definition.
//!
//! A provider knows how to reach one remote calendar and turn its payload
//! into [`Event`]s. It does not cache, retry or sort: the aggregation engine
//! owns all of that.

use std::future::Future;
use std::pin::Pin;

use calfuse_core::{Event, EventSource, TimeWindow};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxing keeps the trait object-safe so the engine can hold a
/// heterogeneous `Vec<Arc<dyn CalendarProvider>>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The abstraction every calendar adapter implements.
///
/// # Implementation Notes
///
/// - Every returned event must carry [`CalendarProvider::source`] as its source
/// - Pagination is handled internally; callers get one flat list
/// - A record that cannot be normalized is dropped with a warning, while a
///   payload that cannot be decoded at all fails with
///   [`ProviderErrorCode::InvalidResponse`](crate::ProviderErrorCode::InvalidResponse)
///
/// ```ignore
/// impl CalendarProvider for MyProvider {
///     fn name(&self) -> &str { "mine" }
///     fn source(&self) -> EventSource { EventSource::Ics }
///
///     fn fetch_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
///         Box::pin(async move { self.client.list(window).await })
///     }
/// }
/// ```
pub trait CalendarProvider: Send + Sync {
    /// Short name used in logs and error messages (e.g. "google", "work-ics").
    fn name(&self) -> &str;

    /// The source tag stamped on every event this provider returns.
    fn source(&self) -> EventSource;

    /// Fetches every event overlapping `window`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failures, non-success responses
    /// and undecodable payloads.
    fn fetch_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>>;
}

/// A provider that always fails.
///
/// Used in place of an adapter whose configuration could not be loaded, so
/// the failure surfaces through the normal refresh path instead of being
/// silently skipped.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    source: EventSource,
    error: ProviderError,
}

impl ErrorProvider {
    pub fn new(name: impl Into<String>, source: EventSource, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            source,
            error,
        }
    }
}

impl CalendarProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> EventSource {
        self.source
    }

    fn fetch_events(&self, _window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        // ProviderError is not Clone because of its boxed source
        let error =
            ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}
