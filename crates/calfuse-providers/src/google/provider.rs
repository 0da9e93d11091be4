//! Google Calendar provider implementation.
//!
//! This module implements the [`CalendarProvider`] trait for Google Calendar.

use calfuse_core::{Event, EventSource, TimeWindow};
use tracing::{Instrument, info_span};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;

/// Google Calendar provider.
#[derive(Debug)]
pub struct GoogleProvider {
    client: GoogleCalendarClient,
}

impl GoogleProvider {
    /// Name reported in logs and errors.
    pub const NAME: &'static str = "google";

    /// Creates a new Google provider with the given configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(Self::NAME))?;

        let client = GoogleCalendarClient::new(config).map_err(|e| e.with_provider(Self::NAME))?;
        Ok(Self { client })
    }
}

impl CalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn source(&self) -> EventSource {
        EventSource::Google
    }

    fn fetch_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        let span = info_span!("fetch_events", provider = Self::NAME);
        Box::pin(
            async move {
                self.client
                    .list_events(window)
                    .await
                    .map_err(|e| e.with_provider(Self::NAME))
            }
            .instrument(span),
        )
    }
}
