//! ICS provider implementation.

use calfuse_core::{Event, EventSource, TimeWindow};
use tracing::{Instrument, info_span};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider};

use super::client::IcsClient;
use super::config::IcsConfig;

/// Provider for ICS feeds and CalDAV collections.
pub struct IcsProvider {
    client: IcsClient,
}

impl IcsProvider {
    pub fn new(config: IcsConfig) -> ProviderResult<Self> {
        let name = config.name.clone();
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(&name))?;

        let client = IcsClient::new(config).map_err(|e| e.with_provider(&name))?;
        Ok(Self { client })
    }
}

impl std::fmt::Debug for IcsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcsProvider")
            .field("config", self.client.config())
            .finish()
    }
}

impl CalendarProvider for IcsProvider {
    fn name(&self) -> &str {
        &self.client.config().name
    }

    fn source(&self) -> EventSource {
        EventSource::Ics
    }

    fn fetch_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        let span = info_span!("fetch_events", provider = %self.name());
        Box::pin(
            async move {
                self.client
                    .fetch(window)
                    .await
                    .map_err(|e| e.with_provider(self.name()))
            }
            .instrument(span),
        )
    }
}
