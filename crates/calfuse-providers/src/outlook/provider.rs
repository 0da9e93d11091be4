use calfuse_core::{Event, EventSource, TimeWindow};
use tracing::{Instrument, info_span};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, CalendarProvider};

use super::client::OutlookClient;
use super::config::OutlookConfig;

/// Outlook calendar provider.
#[derive(Debug)]
pub struct OutlookProvider {
    client: OutlookClient,
}

impl OutlookProvider {
    pub const NAME: &'static str = "outlook";

    pub fn new(config: OutlookConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(Self::NAME))?;

        let client = OutlookClient::new(config).map_err(|e| e.with_provider(Self::NAME))?;
        Ok(Self { client })
    }
}

impl CalendarProvider for OutlookProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn source(&self) -> EventSource {
        EventSource::Outlook
    }

    fn fetch_events(&self, window: TimeWindow) -> BoxFuture<'_, ProviderResult<Vec<Event>>> {
        let span = info_span!("fetch_events", provider = Self::NAME);
        Box::pin(
            async move {
                self.client
                    .calendar_view(window)
                    .await
                    .map_err(|e| e.with_provider(Self::NAME))
            }
            .instrument(span),
        )
    }
}
