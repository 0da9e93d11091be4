//! HTTP access for ICS feeds and CalDAV collections.

use reqwest::{Method, RequestBuilder};
use tracing::{debug, trace};

use calfuse_core::{Event, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::http;

use super::config::{IcsConfig, IcsMode};
use super::parse::parse_calendar;
use super::xml::{calendar_query_body, parse_report_response};

pub(super) struct IcsClient {
    http_client: reqwest::Client,
    config: IcsConfig,
}

impl IcsClient {
    pub(super) fn new(config: IcsConfig) -> ProviderResult<Self> {
        let http_client =
            http::build_client(config.timeout, Some(config.user_agent.as_str()), config.verify_tls)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub(super) fn config(&self) -> &IcsConfig {
        &self.config
    }

    /// Fetches the events overlapping `window` using the configured mode.
    pub(super) async fn fetch(&self, window: TimeWindow) -> ProviderResult<Vec<Event>> {
        match self.config.mode {
            IcsMode::Feed => self.fetch_feed(window).await,
            IcsMode::CalDav => self.fetch_caldav(window).await,
        }
    }

    async fn fetch_feed(&self, window: TimeWindow) -> ProviderResult<Vec<Event>> {
        let request = self.http_client.get(self.config.url.clone());
        let body = self.send(request).await?;

        let parsed = parse_calendar(&body)?;
        let total = parsed.len();
        let events = within(parsed, &window);

        debug!(
            url = %self.config.url,
            total,
            in_window = events.len(),
            "fetched ICS feed"
        );
        Ok(events)
    }

    async fn fetch_caldav(&self, window: TimeWindow) -> ProviderResult<Vec<Event>> {
        let report = Method::from_bytes(b"REPORT")
            .map_err(|e| ProviderError::internal(format!("invalid method: {}", e)))?;
        let request = self
            .http_client
            .request(report, self.config.url.clone())
            .header("Depth", "1")
            .header("Content-Type", "application/xml; charset=utf-8")
            .body(calendar_query_body(window)?);
        let body = self.send(request).await?;
        let events = events_from_report(&body, &window)?;

        debug!(url = %self.config.url, count = events.len(), "fetched CalDAV events");
        Ok(events)
    }

    async fn send(&self, mut request: RequestBuilder) -> ProviderResult<String> {
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(username, Some(password));
        }

        trace!(url = %self.config.url, mode = ?self.config.mode, "sending request");
        let response = request.send().await.map_err(http::transport_error)?;
        let response = http::check_status(response).await?;
        http::read_body(response).await
    }
}

/// Parses every calendar in a REPORT response, keeping events in `window`.
///
/// Servers that ignore `expand` return unexpanded recurring masters dated at
/// their first occurrence; those fall outside the window and are dropped.
fn events_from_report(body: &str, window: &TimeWindow) -> ProviderResult<Vec<Event>> {
    let mut events = Vec::new();
    for data in parse_report_response(body)? {
        events.extend(parse_calendar(&data)?);
    }
    Ok(within(events, window))
}

fn within(events: Vec<Event>, window: &TimeWindow) -> Vec<Event> {
    events.into_iter().filter(|e| e.overlaps(window)).collect()
}
