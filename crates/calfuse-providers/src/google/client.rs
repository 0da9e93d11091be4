//! Google Calendar API client.
//!
//! Low-level HTTP access to the events.list endpoint and conversion of its
//! payload into [`Event`]s.

use calfuse_core::{Event, EventSource, TimeWindow};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::http;
use crate::normalize::{build_event, parse_date, parse_rfc3339};

use super::config::GoogleConfig;

/// Google Calendar API client.
#[derive(Debug)]
pub(super) struct GoogleCalendarClient {
    http_client: reqwest::Client,
    config: GoogleConfig,
}

impl GoogleCalendarClient {
    pub(super) fn new(config: GoogleConfig) -> ProviderResult<Self> {
        let http_client = http::build_client(config.timeout, Some(config.user_agent.as_str()), true)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Lists every event in `window`, following pagination.
    pub(super) async fn list_events(&self, window: TimeWindow) -> ProviderResult<Vec<Event>> {
        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_events_page(window, page_token.as_deref()).await?;
            all_events.extend(page.items.into_iter().filter_map(convert_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            calendar_id = %self.config.calendar_id,
            count = all_events.len(),
            "fetched google events"
        );
        Ok(all_events)
    }

    async fn list_events_page(
        &self,
        window: TimeWindow,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let mut request = self
            .http_client
            .get(self.config.events_url())
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(http::transport_error)?;
        let response = http::check_status(response).await?;
        let body = http::read_body(response).await?;
        http::decode_json(&body)
    }
}

/// Converts a Google Calendar API event to an [`Event`].
///
/// Returns `None` for cancelled events and for records missing an id or
/// a usable start/end.
fn convert_event(event: ApiEvent) -> Option<Event> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let Some(id) = event.id else {
        warn!("dropping google event without id");
        return None;
    };

    let start = event.start.as_ref().and_then(ApiEventTime::resolve);
    let end = event.end.as_ref().and_then(ApiEventTime::resolve);
    let (Some(start), Some(end)) = (start, end) else {
        warn!(event_id = %id, "dropping google event without usable start/end");
        return None;
    };

    let busy = event.transparency.as_deref() != Some("transparent");
    build_event(
        EventSource::Google,
        &id,
        event.summary.as_deref().unwrap_or_default(),
        start,
        end,
        busy,
    )
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    start: Option<ApiEventTime>,
    #[serde(default)]
    end: Option<ApiEventTime>,
    status: Option<String>,
    transparency: Option<String>,
}

/// Event time from the API: `dateTime` for timed events, `date` for all-day.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEventTime {
    fn resolve(&self) -> Option<DateTime<Utc>> {
        match (&self.date_time, &self.date) {
            (Some(dt), _) => parse_rfc3339(dt),
            (None, Some(date)) => parse_date(date),
            (None, None) => None,
        }
    }
}
