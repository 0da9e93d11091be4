//! Outlook REST API client.

use calfuse_core::{Event, EventSource, TimeWindow};
use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderResult;
use crate::http;
use crate::normalize::{build_event, parse_utc_timestamp};

use super::config::OutlookConfig;

const PREFER_UTC: &str = "outlook.timezone=\"UTC\"";

#[derive(Debug)]
pub(super) struct OutlookClient {
    http_client: reqwest::Client,
    config: OutlookConfig,
}

impl OutlookClient {
    pub(super) fn new(config: OutlookConfig) -> ProviderResult<Self> {
        let http_client = http::build_client(config.timeout, Some(config.user_agent.as_str()), true)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Reads the calendar view for `window`, following `@odata.nextLink`.
    pub(super) async fn calendar_view(&self, window: TimeWindow) -> ProviderResult<Vec<Event>> {
        let mut all_events = Vec::new();
        let first = self
            .http_client
            .get(self.config.calendar_view_url())
            .query(&[
                (
                    "startDateTime",
                    window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
                (
                    "endDateTime",
                    window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            ]);

        let mut page = self.fetch_page(first).await?;
        loop {
            all_events.extend(page.value.into_iter().filter_map(convert_event));

            match page.next_link {
                // The link already carries every query parameter.
                Some(link) => page = self.fetch_page(self.http_client.get(link)).await?,
                None => break,
            }
        }

        debug!(count = all_events.len(), "fetched outlook events");
        Ok(all_events)
    }

    async fn fetch_page(&self, request: reqwest::RequestBuilder) -> ProviderResult<CalendarViewPage> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .header("Prefer", PREFER_UTC)
            .send()
            .await
            .map_err(http::transport_error)?;
        let response = http::check_status(response).await?;
        let body = http::read_body(response).await?;
        http::decode_json(&body)
    }
}

fn convert_event(event: ApiEvent) -> Option<Event> {
    if event.is_cancelled {
        return None;
    }

    let Some(id) = event.id else {
        warn!("dropping outlook event without Id");
        return None;
    };

    let start = event.start.as_ref().and_then(|t| parse_utc_timestamp(&t.date_time));
    let end = event.end.as_ref().and_then(|t| parse_utc_timestamp(&t.date_time));
    let (Some(start), Some(end)) = (start, end) else {
        warn!(event_id = %id, "dropping outlook event without usable Start/End");
        return None;
    };

    // Only the exact "Busy" literal blocks time; Tentative, Oof and
    // WorkingElsewhere do not.
    let busy = event.show_as.as_deref() == Some("Busy");
    build_event(
        EventSource::Outlook,
        &id,
        event.subject.as_deref().unwrap_or_default(),
        start,
        end,
        busy,
    )
}

#[derive(Debug, Deserialize)]
struct CalendarViewPage {
    #[serde(default)]
    value: Vec<ApiEvent>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiEvent {
    id: Option<String>,
    subject: Option<String>,
    #[serde(default)]
    start: Option<ApiDateTime>,
    #[serde(default)]
    end: Option<ApiDateTime>,
    show_as: Option<String>,
    #[serde(default)]
    is_cancelled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiDateTime {
    date_time: String,
}
