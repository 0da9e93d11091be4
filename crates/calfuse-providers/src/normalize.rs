//! Helpers shared by adapters to turn provider records into [`Event`]s.
//!
//! Adapters decode their payload into provider-specific structs, then call
//! [`build_event`] for each record. A record that cannot be normalized is
//! logged and dropped so one bad entry never fails a whole fetch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

use calfuse_core::{Event, EventSource};

/// Builds an [`Event`], or drops the record with a warning if its end
/// precedes its start.
pub fn build_event(
    source: EventSource,
    id: &str,
    title: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    busy: bool,
) -> Option<Event> {
    match Event::new(id, source, start, end) {
        Ok(event) => Some(event.with_title(title).with_busy(busy)),
        Err(err) => {
            warn!(%source, event_id = id, error = %err, "dropping malformed event");
            None
        }
    }
}

/// Parses an RFC 3339 timestamp and converts it to UTC.
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a timestamp that may lack an offset.
///
/// RFC 3339 is tried first. Otherwise the value is read as a naive
/// `YYYY-MM-DDTHH:MM:SS[.fffffff]` timestamp and taken to be UTC.
pub fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_rfc3339(value).or_else(|| {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    })
}

/// Resolves an all-day date to midnight UTC of that date.
pub fn date_to_utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Parses a bare `YYYY-MM-DD` date to midnight UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(date_to_utc_midnight)
}
