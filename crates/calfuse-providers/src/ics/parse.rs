//! iCalendar (RFC 5545) parsing into [`Event`]s.

use calfuse_core::{Event, EventSource};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike,
};
use tracing::{trace, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::normalize::{build_event, date_to_utc_midnight};

/// Parses an iCalendar document and returns one [`Event`] per usable VEVENT.
///
/// # Errors
///
/// Returns an `InvalidResponse` error if the document is not a calendar.
pub(super) fn parse_calendar(ics: &str) -> ProviderResult<Vec<Event>> {
    let trimmed = ics.trim_start_matches('\u{feff}').trim_start();
    if !trimmed
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(ProviderError::invalid_response(
            "payload is not an iCalendar document",
        ));
    }

    let calendar = trimmed
        .parse::<Calendar>()
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse ICS: {}", e)))?;

    Ok(calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => convert_event(event),
            _ => None,
        })
        .collect())
}

/// Converts a single VEVENT. Returns `None` for cancelled or malformed entries.
fn convert_event(event: &icalendar::Event) -> Option<Event> {
    if event
        .property_value("STATUS")
        .is_some_and(|s| s.eq_ignore_ascii_case("CANCELLED"))
    {
        return None;
    }

    let Some(uid) = event.get_uid() else {
        warn!("dropping VEVENT without UID");
        return None;
    };
    let Some(start) = event.get_start().map(to_utc) else {
        warn!(uid, "dropping VEVENT without DTSTART");
        return None;
    };
    let end = event.get_end().map(to_utc).unwrap_or(start);

    let busy = !event
        .property_value("TRANSP")
        .is_some_and(|t| t.eq_ignore_ascii_case("TRANSPARENT"));

    trace!(uid, %start, %end, busy, "parsed VEVENT");
    build_event(
        EventSource::Ics,
        uid,
        event.get_summary().unwrap_or_default(),
        start,
        end,
        busy,
    )
}

/// Resolves an iCalendar date or datetime to UTC.
///
/// DATE values become midnight UTC and floating times are taken as UTC.
/// TZID-qualified times are resolved in their IANA zone.
fn to_utc(value: DatePerhapsTime) -> DateTime<Utc> {
    match value {
        DatePerhapsTime::Date(date) => date_to_utc_midnight(date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => dt,
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            Utc.from_utc_datetime(&naive)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            zoned_to_utc(date_time, &tzid)
        }
    }
}

/// Converts a wall-clock time in `tzid` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times in
/// a DST gap use the offset in effect before the gap. Unknown zones are
/// taken as UTC.
fn zoned_to_utc(local: NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    let Ok(tz) = tzid.parse::<Tz>() else {
        warn!(tzid, "unknown TZID, reading time as UTC");
        return Utc.from_utc_datetime(&local);
    };

    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return dt.with_timezone(&Utc);
    }
    tz.from_local_datetime(&(local - Duration::hours(1)))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc) + Duration::hours(1))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(body: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Test//Test//EN\r\n{}END:VCALENDAR\r\n",
            body
        )
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn parse_basic_event() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:test-event-1@example.com\r\n\
             DTSTART:20250205T100000Z\r\n\
             DTEND:20250205T110000Z\r\n\
             SUMMARY:Team Meeting\r\n\
             STATUS:CONFIRMED\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id(), "test-event-1@example.com");
        assert_eq!(event.title(), "Team Meeting");
        assert_eq!(event.source(), EventSource::Ics);
        assert_eq!(event.start(), utc(2025, 2, 5, 10, 0));
        assert_eq!(event.end(), utc(2025, 2, 5, 11, 0));
        assert!(event.is_busy());
    }

    #[test]
    fn all_day_event_is_midnight_utc() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:all-day-1@example.com\r\n\
             DTSTART;VALUE=DATE:20250210\r\n\
             DTEND;VALUE=DATE:20250211\r\n\
             SUMMARY:Company Holiday\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert_eq!(events[0].start(), utc(2025, 2, 10, 0, 0));
        assert_eq!(events[0].end(), utc(2025, 2, 11, 0, 0));
    }

    #[test]
    fn missing_dtend_collapses_to_start() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:reminder\r\n\
             DTSTART:20250205T090000Z\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert_eq!(events[0].start(), events[0].end());
        assert_eq!(events[0].title(), "");
    }

    #[test]
    fn floating_times_are_taken_as_utc() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:floating\r\n\
             DTSTART:20250205T090000\r\n\
             DTEND:20250205T093000\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert_eq!(events[0].start(), utc(2025, 2, 5, 9, 0));
        assert_eq!(events[0].end(), utc(2025, 2, 5, 9, 30));
    }

    #[test]
    fn zoned_times_resolve_to_instants() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:new-york\r\n\
             DTSTART;TZID=America/New_York:20250205T090000\r\n\
             DTEND;TZID=America/New_York:20250205T100000\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:paris-summer\r\n\
             DTSTART;TZID=Europe/Paris:20250702T140000\r\n\
             DTEND;TZID=Europe/Paris:20250702T150000\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert_eq!(events[0].start(), utc(2025, 2, 5, 14, 0));
        assert_eq!(events[0].end(), utc(2025, 2, 5, 15, 0));
        assert_eq!(events[1].start(), utc(2025, 7, 2, 12, 0));
        assert_eq!(events[1].end(), utc(2025, 7, 2, 13, 0));
    }

    #[test]
    fn zoned_times_across_dst_transitions() {
        // 02:30 does not exist on 2025-03-09 in New York; 01:30 happens twice on 2025-11-02.
        let gap = zoned_to_utc(
            NaiveDateTime::parse_from_str("20250309T023000", "%Y%m%dT%H%M%S").unwrap(),
            "America/New_York",
        );
        assert_eq!(gap, utc(2025, 3, 9, 7, 30));

        let overlap = zoned_to_utc(
            NaiveDateTime::parse_from_str("20251102T013000", "%Y%m%dT%H%M%S").unwrap(),
            "America/New_York",
        );
        assert_eq!(overlap, utc(2025, 11, 2, 5, 30));
    }

    #[test]
    fn unknown_zone_is_taken_as_utc() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:windows-zone\r\n\
             DTSTART;TZID=Mars/Olympus_Mons:20250205T090000\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert_eq!(events[0].start(), utc(2025, 2, 5, 9, 0));
    }

    #[test]
    fn transparency_controls_busy() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             UID:free\r\n\
             DTSTART:20250205T090000Z\r\n\
             DTEND:20250205T100000Z\r\n\
             TRANSP:transparent\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:opaque\r\n\
             DTSTART:20250205T090000Z\r\n\
             DTEND:20250205T100000Z\r\n\
             TRANSP:OPAQUE\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        assert!(!events[0].is_busy());
        assert!(events[1].is_busy());
    }

    #[test]
    fn unusable_vevents_are_dropped() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
             DTSTART:20250205T090000Z\r\n\
             SUMMARY:No uid\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:no-start\r\n\
             SUMMARY:No start\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:cancelled\r\n\
             DTSTART:20250205T090000Z\r\n\
             STATUS:CANCELLED\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:inverted\r\n\
             DTSTART:20250205T100000Z\r\n\
             DTEND:20250205T090000Z\r\n\
             END:VEVENT\r\n\
             BEGIN:VEVENT\r\n\
             UID:kept\r\n\
             DTSTART:20250205T090000Z\r\n\
             END:VEVENT\r\n",
        );

        let events = parse_calendar(&ics).unwrap();
        let ids: Vec<_> = events.iter().map(Event::id).collect();
        assert_eq!(ids, vec!["kept"]);
    }

    #[test]
    fn non_calendar_payload_is_parse_error() {
        let err = parse_calendar("<html><body>Login required</body></html>").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn empty_calendar_has_no_events() {
        assert!(parse_calendar(&calendar("")).unwrap().is_empty());
    }
}
