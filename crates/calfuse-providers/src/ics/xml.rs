//! XML for the CalDAV calendar-query REPORT.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use calfuse_core::TimeWindow;

use crate::error::{ProviderError, ProviderResult};

const DAV_NS: &str = "DAV:";
const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// Builds the REPORT body asking for every VEVENT overlapping `window`.
pub(super) fn calendar_query_body(window: TimeWindow) -> ProviderResult<String> {
    write_calendar_query(window)
        .map_err(|e| ProviderError::internal(format!("failed to build calendar-query: {}", e)))
}

fn write_calendar_query(window: TimeWindow) -> quick_xml::Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut query = BytesStart::new("c:calendar-query");
    query.push_attribute(("xmlns:d", DAV_NS));
    query.push_attribute(("xmlns:c", CALDAV_NS));
    writer.write_event(Event::Start(query))?;

    let start = format_icalendar_datetime(window.start);
    let end = format_icalendar_datetime(window.end);

    writer.write_event(Event::Start(BytesStart::new("d:prop")))?;
    writer.write_event(Event::Empty(BytesStart::new("d:getetag")))?;
    writer.write_event(Event::Start(BytesStart::new("c:calendar-data")))?;
    let mut expand = BytesStart::new("c:expand");
    expand.push_attribute(("start", start.as_str()));
    expand.push_attribute(("end", end.as_str()));
    writer.write_event(Event::Empty(expand))?;
    writer.write_event(Event::End(BytesEnd::new("c:calendar-data")))?;
    writer.write_event(Event::End(BytesEnd::new("d:prop")))?;

    writer.write_event(Event::Start(BytesStart::new("c:filter")))?;
    let mut vcalendar = BytesStart::new("c:comp-filter");
    vcalendar.push_attribute(("name", "VCALENDAR"));
    writer.write_event(Event::Start(vcalendar))?;
    let mut vevent = BytesStart::new("c:comp-filter");
    vevent.push_attribute(("name", "VEVENT"));
    writer.write_event(Event::Start(vevent))?;

    let mut time_range = BytesStart::new("c:time-range");
    time_range.push_attribute(("start", start.as_str()));
    time_range.push_attribute(("end", end.as_str()));
    writer.write_event(Event::Empty(time_range))?;

    writer.write_event(Event::End(BytesEnd::new("c:comp-filter")))?;
    writer.write_event(Event::End(BytesEnd::new("c:comp-filter")))?;
    writer.write_event(Event::End(BytesEnd::new("c:filter")))?;
    writer.write_event(Event::End(BytesEnd::new("c:calendar-query")))?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts every `calendar-data` payload from a multistatus response.
///
/// # Errors
///
/// Returns an `InvalidResponse` error if the XML is malformed.
pub(super) fn parse_report_response(xml: &str) -> ProviderResult<Vec<String>> {
    let mut results = Vec::new();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_calendar_data = false;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if local_name(e.name().as_ref()) == b"calendar-data" {
                    in_calendar_data = true;
                    current.clear();
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"calendar-data" && in_calendar_data {
                    in_calendar_data = false;
                    if !current.trim().is_empty() {
                        results.push(std::mem::take(&mut current));
                    }
                }
            }
            Ok(Event::Text(e)) if in_calendar_data => {
                let text = e.unescape().map_err(|err| xml_error(&reader, err))?;
                current.push_str(&text);
            }
            Ok(Event::CData(e)) if in_calendar_data => {
                current.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(&reader, err)),
            _ => {}
        }
    }

    Ok(results)
}

fn xml_error(reader: &quick_xml::Reader<&[u8]>, err: quick_xml::Error) -> ProviderError {
    ProviderError::invalid_response(format!(
        "malformed multistatus at byte {}: {}",
        reader.buffer_position(),
        err
    ))
}

/// Strips the namespace prefix from an element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Formats a datetime for iCalendar time-range filters (UTC format).
fn format_icalendar_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}
