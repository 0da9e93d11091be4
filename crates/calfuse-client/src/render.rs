//! Output rendering.

use std::fmt::{Display, Write as _};

use calfuse_core::Event;
use chrono::TimeZone;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Text printed instead of a table when there is nothing to show.
pub const NO_EVENTS: &str = "No upcoming events";

/// Renders events as an aligned table in the given time zone.
pub fn render_table<Tz>(events: &[Event], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if events.is_empty() {
        return format!("{}\n", NO_EVENTS);
    }

    let mut out = String::new();
    push_row(&mut out, "START", "END", "SOURCE", "BUSY", "TITLE");
    for event in events {
        let start = event.start().with_timezone(tz).format(TIME_FORMAT).to_string();
        let end = event.end().with_timezone(tz).format(TIME_FORMAT).to_string();
        let busy = if event.is_busy() { "busy" } else { "free" };
        let title = if event.title().is_empty() {
            "(no title)"
        } else {
            event.title()
        };
        push_row(&mut out, &start, &end, event.source().as_str(), busy, title);
    }
    out
}

fn push_row(out: &mut String, start: &str, end: &str, source: &str, busy: &str, title: &str) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{:<16}  {:<16}  {:<7}  {:<4}  {}", start, end, source, busy, title);
}

/// Renders events as a pretty-printed JSON array.
pub fn render_json(events: &[Event]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(events)
}
