//! The canonical event model.
//!
//! Every provider adapter normalizes its payload into [`Event`] before
//! anything else in the system sees it. An event is immutable once built:
//! fields are private, and the only way to obtain one is through
//! [`Event::new`], which rejects records whose end precedes their start.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::TimeWindow;

/// The provider an event was fetched from.
///
/// This identifies the adapter of origin only. It never takes part in
/// event identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// Google Calendar.
    Google,
    /// Outlook / Exchange.
    Outlook,
    /// A generic ICS feed or CalDAV collection.
    Ics,
}

impl EventSource {
    /// Returns the wire name of this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Outlook => "outlook",
            Self::Ics => "ics",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventSource {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "outlook" => Ok(Self::Outlook),
            "ics" => Ok(Self::Ics),
            other => Err(EventError::UnknownSource(other.to_string())),
        }
    }
}

/// Errors raised while constructing an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The event ends before it starts.
    #[error("event {id} ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The source tag is not one of the known providers.
    #[error("unknown event source: {0}")]
    UnknownSource(String),
}

/// A calendar event, normalized from any provider.
///
/// `id` is unique only within its [`EventSource`]. Two events with equal ids
/// from different sources are unrelated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    id: String,
    title: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    source: EventSource,
    busy: bool,
}

impl Event {
    /// Creates a new event with an empty title that blocks availability.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::EndBeforeStart`] if `end < start`.
    pub fn new(
        id: impl Into<String>,
        source: EventSource,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, EventError> {
        let id = id.into();
        if end < start {
            return Err(EventError::EndBeforeStart { id, start, end });
        }

        Ok(Self {
            id,
            title: String::new(),
            start,
            end,
            source,
            busy: true,
        })
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder method to set whether the event blocks availability.
    pub fn with_busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    /// Identifier, unique within [`Event::source`].
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable summary. May be empty.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    /// Returns false only when the provider marked the interval as free.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns the event length.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if any part of the event falls inside `window`.
    ///
    /// Zero-length events count when their instant lies in the window.
    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        if self.start == self.end {
            return window.contains(self.start);
        }
        self.start < window.end && self.end > window.start
    }
}
