//! Event listing commands.

use calfuse_core::Event;
use calfuse_engine::{CalendarFeed, EngineError};
use chrono::Local;
use tracing::warn;

use crate::cli::OutputFormat;
use crate::error::ClientResult;
use crate::render::{render_json, render_table};

/// Renders events in the requested format, local time for tables.
pub fn render(events: &[Event], format: OutputFormat) -> ClientResult<String> {
    match format {
        OutputFormat::Table => Ok(render_table(events, &Local)),
        OutputFormat::Json => Ok(render_json(events)?),
    }
}

/// `calfuse events`: cached events while fresh, otherwise a refresh.
pub async fn list(feed: &CalendarFeed, format: OutputFormat) -> ClientResult<String> {
    let snapshot = feed.load().await;
    match snapshot.error {
        Some(err) => Err(err.into()),
        None => render(&snapshot.events, format),
    }
}

/// `calfuse refresh`: fetch from every provider and rewrite the cache.
pub async fn refresh(feed: &CalendarFeed, format: OutputFormat) -> ClientResult<String> {
    let snapshot = feed.refresh().await;
    match snapshot.error {
        Some(err) => Err(err.into()),
        None => render(&snapshot.events, format),
    }
}

/// `calfuse refresh --partial`: events of the providers that answered.
///
/// Each failure is logged as a warning. The command fails only when every
/// provider failed; the output holds nothing but the rendered events.
pub async fn refresh_partial(feed: &CalendarFeed, format: OutputFormat) -> ClientResult<String> {
    let engine = feed.engine();
    let partial = engine.refresh_partial().await;

    for failure in &partial.failures {
        warn!(error = %failure, "provider skipped");
    }

    let total = engine.provider_names().len();
    if total > 0 && partial.failures.len() == total {
        if let Some(err) = partial.failures.into_iter().next() {
            return Err(EngineError::from(err).into());
        }
    }
    render(&partial.events, format)
}
