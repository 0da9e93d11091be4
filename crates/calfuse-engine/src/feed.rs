//! Observable view over an [`Aggregator`].
//!
//! A [`CalendarFeed`] exposes the last known events together with a loading
//! flag and the last error, so a front end can render "loading", "error" and
//! "data" states without driving the engine itself. Subscribers are notified
//! through a [`tokio::sync::watch`] channel on every state change.

use std::sync::Arc;

use calfuse_core::Event;
use tokio::sync::watch;
use tracing::debug;

use crate::engine::Aggregator;
use crate::error::EngineError;

/// Point-in-time state of a [`CalendarFeed`].
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// Events from the last successful load.
    pub events: Vec<Event>,
    /// Whether a load is in flight.
    pub loading: bool,
    /// Error of the last load, cleared when the next one starts.
    pub error: Option<Arc<EngineError>>,
}

impl FeedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
enum LoadMode {
    Cached,
    Forced,
}

/// Wraps an [`Aggregator`] and publishes its results.
#[derive(Debug)]
pub struct CalendarFeed {
    engine: Aggregator,
    state: watch::Sender<FeedSnapshot>,
}

impl CalendarFeed {
    pub fn new(engine: Aggregator) -> Self {
        let (state, _) = watch::channel(FeedSnapshot::default());
        Self { engine, state }
    }

    pub fn engine(&self) -> &Aggregator {
        &self.engine
    }

    /// Loads events through the cache.
    pub async fn load(&self) -> FeedSnapshot {
        self.run(LoadMode::Cached).await
    }

    /// Loads events bypassing the cache.
    pub async fn refresh(&self) -> FeedSnapshot {
        self.run(LoadMode::Forced).await
    }

    /// Current state.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.subscribe()
    }

    async fn run(&self, mode: LoadMode) -> FeedSnapshot {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        debug!(?mode, "feed load started");

        let result = match mode {
            LoadMode::Cached => self.engine.get_events().await,
            LoadMode::Forced => self.engine.refresh().await,
        };

        self.state.send_modify(|state| {
            match result {
                Ok(events) => state.events = events,
                // Previous events stay visible next to the error.
                Err(err) => state.error = Some(Arc::new(err)),
            }
            state.loading = false;
        });
        self.snapshot()
    }
}
