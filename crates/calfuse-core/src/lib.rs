//! Core types: events, time windows, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{Event, EventError, EventSource};
pub use time::{FETCH_HORIZON_DAYS, TimeWindow};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
