//! CalendarProvider trait and implementations.
//!
//! This crate provides the adapters that talk to remote calendars:
//!
//! - [`CalendarProvider`] - The trait every adapter implements
//! - [`ProviderError`] - Error type for fetch and parse failures
//! - [`normalize`] - Helpers shared by adapters to build [`Event`]s
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │   Google API    │ │   Outlook API   │ │ ICS feed/CalDAV │
//! └────────┬────────┘ └────────┬────────┘ └────────┬────────┘
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │ GoogleProvider  │ │ OutlookProvider │ │   IcsProvider   │
//! └────────┬────────┘ └────────┬────────┘ └────────┬────────┘
//!          │          CalendarProvider             │
//!          └───────────────────┬───────────────────┘
//!                              ▼
//!                       ┌─────────────┐
//!                       │    Event    │
//!                       └─────────────┘
//! ```
//!
//! Provider payloads never leave their adapter: each one converts its
//! response straight into [`Event`] values.
//!
//! # Example
//!
//! ```ignore
//! use calfuse_core::TimeWindow;
//! use calfuse_providers::CalendarProvider;
//!
//! async fn upcoming(provider: &dyn CalendarProvider) -> ProviderResult<Vec<Event>> {
//!     provider.fetch_events(TimeWindow::upcoming(chrono::Utc::now())).await
//! }
//! ```
//!
//! [`Event`]: calfuse_core::Event

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(any(feature = "google", feature = "outlook", feature = "ics"))]
mod http;
#[cfg(feature = "ics")]
pub mod ics;
pub mod normalize;
#[cfg(feature = "outlook")]
pub mod outlook;
pub mod provider;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderErrorKind, ProviderResult};
pub use provider::{BoxFuture, CalendarProvider, ErrorProvider};
