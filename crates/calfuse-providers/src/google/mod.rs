//! Google Calendar provider implementation.
//!
//! This module provides a [`GoogleProvider`] that fetches events from
//! Google Calendar using the Calendar API v3.
//!
//! # Features
//!
//! - Bearer-token access (tokens are obtained elsewhere and passed in)
//! - Server-side expansion of recurring events (`singleEvents=true`)
//! - Transparent pagination via `nextPageToken`
//! - All-day events resolved to midnight UTC
//!
//! # Example
//!
//! ```ignore
//! use calfuse_providers::google::{GoogleConfig, GoogleProvider};
//!
//! let config = GoogleConfig::new(token).with_calendar_id("team@example.com");
//! let provider = GoogleProvider::new(config)?;
//! let events = provider.fetch_events(TimeWindow::upcoming(Utc::now())).await?;
//! ```

mod client;
mod config;
mod provider;

pub use config::GoogleConfig;
pub use provider::GoogleProvider;
