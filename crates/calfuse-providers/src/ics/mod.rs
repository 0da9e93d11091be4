//! ICS feed and CalDAV provider implementation.
//!
//! # Features
//!
//! - Plain `.ics` feeds ([`IcsMode::Feed`]), windowed after parsing
//! - CalDAV collections ([`IcsMode::CalDav`]) through a `calendar-query`
//!   REPORT with a `time-range` filter
//! - Basic authentication
//!
//! # Example
//!
//! ```ignore
//! use calfuse_providers::ics::{IcsConfig, IcsMode, IcsProvider};
//!
//! let config = IcsConfig::new("https://dav.example.com/calendars/alice/work/")?
//!     .with_credentials("alice", password)
//!     .with_mode(IcsMode::CalDav);
//!
//! let provider = IcsProvider::new(config)?;
//! ```

mod client;
mod config;
mod parse;
mod provider;
mod xml;

pub use config::{IcsConfig, IcsMode};
pub use provider::IcsProvider;
