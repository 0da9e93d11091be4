//! Outlook / Exchange calendar provider.
//!
//! Reads the signed-in user's calendar view from the Outlook REST API.
//! Every timestamp is requested in UTC through the
//! `Prefer: outlook.timezone="UTC"` header, so the offset-less values the
//! API returns are read as UTC.

mod client;
mod config;
mod provider;

pub use config::OutlookConfig;
pub use provider::OutlookProvider;
