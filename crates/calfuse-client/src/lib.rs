//! calfuse CLI: config file, secret references, rendering
//!
//! This crate provides the `calfuse` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod providers;
pub mod render;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
