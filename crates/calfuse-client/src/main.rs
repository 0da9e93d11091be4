//! calfuse CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use calfuse_client::cli::{Cli, Command, ConfigAction};
use calfuse_client::config::ClientConfig;
use calfuse_client::error::{ClientError, ClientResult};
use calfuse_client::{commands, providers};
use calfuse_core::{TracingConfig, TracingOutputFormat, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
    };
    if cli.log_json {
        tracing_config = tracing_config.with_format(TracingOutputFormat::Json);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli).await {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<String> {
    let format = cli.output_format();
    let (config, config_path) = load_config(cli.config)?;

    match cli.command.unwrap_or(Command::Events) {
        Command::Events => {
            let feed = providers::build_feed(&config)?;
            commands::events::list(&feed, format).await
        }
        Command::Refresh { partial: false } => {
            let feed = providers::build_feed(&config)?;
            commands::events::refresh(&feed, format).await
        }
        Command::Refresh { partial: true } => {
            let feed = providers::build_feed(&config)?;
            commands::events::refresh_partial(&feed, format).await
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => Ok(commands::config::path(&config_path)),
        },
    }
}

/// An explicit path must exist; the default path may be absent.
fn load_config(explicit: Option<PathBuf>) -> ClientResult<(ClientConfig, PathBuf)> {
    match explicit {
        Some(path) => {
            let config = ClientConfig::load_from(&path).map_err(ClientError::Config)?;
            Ok((config, path))
        }
        None => {
            let config = ClientConfig::load().map_err(ClientError::Config)?;
            Ok((config, ClientConfig::default_path()))
        }
    }
}
