//! Configuration commands.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// The configuration as TOML, with secret references left unresolved.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<String> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    Ok(format!("# {}\n{}", path.display(), toml_str))
}

/// Checks that every provider section resolves to a usable adapter
/// configuration and that the cache settings are valid.
pub fn validate(config: &ClientConfig) -> ClientResult<String> {
    let mut report = String::new();
    let mut problems = Vec::new();

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        match google.to_provider_config() {
            Ok(_) => report.push_str("google: ok\n"),
            Err(e) => problems.push(format!("google: {}", e)),
        }
    }

    #[cfg(feature = "outlook")]
    if let Some(ref outlook) = config.outlook {
        match outlook.to_provider_config() {
            Ok(_) => report.push_str("outlook: ok\n"),
            Err(e) => problems.push(format!("outlook: {}", e)),
        }
    }

    #[cfg(feature = "ics")]
    for ics in &config.ics {
        match ics.to_provider_config() {
            Ok(_) => {
                let _ = writeln!(report, "{}: ok", ics.display_name());
            }
            Err(e) => problems.push(format!("{}: {}", ics.display_name(), e)),
        }
    }

    if let Err(e) = config.cache.engine_config() {
        problems.push(e);
    }

    if !problems.is_empty() {
        return Err(ClientError::Config(problems.join("; ")));
    }

    if config.provider_count() == 0 {
        report.push_str("no calendar providers configured\n");
    }
    let _ = writeln!(report, "cache: {}", config.cache.cache_dir().display());
    report.push_str("Configuration is valid.\n");
    Ok(report)
}

/// The configuration file path in use.
pub fn path(path: &Path) -> String {
    format!("config: {}\n", path.display())
}
