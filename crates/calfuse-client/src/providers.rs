//! Provider and engine construction from [`ClientConfig`].
//!
//! A section that cannot be turned into a working adapter (missing token,
//! unresolvable secret, bad URL) still yields a provider: an
//! [`ErrorProvider`] that fails every fetch with a configuration error. The
//! refresh then fails loudly instead of silently merging fewer calendars.

use std::sync::Arc;

use calfuse_engine::{Aggregator, CalendarFeed, FileCacheStore};
use calfuse_providers::CalendarProvider;
#[cfg(any(feature = "google", feature = "outlook", feature = "ics"))]
use calfuse_providers::{ErrorProvider, ProviderError};
#[cfg(any(feature = "google", feature = "outlook", feature = "ics"))]
use tracing::warn;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds providers in a fixed order: Google, Outlook, then each `[[ics]]`
/// entry as listed.
pub fn build_providers(config: &ClientConfig) -> Vec<Arc<dyn CalendarProvider>> {
    let providers: Vec<Arc<dyn CalendarProvider>> = google_provider(config)
        .into_iter()
        .chain(outlook_provider(config))
        .chain(ics_providers(config))
        .collect();

    debug!(count = providers.len(), "providers configured");
    providers
}

#[cfg(feature = "google")]
fn google_provider(config: &ClientConfig) -> Option<Arc<dyn CalendarProvider>> {
    use calfuse_providers::google::GoogleProvider;

    let google = config.google.as_ref()?;
    let provider = google
        .to_provider_config()
        .map_err(ProviderError::configuration)
        .and_then(GoogleProvider::new);
    Some(or_error_provider("google", calfuse_core::EventSource::Google, provider))
}

#[cfg(not(feature = "google"))]
fn google_provider(_config: &ClientConfig) -> Option<Arc<dyn CalendarProvider>> {
    None
}

#[cfg(feature = "outlook")]
fn outlook_provider(config: &ClientConfig) -> Option<Arc<dyn CalendarProvider>> {
    use calfuse_providers::outlook::OutlookProvider;

    let outlook = config.outlook.as_ref()?;
    let provider = outlook
        .to_provider_config()
        .map_err(ProviderError::configuration)
        .and_then(OutlookProvider::new);
    Some(or_error_provider("outlook", calfuse_core::EventSource::Outlook, provider))
}

#[cfg(not(feature = "outlook"))]
fn outlook_provider(_config: &ClientConfig) -> Option<Arc<dyn CalendarProvider>> {
    None
}

#[cfg(feature = "ics")]
fn ics_providers(config: &ClientConfig) -> Vec<Arc<dyn CalendarProvider>> {
    use calfuse_providers::ics::IcsProvider;

    config
        .ics
        .iter()
        .map(|ics| {
            let provider = ics
                .to_provider_config()
                .map_err(ProviderError::configuration)
                .and_then(IcsProvider::new);
            or_error_provider(ics.display_name(), calfuse_core::EventSource::Ics, provider)
        })
        .collect()
}

#[cfg(not(feature = "ics"))]
fn ics_providers(_config: &ClientConfig) -> Vec<Arc<dyn CalendarProvider>> {
    Vec::new()
}

#[cfg(any(feature = "google", feature = "outlook", feature = "ics"))]
fn or_error_provider<P>(
    name: &str,
    source: calfuse_core::EventSource,
    provider: Result<P, ProviderError>,
) -> Arc<dyn CalendarProvider>
where
    P: CalendarProvider + 'static,
{
    match provider {
        Ok(provider) => Arc::new(provider),
        Err(err) => {
            let err = err.with_provider(name);
            warn!(provider = name, error = %err, "provider misconfigured");
            Arc::new(ErrorProvider::new(name, source, err))
        }
    }
}

/// Builds the aggregator over a file cache.
pub fn build_aggregator(config: &ClientConfig) -> ClientResult<Aggregator> {
    let engine_config = config.cache.engine_config().map_err(ClientError::Config)?;
    let store = FileCacheStore::new(config.cache.cache_dir());
    debug!(dir = %store.dir().display(), key = %engine_config.cache_key, "using file cache");

    Ok(Aggregator::new(build_providers(config), Arc::new(store)).with_config(engine_config))
}

/// Builds the feed the commands read from.
pub fn build_feed(config: &ClientConfig) -> ClientResult<CalendarFeed> {
    build_aggregator(config).map(CalendarFeed::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_sections_no_providers() {
        let config = ClientConfig::default();
        assert!(build_providers(&config).is_empty());
    }

    #[test]
    fn one_provider_per_enabled_section() {
        let config = ClientConfig::parse(
            r#"
[google]
access_token = "token"

[outlook]

[[ics]]
url = "https://example.com/a.ics"

[[ics]]
url = "not a url"
"#,
        )
        .unwrap();

        let expected = usize::from(cfg!(feature = "google"))
            + usize::from(cfg!(feature = "outlook"))
            + if cfg!(feature = "ics") { 2 } else { 0 };
        assert_eq!(build_providers(&config).len(), expected);
        assert_eq!(config.provider_count(), expected);
    }

    #[cfg(all(feature = "google", feature = "ics"))]
    #[test]
    fn order_and_names() {
        let config = ClientConfig::parse(
            r#"
[google]
access_token = "token"

[[ics]]
name = "team"
url = "https://example.com/team.ics"

[[ics]]
url = "https://example.com/other.ics"
"#,
        )
        .unwrap();

        let providers = build_providers(&config);
        let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["google", "team", "ics"]);
    }

    #[cfg(feature = "google")]
    #[tokio::test]
    async fn misconfigured_section_fails_at_fetch() {
        use calfuse_core::TimeWindow;
        use calfuse_providers::ProviderErrorCode;

        let config = ClientConfig::parse("[google]\n").unwrap();
        let providers = build_providers(&config);
        assert_eq!(providers.len(), 1);

        let now = chrono::Utc::now();
        let err = providers[0]
            .fetch_events(TimeWindow::upcoming(now))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google"));
    }

    #[test]
    fn aggregator_uses_cache_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::default();
        config.cache.dir = Some(dir.path().to_path_buf());
        config.cache.key = "personal".to_string();

        let engine = build_aggregator(&config).unwrap();
        assert_eq!(engine.config().cache_key, "personal");
        assert!(engine.provider_names().is_empty());
    }

    #[test]
    fn invalid_cache_settings_are_config_errors() {
        let mut config = ClientConfig::default();
        config.cache.key = " ".to_string();
        assert!(matches!(build_aggregator(&config), Err(ClientError::Config(_))));
    }
}
