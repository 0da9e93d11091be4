//! Google Calendar provider configuration.

use std::time::Duration;

/// Configuration for the Google Calendar provider.
#[derive(Clone)]
pub struct GoogleConfig {
    /// OAuth bearer token. Acquiring and refreshing it is the caller's job.
    pub access_token: String,

    /// Calendar to read. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Base URL of the Calendar API, overridable for proxies and tests.
    pub api_base: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Base URL for Google Calendar API v3.
    pub const DEFAULT_API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";

    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            calendar_id: "primary".to_string(),
            api_base: Self::DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calfuse/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// URL of the events.list endpoint for the configured calendar.
    pub fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token.trim().is_empty() {
            return Err("access_token is required".to_string());
        }
        if self.calendar_id.is_empty() {
            return Err("calendar_id must not be empty".to_string());
        }
        url::Url::parse(&self.api_base).map_err(|e| format!("invalid api_base: {}", e))?;
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &"<redacted>")
            .field("calendar_id", &self.calendar_id)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
