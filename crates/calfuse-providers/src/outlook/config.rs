//! Outlook provider configuration.

use std::time::Duration;

/// Configuration for the Outlook provider.
#[derive(Clone)]
pub struct OutlookConfig {
    /// OAuth bearer token, supplied by the caller.
    pub access_token: String,
    /// Base URL of the REST API.
    pub api_base: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl OutlookConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_API_BASE: &'static str = "https://outlook.office.com/api/v2.0";

    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            api_base: Self::DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calfuse/{}", env!("CARGO_PKG_VERSION")),
        }
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

    /// URL of the calendar view endpoint.
    pub fn calendar_view_url(&self) -> String {
        format!("{}/me/calendarview", self.api_base.trim_end_matches('/'))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.access_token.trim().is_empty() {
            return Err("access_token is required".to_string());
        }
        url::Url::parse(&self.api_base).map_err(|e| format!("invalid api_base: {}", e))?;
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for OutlookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlookConfig")
            .field("access_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
