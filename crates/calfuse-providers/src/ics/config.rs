//! ICS / CalDAV provider configuration.

use std::time::Duration;
use url::Url;

/// How the calendar at [`IcsConfig::url`] is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IcsMode {
    /// Plain GET of a `.ics` document. The window is applied after parsing.
    #[default]
    Feed,
    /// WebDAV `REPORT` calendar-query against a CalDAV collection. The
    /// server filters by window and expands recurrences into instances.
    CalDav,
}

/// Configuration for the ICS provider.
#[derive(Clone)]
pub struct IcsConfig {
    /// Name used in logs and errors. Defaults to `"ics"`.
    pub name: String,

    /// URL of the feed or the calendar collection.
    pub url: Url,

    pub username: Option<String>,
    pub password: Option<String>,

    pub mode: IcsMode,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    pub timeout: Duration,
    pub user_agent: String,
}

impl IcsConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a new configuration with the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url.as_ref())?;
        Ok(Self {
            name: "ics".to_string(),
            url: parsed,
            username: None,
            password: None,
            mode: IcsMode::Feed,
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calfuse/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the credentials for basic authentication.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_mode(mut self, mode: IcsMode) -> Self {
        self.mode = mode;
        self
    }

    /// Disables TLS verification (for self-signed test servers only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
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

    /// Returns true if credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(format!("unsupported URL scheme: {}", self.url.scheme()));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err("username and password must be set together".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl std::fmt::Debug for IcsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcsConfig")
            .field("name", &self.name)
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("mode", &self.mode)
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}
