//! Error types for calendar provider operations.
//!
//! Every adapter failure is a [`ProviderError`]. Callers that only care
//! whether the remote call failed or the payload was unusable can look at
//! [`ProviderError::kind`], which folds the detailed codes into the two
//! categories the aggregation engine reports.

use std::fmt;
use thiserror::Error;

/// The detailed category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials were rejected (401).
    AuthenticationFailed,
    /// Credentials lack permission (403).
    AuthorizationFailed,
    /// Connection failed, DNS resolution, TLS, etc.
    NetworkError,
    /// The remote call exceeded the adapter's timeout.
    Timeout,
    /// Too many requests (429).
    RateLimited,
    /// Server returned a 5xx status.
    ServerError,
    /// The payload could not be parsed.
    InvalidResponse,
    /// Calendar or endpoint not found (404).
    NotFound,
    /// Any other non-success status.
    BadRequest,
    /// Missing or invalid adapter configuration.
    ConfigurationError,
    /// Unexpected state inside the adapter.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the failure is transient.
    ///
    /// This is informational: the engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }

    /// Folds the code into a fetch or parse failure.
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::InvalidResponse => ProviderErrorKind::Parse,
            _ => ProviderErrorKind::Fetch,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse classification of provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// The remote call errored, timed out or returned a non-2xx status.
    Fetch,
    /// The remote answered but the payload was malformed.
    Parse,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch error"),
            Self::Parse => f.write_str("parse error"),
        }
    }
}

/// An error that occurred while fetching from a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Name of the provider that failed (e.g. "google", "ics").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates a parse error for a payload that could not be understood.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn kind(&self) -> ProviderErrorKind {
        self.code.kind()
    }

    /// Returns true if the provider answered with an unusable payload.
    pub fn is_parse_error(&self) -> bool {
        self.kind() == ProviderErrorKind::Parse
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_fold_into_kinds() {
        assert_eq!(
            ProviderErrorCode::InvalidResponse.kind(),
            ProviderErrorKind::Parse
        );
        assert_eq!(ProviderErrorCode::Timeout.kind(), ProviderErrorKind::Fetch);
        assert_eq!(ProviderErrorCode::NotFound.kind(), ProviderErrorKind::Fetch);
        assert_eq!(
            ProviderErrorCode::AuthenticationFailed.kind(),
            ProviderErrorKind::Fetch
        );
    }

    #[test]
    fn retryable_codes() {
        assert!(ProviderErrorCode::Timeout.is_retryable());
        assert!(ProviderErrorCode::ServerError.is_retryable());
        assert!(!ProviderErrorCode::InvalidResponse.is_retryable());
        assert!(!ProviderErrorCode::AuthorizationFailed.is_retryable());
    }

    #[test]
    fn parse_error_detection() {
        let err = ProviderError::invalid_response("unexpected token at line 1");
        assert!(err.is_parse_error());
        assert!(!ProviderError::timeout("after 30s").is_parse_error());
    }

    #[test]
    fn display_includes_provider_and_code() {
        let err = ProviderError::rate_limited("slow down").with_provider("outlook");
        assert_eq!(err.to_string(), "[outlook] rate_limited: slow down");

        let bare = ProviderError::not_found("no such calendar");
        assert_eq!(bare.to_string(), "not_found: no such calendar");
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ProviderError::network("request failed").with_source(io_err);
        assert!(err.source().is_some());
    }
}
