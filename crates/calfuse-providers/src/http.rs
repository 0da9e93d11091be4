//! HTTP plumbing shared by the adapters.
//!
//! Maps reqwest transport failures and non-success statuses onto
//! [`ProviderError`] codes so every adapter reports the same way.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Longest response body excerpt kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Builds a reqwest client with the adapter's timeout.
pub(crate) fn build_client(
    timeout: Duration,
    user_agent: Option<&str>,
    verify_tls: bool,
) -> ProviderResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify_tls);

    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }

    builder.build().map_err(|e| {
        ProviderError::internal(format!("failed to create HTTP client: {}", e)).with_source(e)
    })
}

/// Converts a transport-level failure into a provider error.
pub(crate) fn transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout("request timed out").with_source(err)
    } else if err.is_connect() {
        ProviderError::network(format!("connection failed: {}", err)).with_source(err)
    } else {
        ProviderError::network(format!("request failed: {}", err)).with_source(err)
    }
}

/// Maps a non-success status to a provider error.
pub(crate) fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication("credentials expired or invalid")
        }
        StatusCode::FORBIDDEN => ProviderError::authorization("access denied to calendar"),
        StatusCode::NOT_FOUND => ProviderError::not_found("calendar not found"),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        s if s.is_server_error() => {
            ProviderError::server(format!("server error ({}): {}", s, excerpt(body)))
        }
        s => ProviderError::bad_request(format!("unexpected status ({}): {}", s, excerpt(body))),
    }
}

/// Passes successful responses through and turns the rest into errors.
pub(crate) async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();

    debug!(%status, "provider returned non-success status");
    Err(status_error(status, retry_after, &body))
}

/// Reads the full response body as text.
pub(crate) async fn read_body(response: Response) -> ProviderResult<String> {
    response.text().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::timeout("timed out reading response body").with_source(e)
        } else {
            ProviderError::network(format!("failed to read response: {}", e)).with_source(e)
        }
    })
}

/// Decodes a JSON body, mapping failures to a parse error.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(body: &str) -> ProviderResult<T> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e)).with_source(e)
    })
}

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    if body.len() <= BODY_EXCERPT_LEN {
        return body;
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
