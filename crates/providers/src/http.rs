//! Shared HTTP plumbing for the vendor adapters.

use std::time::Duration;
use strata_core::ProviderError;
use tracing::warn;

/// Retry hint used when a 429 carries no `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Build the shared client. Timeouts are set per request.
pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("strata/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Classify a transport-level failure.
pub(crate) fn send_error(provider: &str, e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(format!(
            "{provider}: no response within {}ms",
            timeout.as_millis()
        ))
    } else {
        ProviderError::Transport(format!("{provider}: {e}"))
    }
}

/// Turn a response into its body text, mapping HTTP errors.
pub(crate) async fn read_body(
    provider: &str,
    response: reqwest::Response,
    timeout: Duration,
) -> Result<String, ProviderError> {
    let status = response.status();

    if status.as_u16() == 429 {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(ProviderError::Transport(format!(
            "{provider}: invalid API key or insufficient permissions"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| send_error(provider, e, timeout))?;

    if !status.is_success() {
        warn!(provider, status = status.as_u16(), body = %body, "Provider returned error");
        return Err(ProviderError::Transport(format!(
            "{provider}: HTTP {}",
            status.as_u16()
        )));
    }

    Ok(body)
}
