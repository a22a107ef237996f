//! Shared HTTP execution with the structured-call retry policy:
//! retries happen only on HTTP 429 (rate limit), with randomized
//! exponential backoff bounded to `[1s, 60s]` and at most 6 attempts. Every
//! other failure — auth, 5xx, transport, timeout — surfaces to the caller
//! immediately; it is the caller's job to decide whether to fall back.

use std::sync::Arc;
use std::time::Duration;

use evalforge_error_redaction::redact_error_message_for_logging;
use evalforge_utils::error::LlmError;
use rand::Rng;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

const MAX_ATTEMPTS: u32 = 6;
const MIN_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    pub(crate) fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Execute `request_builder`, retrying only on HTTP 429 responses.
    pub(crate) async fn execute_with_retry(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| LlmError::Transport("failed to clone request for retry".to_string()))?
                .timeout(request_timeout)
                .build()
                .map_err(|e| LlmError::Transport(format!("failed to build request: {e}")))?;

            debug!(provider = provider_name, attempt, "executing HTTP request");

            let response = self.client.execute(request).await.map_err(|e| {
                if e.is_timeout() {
                    LlmError::Transport(format!("{provider_name} request timed out"))
                } else {
                    LlmError::Transport(redact_error_message_for_logging(&format!(
                        "{provider_name} request failed: {e}"
                    )))
                }
            })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= MAX_ATTEMPTS {
                    return Err(LlmError::RetriesExhausted {
                        attempts: attempt,
                        last_error: format!("{provider_name} rate limited (HTTP 429)"),
                    });
                }
                let retry_after = parse_retry_after(&response);
                let backoff = retry_after.unwrap_or_else(|| backoff_for_attempt(attempt));
                warn!(provider = provider_name, attempt, backoff_secs = backoff.as_secs(), "rate limited, retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(LlmError::Misconfiguration(format!(
                    "{provider_name} authentication failed: {status}"
                )));
            }

            if status.is_client_error() || status.is_server_error() {
                return Err(LlmError::Transport(format!(
                    "{provider_name} returned {status}"
                )));
            }

            return Ok(response);
        }
    }
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).clamp(MIN_BACKOFF, MAX_BACKOFF))
}

/// Randomized exponential backoff: `base * 2^(attempt-1)` jittered by
/// ±25%, clamped to `[1s, 60s]`.
fn backoff_for_attempt(attempt: u32) -> Duration {
    let exp = MIN_BACKOFF.as_secs_f64() * 2f64.powi((attempt.saturating_sub(1)) as i32);
    let base = exp.min(MAX_BACKOFF.as_secs_f64());
    let jitter = rand::rng().random_range(0.75..=1.25);
    Duration::from_secs_f64((base * jitter).clamp(MIN_BACKOFF.as_secs_f64(), MAX_BACKOFF.as_secs_f64()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_stays_within_bounds() {
        for attempt in 1..=6 {
            let d = backoff_for_attempt(attempt);
            assert!(d >= MIN_BACKOFF, "attempt {attempt} backoff {d:?} below floor");
            assert!(d <= MAX_BACKOFF, "attempt {attempt} backoff {d:?} above ceiling");
        }
    }

    #[test]
    fn backoff_grows_with_attempt_on_average() {
        let early = backoff_for_attempt(1).as_secs_f64();
        let late = backoff_for_attempt(5).as_secs_f64();
        assert!(late >= early);
    }
}
