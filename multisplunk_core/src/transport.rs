//! Shared HTTP transport: client construction, per-call timeout and the
//! status-based retry policy applied to every outbound call.

use crate::error::SearchError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay; doubled on each retry.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Statuses that trigger a retry.
pub const DEFAULT_RETRY_STATUSES: &[u16] = &[500, 502, 503, 504];

/// Bounded exponential-backoff retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): `backoff * 2^retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }

    pub fn should_retry_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }
}

/// Whether a request may be sent again once it might have reached the
/// service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Reads: retried on retry-eligible statuses, timeouts and connection
    /// failures.
    Safe,
    /// Job submission: a resend would start a second search job, so only
    /// connection failures are retried.
    ConnectOnly,
}

impl Replay {
    pub fn retries_status(self) -> bool {
        matches!(self, Replay::Safe)
    }

    pub fn retries_error(self, err: &SearchError) -> bool {
        match self {
            Replay::Safe => err.is_retryable(),
            Replay::ConnectOnly => err.is_connect_failure(),
        }
    }
}

/// HTTP clients shared by every unit of one dispatcher.
///
/// Certificate verification is a per-endpoint setting, so two clients are
/// kept: one verifying and one accepting any certificate.
#[derive(Debug, Clone)]
pub struct Transport {
    verifying: Client,
    insecure: Client,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(call_timeout: Duration, retry: RetryPolicy) -> Result<Self, SearchError> {
        let verifying = Self::build_client(call_timeout, true)?;
        let insecure = Self::build_client(call_timeout, false)?;
        Ok(Self {
            verifying,
            insecure,
            retry,
        })
    }

    fn build_client(call_timeout: Duration, verify: bool) -> Result<Client, SearchError> {
        Client::builder()
            .user_agent(concat!("multisplunk/", env!("CARGO_PKG_VERSION")))
            .timeout(call_timeout)
            .danger_accept_invalid_certs(!verify)
            .build()
            .map_err(SearchError::HttpRequest)
    }

    pub fn client(&self, tls_verify: bool) -> &Client {
        if tls_verify {
            &self.verifying
        } else {
            &self.insecure
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a request, retrying what `replay` allows until the policy is
    /// exhausted.
    ///
    /// Any other non-2xx status fails immediately.
    pub async fn send_with_backoff<F>(
        &self,
        tls_verify: bool,
        replay: Replay,
        build: F,
    ) -> Result<Response, SearchError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = self.client(tls_verify);
        let mut retry = 0u32;
        loop {
            let last_attempt = retry >= self.retry.max_retries;
            match build(client).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    let url = resp.url().to_string();
                    if !replay.retries_status()
                        || !self.retry.should_retry_status(status)
                        || last_attempt
                    {
                        return Err(SearchError::HttpStatus {
                            status: status.as_u16(),
                            url,
                        });
                    }
                    warn!(status = status.as_u16(), %url, retry, "retrying after server error");
                }
                Err(e) => {
                    let err = SearchError::HttpRequest(e);
                    if !replay.retries_error(&err) || last_attempt {
                        return Err(err);
                    }
                    warn!(error = %err, retry, "retrying after transport error");
                }
            }
            let delay = self.retry.delay_for(retry);
            debug!(delay_ms = delay.as_millis() as u64, "backing off");
            sleep(delay).await;
            retry += 1;
        }
    }

    /// [`send_with_backoff`](Self::send_with_backoff) and decode the body as JSON.
    pub async fn json_with_backoff<F>(
        &self,
        tls_verify: bool,
        replay: Replay,
        build: F,
    ) -> Result<Value, SearchError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let resp = self.send_with_backoff(tls_verify, replay, build).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert!(policy.should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!policy.should_retry_status(StatusCode::NOT_FOUND));
        assert!(!policy.should_retry_status(StatusCode::TOO_MANY_REQUESTS));
    }

    #[test]
    fn test_no_retry_policy() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.retry_statuses, DEFAULT_RETRY_STATUSES.to_vec());
    }

    #[test]
    fn test_replay_rules() {
        let timeout = SearchError::Timeout("300s".into());
        assert!(Replay::Safe.retries_status());
        assert!(Replay::Safe.retries_error(&timeout));
        assert!(!Replay::ConnectOnly.retries_status());
        assert!(!Replay::ConnectOnly.retries_error(&timeout));
        assert!(!Replay::ConnectOnly.retries_error(&SearchError::Protocol("x".into())));
    }

    #[test]
    fn test_transport_builds() {
        let transport = Transport::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
        assert_eq!(transport.retry_policy().max_retries, 0);
    }
}
