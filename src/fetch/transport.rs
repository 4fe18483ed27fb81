//! Network transport with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`Transport`]: core trait, one request in, one body out
//! - [`ReqwestTransport`]: HTTP implementation over a shared `reqwest::Client`
//! - [`RetryTransport`]: decorator that retries transient failures of any
//!   [`Transport`]
//!
//! # Retry Strategy
//!
//! Only [`FetchError::Transient`] failures are retried. The delay between
//! attempts is:
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use super::request::{Method, Request};
use crate::config::HarvestConfig;
use crate::error::FetchError;

/// Sends one request and returns the response body.
///
/// Implementations classify failures as transient or permanent; callers
/// (the retry decorator, the crawl loop) branch on that.
pub trait Transport {
    async fn send(&self, request: &Request) -> Result<String, FetchError>;
}

/// Decorator adding bounded retries with backoff and jitter.
pub struct RetryTransport<T> {
    inner: T,
    /// Total attempts, first try included.
    max_attempts: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryTransport<T>
where
    T: Transport,
{
    pub fn new(inner: T, max_attempts: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    pub fn with_max_delay(mut self, max_delay: StdDuration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn from_config(inner: T, config: &HarvestConfig) -> Self {
        Self::new(inner, config.max_attempts, config.base_delay()).with_max_delay(config.max_delay())
    }

    #[cfg(test)]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Transport for RetryTransport<T>
where
    T: Transport,
{
    #[instrument(level = "debug", skip_all, fields(url = %request.url))]
    async fn send(&self, request: &Request) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.send(request).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "send() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "send() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// HTTP transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &HarvestConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    #[instrument(level = "debug", skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &Request) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url).form(&request.form),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&request.url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(&request.url, status));
        }
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&request.url, e))?;
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Fetched"
        );
        Ok(body)
    }
}

/// 408, 429 and 5xx are worth retrying; every other non-2xx status is final.
pub fn classify_status(url: &str, status: StatusCode) -> FetchError {
    let reason = status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string();
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        FetchError::Transient {
            url: url.to_string(),
            reason: format!("HTTP {}: {}", status.as_u16(), reason),
        }
    } else {
        FetchError::Permanent {
            url: url.to_string(),
            status: Some(status.as_u16()),
            reason,
        }
    }
}

fn classify_reqwest_error(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::Permanent {
            url: url.to_string(),
            status: None,
            reason: e.to_string(),
        }
    } else if let Some(status) = e.status() {
        classify_status(url, status)
    } else {
        FetchError::Transient {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
