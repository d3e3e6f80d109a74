//! Bounded-retry HTTP calls shared by the typed-API providers.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Delay unit; attempt `n` (0-based) waits `(n + 1) * base_delay` after failing.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Back-off after the failed 0-based `attempt`; grows linearly.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryableFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryableFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Build a fetcher with the default client settings used by every provider.
    pub fn with_policy(policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jobscout/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, policy))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn fetch(&self, request: RequestBuilder) -> Result<Response> {
        self.fetch_with_retries(request, self.policy.max_retries)
            .await
    }

    /// Send `request`, retrying on transport errors and non-success statuses.
    ///
    /// Makes at most `max_retries` attempts in total. POST bodies are replayed
    /// as-is, so callers must only pass requests that are safe to repeat.
    pub async fn fetch_with_retries(
        &self,
        request: RequestBuilder,
        max_retries: u32,
    ) -> Result<Response> {
        let attempts = max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            let Some(req) = request.try_clone() else {
                return Err(AppError::Internal(
                    "request body cannot be replayed for retry".to_string(),
                ));
            };

            match req.send().await.and_then(Response::error_for_status) {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    tracing::warn!("Fetch attempt {}/{attempts} failed: {e}", attempt + 1);
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                tokio::time::sleep(self.policy.delay_after(attempt)).await;
            }
        }

        match last_error {
            Some(e) => Err(AppError::Http(e)),
            None => Err(AppError::Internal("fetch made no attempts".to_string())),
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = self.fetch(request).await?;
        Ok(resp.json::<T>().await?)
    }
}
