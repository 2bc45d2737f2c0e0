// src/services/fetcher.rs

//! HTTP fetcher with timeout, bounded retry and backoff.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Classification of a failed attempt.
enum Failure {
    /// Timeout, transport error or 5xx; eligible for retry
    Transient(AppError),

    /// 4xx or malformed URL; never retried
    Permanent(AppError),
}

/// HTTP fetcher shared by all pipeline stages.
///
/// Every request is bounded by the configured timeout so a slow endpoint
/// cannot hang the batch. Transient failures are retried with linear
/// backoff; 4xx responses surface immediately as permanent failures.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetch a URL as raw bytes.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.try_get(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(Failure::Permanent(error)) => return Err(error),
                Err(Failure::Transient(error)) => {
                    if attempt > self.config.retries {
                        return Err(error);
                    }
                    let delay = Duration::from_millis(self.config.backoff_ms * u64::from(attempt));
                    log::debug!(
                        "Transient failure for {} (attempt {}): {}. Retrying in {:?}",
                        url,
                        attempt,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Fetch a URL and decode it as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn try_get(&self, url: &str) -> std::result::Result<Vec<u8>, Failure> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            // reqwest send errors are transport-level (timeout, connect,
            // TLS); all are worth one more attempt
            Err(error) => return Err(Failure::Transient(AppError::Http(error))),
        };

        let status = response.status();
        if status.is_success() {
            let bytes = response
                .bytes()
                .await
                .map_err(|e| Failure::Transient(AppError::Http(e)))?;
            return Ok(bytes.to_vec());
        }

        let error = AppError::fetch(url, format!("status {}", status));
        if is_retryable(status) {
            Err(Failure::Transient(error))
        } else {
            Err(Failure::Permanent(error))
        }
    }
}

/// Whether a non-success status is worth retrying.
fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
