//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for a crawl, including:
//! - Building the HTTP client with the configured identity and credentials
//! - GET requests for page bodies
//! - Linear-backoff retry for non-success statuses and network errors

use crate::config::{ClientConfig, CrawlConfig};
use crate::{ConfigError, DocuError, FetchError};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by every request of a crawl
///
/// The client keeps a cookie store, so session cookies set by the site are
/// sent back on later requests, and sends the configured `Cookie` header (if
/// any) on every request.
///
/// # Example
///
/// ```no_run
/// use docuprint::config::ClientConfig;
/// use docuprint::crawler::build_http_client;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, DocuError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = &config.cookie {
        let value = HeaderValue::from_str(cookie).map_err(|e| {
            ConfigError::Validation(format!("cookie is not a valid header value: {}", e))
        })?;
        headers.insert(COOKIE, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Why a single attempt failed
#[derive(Debug)]
enum AttemptError {
    Status(StatusCode),
    Network(reqwest::Error),
}

/// Retrieves page bodies, retrying transient failures
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx | Return the body |
/// | Any other status | Retry |
/// | Network error (connect, timeout, body read) | Retry |
///
/// Attempt `n` that fails waits `n × retry-backoff-ms` before the next one.
/// Once every attempt is spent, the last failure is returned.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: CrawlConfig,
}

impl Fetcher {
    pub fn new(client: Client, config: &CrawlConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Fetches `url` and returns the response body as text
    pub async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let attempts = self.config.retry_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.try_fetch(url).await {
                Ok(body) => {
                    if attempt > 1 {
                        tracing::debug!("Fetched {} on attempt {}", url, attempt);
                    }
                    return Ok(body);
                }
                Err(err) if attempt < attempts => {
                    let backoff = self.config.retry_backoff(attempt);
                    tracing::debug!(
                        "Attempt {}/{} for {} failed ({:?}), retrying in {:?}",
                        attempt,
                        attempts,
                        url,
                        err,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(AttemptError::Status(status)) => {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                        attempts: attempt,
                    });
                }
                Err(AttemptError::Network(source)) => {
                    return Err(FetchError::Network {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    async fn try_fetch(&self, url: &Url) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(AttemptError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        response.text().await.map_err(AttemptError::Network)
    }
}
