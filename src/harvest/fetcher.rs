//! HTTP fetcher for listing pages
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with a proper user agent string
//! - Fetching and decoding one listing page
//! - Bounded retry with a fixed backoff between attempts
//!
//! A page whose attempts are all exhausted is reported as `FetchResult::Failed`
//! rather than an error; what that means for the crawl is the controller's
//! decision.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::record::{ListingPage, RawEntry};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Result of fetching one page
#[derive(Debug)]
pub enum FetchResult {
    /// The page was fetched and decoded
    Page {
        /// Entries on the page, possibly none
        entries: Vec<RawEntry>,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// Every attempt failed
    Failed {
        attempts: u32,
        /// Description of the last failure
        last_error: String,
    },
}

/// Why a single attempt failed
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("could not decode listing: {0}")]
    Decode(reqwest::Error),
}

/// Attempt bound and backoff for page fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Formats the user agent string: `Name/Version (+ContactURL; ContactEmail)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use post_harvest::config::UserAgentConfig;
/// use post_harvest::harvest::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "PostHarvest".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one listing page, retrying failed attempts
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | 2xx with decodable body | Return entries |
/// | Non-2xx status | Wait `backoff`, retry |
/// | Transport error / timeout | Wait `backoff`, retry |
/// | Undecodable body | Wait `backoff`, retry |
/// | Attempts exhausted | `FetchResult::Failed` |
///
/// No backoff is slept after the final attempt.
pub async fn fetch_page(client: &Client, url: &str, retry: &RetryPolicy) -> FetchResult {
    let mut last_error = String::from("no attempts made");

    for attempt in 1..=retry.max_attempts {
        match fetch_once(client, url).await {
            Ok(entries) => {
                return FetchResult::Page {
                    entries,
                    attempts: attempt,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Attempt {} of {} failed for {}: {}",
                    attempt,
                    retry.max_attempts,
                    url,
                    e
                );
                last_error = e.to_string();

                if attempt < retry.max_attempts {
                    tokio::time::sleep(retry.backoff).await;
                }
            }
        }
    }

    FetchResult::Failed {
        attempts: retry.max_attempts,
        last_error,
    }
}

/// Performs a single GET and decodes the listing body
async fn fetch_once(client: &Client, url: &str) -> Result<Vec<RawEntry>, AttemptError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(AttemptError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(AttemptError::Status(status));
    }

    let page: ListingPage = response.json().await.map_err(AttemptError::Decode)?;
    Ok(page.into_entries())
}
