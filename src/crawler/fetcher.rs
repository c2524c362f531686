//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests against the pad download endpoint
//! - Error classification into a typed fetch outcome

use crate::config::FetchConfig;
use crate::url::DocumentId;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The pad's markdown source
    Found {
        content: String,
    },

    /// Server answered with a non-success status
    Missing {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure)
    Unreachable {
        /// Error description
        error: String,
    },
}

/// Source of raw pad contents
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Downloads the markdown source of one pad
    async fn fetch(&self, id: &DocumentId) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use medusa::config::FetchConfig;
/// use medusa::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_secs(config.timeout_secs);

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Outcomes
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | Found |
/// | Any other status | Missing |
/// | Timeout | Unreachable |
/// | Connection refused | Unreachable |
/// | Body not readable | Unreachable |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();

            if !status.is_success() {
                return FetchResult::Missing {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(content) => FetchResult::Found { content },
                Err(e) => FetchResult::Unreachable {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            // Classify error
            if e.is_timeout() {
                FetchResult::Unreachable {
                    error: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchResult::Unreachable {
                    error: "Connection refused".to_string(),
                }
            } else {
                FetchResult::Unreachable {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Fetches pads from a HedgeDoc server through its download endpoint
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    root: String,
}

impl HttpFetcher {
    pub fn new(client: Client, root: &str) -> Self {
        Self {
            client,
            root: root.trim_end_matches('/').to_string(),
        }
    }

    /// `{root}/{identity}/download`
    pub fn download_url(&self, id: &DocumentId) -> String {
        format!("{}/{}/download", self.root, id)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &DocumentId) -> FetchResult {
        let url = self.download_url(id);
        tracing::debug!("GET {}", url);
        fetch_url(&self.client, &url).await
    }
}
