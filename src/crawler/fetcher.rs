//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests that hand the response body back as a byte stream
//! - Error classification (transport failure vs. non-2xx status)

use crate::config::{CrawlerConfig, UserAgentConfig};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Body of a fetched page, consumed incrementally
///
/// Dropping the stream releases the underlying connection.
pub type PageBody = BoxStream<'static, io::Result<Bytes>>;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is unreachable: {message}")]
    Unreachable { url: String, message: String },
}

impl FetchError {
    /// The URL that failed to fetch
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Status { url, .. } | Self::Unreachable { url, .. } => {
                url
            }
        }
    }
}

/// Trait for page sources
///
/// A page source opens a URL and returns its body as a stream. Implementations must be safe
/// to share between all workers of a run.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Opens `url` for reading
    ///
    /// # Returns
    ///
    /// * `Ok(PageBody)` - The page answered with a success status
    /// * `Err(FetchError)` - Transport failure or non-2xx status
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `crawler` - The crawler configuration (timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use asura_crow::config::{CrawlerConfig, UserAgentConfig};
/// use asura_crow::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Page source backed by plain HTTP GET requests
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher using `client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<PageBody, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e)))
            .boxed())
    }
}
