//! Document sink trait and the HTTP indexing service client
//!
//! A document is delivered as a JSON `POST` of `{"url": ..., "content": ...}` to the indexing
//! endpoint. Any non-2xx answer is a sink error for that URL.

use crate::ConfigError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Indexing endpoint used when none is configured
pub const DEFAULT_INDEX_ENDPOINT: &str = "http://localhost:7001/index";

/// Errors that can occur while delivering a document
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid document for {url}: {reason}")]
    InvalidDocument { url: String, reason: String },

    #[error("Failed to reach indexer for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Indexer rejected {url} with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Normalized text of one crawled page
///
/// Created once per successfully fetched and parsed URL; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    url: String,
    content: String,
}

impl Document {
    /// Creates a new document
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
        }
    }

    /// The page URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The normalized page text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks that the document can be handed to the indexing service
    ///
    /// The URL must parse as an absolute URL with a host. Empty content is allowed; a page
    /// may legitimately contain no visible text.
    pub fn validate(&self) -> Result<(), SinkError> {
        let parsed = Url::parse(&self.url).map_err(|e| SinkError::InvalidDocument {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        if parsed.host_str().is_none() {
            return Err(SinkError::InvalidDocument {
                url: self.url.clone(),
                reason: "URL has no host".to_string(),
            });
        }

        Ok(())
    }
}

/// Trait for document sinks
///
/// Implementations must be safe to share between all workers of a run.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Delivers one document downstream
    ///
    /// # Arguments
    ///
    /// * `document` - The finished document
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The sink accepted the document
    /// * `Err(SinkError)` - The document was rejected or could not be delivered
    async fn submit(&self, document: &Document) -> Result<(), SinkError>;
}

/// Sink that posts documents to the indexing HTTP service
#[derive(Debug, Clone)]
pub struct HttpIndexSink {
    client: Client,
    endpoint: Url,
}

impl HttpIndexSink {
    /// Creates a sink posting to `endpoint` with the given client
    ///
    /// # Returns
    ///
    /// * `Ok(HttpIndexSink)` - Sink ready to use
    /// * `Err(ConfigError)` - The endpoint is not a valid URL
    pub fn new(client: Client, endpoint: &str) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid indexer endpoint '{}': {}", endpoint, e))
        })?;
        Ok(Self { client, endpoint })
    }

    /// The endpoint documents are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl DocumentSink for HttpIndexSink {
    async fn submit(&self, document: &Document) -> Result<(), SinkError> {
        document.validate()?;

        tracing::debug!("Sending {} to indexer at {}", document.url(), self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(document)
            .send()
            .await
            .map_err(|source| SinkError::Request {
                url: document.url().to_string(),
                source,
            })?;

        let status = response.status();

        // Drain the body so the connection goes back to the pool
        if let Err(e) = response.bytes().await {
            tracing::debug!("Failed to read indexer response body: {}", e);
        }

        if !status.is_success() {
            return Err(SinkError::Status {
                url: document.url().to_string(),
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}
