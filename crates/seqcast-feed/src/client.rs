//! HTTP transport used to fetch feed documents.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, PRAGMA, USER_AGENT};
use seqcast_core::{Error, HttpError, Result};
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!("Seqcast/", env!("CARGO_PKG_VERSION"));

const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.8";

/// Status and body of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    /// True for 2xx and 3xx statuses.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 400
    }
}

/// Fetches a URL and returns its status and text body.
///
/// A non-success status is a normal return value; `Err` is reserved for
/// requests that never produced a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        (**self).fetch(url).await
    }
}

/// [`Transport`] backed by `reqwest`.
///
/// Every request asks intermediaries and local caches not to serve a stored
/// copy, so a refetch after cache expiry sees the live feed.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        let parsed =
            url::Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))?;

        debug!("GET {parsed}");

        let response = self.http.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FeedTimeout(self.timeout.unwrap_or_default())
            } else {
                Error::FeedFetch(HttpError::ConnectionFailed(e.to_string()))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::ConnectionFailed(format!("Failed to read response body: {e}")))?;

        debug!("Fetched {} bytes with status {status}", body.len());

        Ok(FetchResponse { status, body })
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Transport-level request timeout. Unset by default; the resolver applies
    /// its own deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpTransport> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

        let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| Error::InvalidArgument(format!("Invalid user agent: {e}")))?,
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .tcp_keepalive(Duration::from_secs(30));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| HttpError::ConnectionFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(HttpTransport {
            http,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(FetchResponse::new(200, "").is_success());
        assert!(FetchResponse::new(204, "").is_success());
        assert!(FetchResponse::new(304, "").is_success());
        assert!(!FetchResponse::new(199, "").is_success());
        assert!(!FetchResponse::new(404, "").is_success());
        assert!(!FetchResponse::new(500, "").is_success());
    }

    #[test]
    fn test_builder_rejects_bad_user_agent() {
        assert!(HttpTransport::builder().user_agent("bad\nagent").build().is_err());
        assert!(HttpTransport::builder()
            .user_agent("Test/1.0")
            .timeout(Duration::from_secs(5))
            .build()
            .is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_request() {
        let transport = HttpTransport::new().unwrap();
        let err = transport.fetch("./relative/feed.xml").await.unwrap_err();
        assert!(matches!(err, Error::FeedFetch(HttpError::InvalidUrl(_))));
    }
}
