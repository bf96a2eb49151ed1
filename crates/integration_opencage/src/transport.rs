//! HTTP transport for OpenCage requests
//!
//! [`HttpTransport`] performs exactly one request/response exchange and hands
//! back the complete response once the body has been read to the end. HTTP
//! error statuses are not errors at this layer; only failures to exchange a
//! response at all are.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Version};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// URL scheme for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plain HTTP, only used against local test servers
    Http,
    /// HTTP over TLS
    Https,
}

impl Scheme {
    /// Scheme name as used in URLs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// URL scheme
    pub scheme: Scheme,
    /// Host name without scheme or port
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Path without the query string
    pub path: String,
    /// Query string without the leading `?`, sent as-is apart from
    /// characters that cannot appear in a query (`#`, spaces, quotes)
    pub query: Option<String>,
}

impl RequestOptions {
    /// Create a GET request against `host:port`
    #[must_use]
    pub fn get(scheme: Scheme, host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            scheme,
            host: host.into(),
            port,
            path: path.into(),
            query: None,
        }
    }

    /// Attach a query string
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Assemble the absolute URL
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if host or path do not form a valid URL.
    pub fn url(&self) -> Result<Url, TransportError> {
        let raw = format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path);
        let mut url =
            Url::parse(&raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))?;
        url.set_query(self.query.as_deref());
        Ok(url)
    }
}

/// A fully received HTTP response
#[derive(Debug, Clone)]
pub struct RawHttpResponse {
    /// Protocol version, e.g. `HTTP/1.1`
    pub http_version: String,
    /// HTTP status code
    pub status: u16,
    /// Response headers (case-insensitive lookup)
    pub headers: HeaderMap,
    /// Complete response body
    pub body: String,
    /// Trailing headers, empty unless the transport surfaces them
    pub trailers: HeaderMap,
}

impl RawHttpResponse {
    /// Create a response with the given status and body and no headers
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            http_version: "HTTP/1.1".to_string(),
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            trailers: HeaderMap::new(),
        }
    }

    /// Returns the value of a header if present and valid UTF-8
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns true for 2xx statuses
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 4xx statuses
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }
}

/// Errors raised when no response could be obtained
#[derive(Debug, Error)]
pub enum TransportError {
    /// Host, port and path did not form a valid URL
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be created
    #[error("HTTP client initialization failed: {0}")]
    ClientInit(String),

    /// DNS, TCP or TLS connection failure
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request was sent but the exchange failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Reading the response body failed
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl TransportError {
    /// Returns true if a later attempt could succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::RequestFailed(_) | Self::Body(_) | Self::Timeout { .. }
        )
    }
}

/// One-shot HTTP exchange
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform the request and return the complete response
    async fn perform(&self, options: RequestOptions) -> Result<RawHttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    /// Create a transport with the given timeout and user agent
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn map_error(&self, error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else if error.is_connect() {
            TransportError::ConnectionFailed(error.to_string())
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(error.to_string())
        } else {
            TransportError::RequestFailed(error.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(&self, options: RequestOptions) -> Result<RawHttpResponse, TransportError> {
        let url = options.url()?;

        let mut response = self
            .client
            .request(options.method, url)
            .send()
            .await
            .map_err(|e| {
                let error = self.map_error(&e);
                warn!(error = %error, "Problem with request");
                error
            })?;

        let status = response.status().as_u16();
        let http_version = version_str(response.version()).to_string();
        let headers = response.headers().clone();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            let error = self.map_error(&e);
            warn!(error = %error, "Problem reading response body");
            error
        })? {
            body.extend_from_slice(&chunk);
        }

        debug!(status, bytes = body.len(), "Received response");

        Ok(RawHttpResponse {
            http_version,
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
            trailers: HeaderMap::new(),
        })
    }
}

fn version_str(version: Version) -> &'static str {
    if version == Version::HTTP_09 {
        "HTTP/0.9"
    } else if version == Version::HTTP_10 {
        "HTTP/1.0"
    } else if version == Version::HTTP_2 {
        "HTTP/2.0"
    } else if version == Version::HTTP_3 {
        "HTTP/3.0"
    } else {
        "HTTP/1.1"
    }
}
