//! The transport capability: send a prepared request, get back a response or
//! a transport-level error.
//!
//! Everything below the request/response pipeline (connection pooling, TLS,
//! keep-alive, deadlines) lives behind the [`Transport`] trait. The crate
//! ships [`ReqwestTransport`] as the default implementation; tests and
//! embedders can substitute their own.

use async_trait::async_trait;
use http::header::CONTENT_ENCODING;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::{Error, Result};

/// A fully prepared transport-level request.
#[derive(Debug)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The absolute request URL, query string included.
    pub url: Url,
    /// The request headers.
    pub headers: HeaderMap,
    /// The marshaled request body. Empty for body-less requests.
    pub body: Vec<u8>,
}

/// A transport-level response: status, headers, and the raw (possibly
/// compressed) body bytes.
#[derive(Debug)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body, exactly as received on the wire.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// The `Content-Encoding` header value, or `""` when absent or unreadable.
    pub fn content_encoding(&self) -> &str {
        self.headers
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
    }
}

/// A transport-level failure: the request never produced an HTTP status.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<crate::error::BoxError>,
}

impl TransportError {
    /// Creates a transport error from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<crate::error::BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// The capability consumed by the request builder: one operation, send a
/// prepared request and return either a response or a transport error.
///
/// Implementations must be shareable across concurrent calls; the builder
/// holds them behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the response, or a transport-level
    /// error if no HTTP status could be obtained.
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError>;
}

/// The default [`Transport`] backed by a pooled [`reqwest::Client`].
///
/// Automatic response decompression is left off so that the builder's
/// compression registry is the single decoder. Request deadlines belong
/// here: configure a timeout on the underlying client and it will surface
/// as a transport error like any other network failure.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport over a freshly built client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be constructed.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> std::result::Result<TransportResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if !request.body.is_empty() {
            req = req.body(request.body);
        }

        let response = req.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
