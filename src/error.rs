//! Error types for the request/response pipeline and the call layer.
//!
//! Every failure is surfaced as a value: the builder reports pipeline errors
//! through [`CallResponse::error`](crate::CallResponse), and the call layer
//! routes retry decisions through [`CallError`]. Non-2xx statuses are *not*
//! errors at this layer: they are represented purely by the status code, and
//! interpreting them is the response handler's job.

/// A boxed error that can cross task boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for the request/response pipeline.
///
/// # Examples
///
/// ```no_run
/// use restline::{get, Error, ReqwestTransport};
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), restline::Error> {
/// let transport = Arc::new(ReqwestTransport::new()?);
/// let mut entity = HashMap::<String, String>::new();
///
/// let response = get(transport, "https://api.example.com/users/1")
///     .execute(&mut entity)
///     .await;
///
/// match response.error {
///     None => println!("status {}", response.status_code),
///     Some(Error::Transport(e)) => eprintln!("network failure: {}", e),
///     Some(Error::Unmarshal { detail, .. }) => eprintln!("bad body: {}", detail),
///     Some(e) => eprintln!("other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport call itself failed (connection refused, DNS failure,
    /// timeout). No status code was obtained; `status_code` is zero and must
    /// not be trusted.
    #[error("transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// The request body could not be serialized in the chosen media type.
    /// Surfaced before any transport call is made.
    #[error("failed to marshal request body as {media_type}: {detail}")]
    Marshal {
        /// The media type whose marshal function rejected the body.
        media_type: String,
        /// The underlying serializer message.
        detail: String,
    },

    /// No codec is registered for the configured media type.
    #[error("no codec registered for media type {0:?}")]
    UnsupportedMediaType(String),

    /// The response advertised a `Content-Encoding` with no registered
    /// decompression function.
    #[error("unsupported content encoding {0:?}")]
    UnsupportedEncoding(String),

    /// The response body could not be inflated with the advertised encoding.
    /// The response's true status code is preserved on the surrounding
    /// [`CallResponse`](crate::CallResponse).
    #[error("failed to inflate {encoding} response body: {detail}")]
    Decompress {
        /// The `Content-Encoding` token whose inflate step failed.
        encoding: String,
        /// The underlying decoder message.
        detail: String,
    },

    /// A success-range response body could not be decoded into the target
    /// entity. The true status code is preserved on the surrounding
    /// [`CallResponse`](crate::CallResponse).
    #[error("failed to unmarshal {media_type} response body: {detail}")]
    Unmarshal {
        /// The media type whose unmarshal function rejected the body.
        media_type: String,
        /// The underlying deserializer message.
        detail: String,
    },

    /// The request path could not be parsed as a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid configuration, such as a malformed header name or value.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Builds an [`Error::Unmarshal`] from an arbitrary decoder error.
    ///
    /// Intended for custom unmarshal functions registered through
    /// [`RequestBuilder::with_custom_json_unmarshal`](crate::RequestBuilder::with_custom_json_unmarshal)
    /// and its XML counterpart.
    pub fn unmarshal(media_type: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Error::Unmarshal {
            media_type: media_type.into(),
            detail: detail.to_string(),
        }
    }
}

/// Classification of a finished call, produced by a response handler.
///
/// The handler is the sole authority on retry eligibility: the retry loop in
/// [`ResilientCall`](crate::ResilientCall) never inspects status codes or
/// error types itself. A [`CallError::Fatal`] aborts immediately even when
/// retry budget remains; a [`CallError::Retryable`] consumes budget until it
/// is exhausted.
///
/// # Examples
///
/// ```
/// use restline::{CallError, CallResponse};
///
/// fn handle(response: &CallResponse) -> Result<(), CallError> {
///     match response.status_code {
///         200..=299 => Ok(()),
///         503 => Err(CallError::retryable("service unavailable")),
///         status => Err(CallError::fatal(format!("unexpected status {status}"))),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The call failed but may succeed on a later attempt.
    #[error("{0}")]
    Retryable(BoxError),

    /// The call failed and re-attempting it is pointless.
    #[error("{0}")]
    Fatal(BoxError),
}

impl CallError {
    /// Wraps an error as retryable.
    pub fn retryable(err: impl Into<BoxError>) -> Self {
        CallError::Retryable(err.into())
    }

    /// Wraps an error as non-retryable.
    pub fn fatal(err: impl Into<BoxError>) -> Self {
        CallError::Fatal(err.into())
    }

    /// Returns `true` if the call may be re-attempted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Retryable(_))
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
