//! The fluent request builder and its execute pipeline.
//!
//! A builder is created by one of the verb constructors ([`get`], [`post`],
//! [`put`], [`delete`]), mutated through chaining, and consumed logically by
//! one call to [`RequestBuilder::execute`]. Executing the same builder again
//! re-marshals and re-sends the request (the retry loop relies on this), but
//! mutating a builder after its first execution is unsupported.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use http::header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{CodecTable, APPLICATION_JSON, APPLICATION_XML};
use crate::compression::CompressionRegistry;
use crate::request::RequestSpec;
use crate::transport::Transport;
use crate::{CallResponse, Error, Result};

/// Starts a GET request against `path` (an absolute URL).
pub fn get<T>(transport: Arc<dyn Transport>, path: impl Into<String>) -> RequestBuilder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    RequestBuilder::new(Method::GET, transport, path)
}

/// Starts a POST request against `path` (an absolute URL).
pub fn post<T>(transport: Arc<dyn Transport>, path: impl Into<String>) -> RequestBuilder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    RequestBuilder::new(Method::POST, transport, path)
}

/// Starts a PUT request against `path` (an absolute URL).
pub fn put<T>(transport: Arc<dyn Transport>, path: impl Into<String>) -> RequestBuilder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    RequestBuilder::new(Method::PUT, transport, path)
}

/// Starts a DELETE request against `path` (an absolute URL).
pub fn delete<T>(transport: Arc<dyn Transport>, path: impl Into<String>) -> RequestBuilder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    RequestBuilder::new(Method::DELETE, transport, path)
}

/// A fluent builder for one REST call, typed by the response entity.
///
/// Fresh builders default to the JSON media type and own their codec table,
/// so unmarshal overrides never leak across builders.
///
/// # Examples
///
/// ```no_run
/// use restline::{get, ReqwestTransport};
/// use serde::Deserialize;
/// use std::sync::Arc;
///
/// #[derive(Deserialize, Default)]
/// struct User {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), restline::Error> {
/// let transport = Arc::new(ReqwestTransport::new()?);
///
/// let mut user = User::default();
/// let response = get(transport, "https://api.example.com/users/1")
///     .with_query_param("expand", "profile")
///     .accept_gzip_encoding()
///     .execute(&mut user)
///     .await;
///
/// if response.is_success() {
///     println!("hello, {}", user.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RequestBuilder<T> {
    transport: Arc<dyn Transport>,
    spec: RequestSpec,
    codecs: CodecTable<T>,
    compression: CompressionRegistry,
    log_request_body: bool,
    log_response_body: bool,
}

impl<T> RequestBuilder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn new(method: Method, transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            spec: RequestSpec::new(method, path),
            codecs: CodecTable::builtin(),
            compression: CompressionRegistry::builtin(),
            log_request_body: false,
            log_response_body: false,
        }
    }
}

impl<T> RequestBuilder<T> {
    /// Sets a query parameter. A repeated key overwrites the earlier value.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.set_query_param(key, value);
        self
    }

    /// Sets a header. Last write wins for a repeated name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid header name or value.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header value: {}", e)))?;
        self.spec.insert_header(name, value);
        Ok(self)
    }

    /// Sets the request body. It is marshaled at execute time with the media
    /// type configured then, so the body/content-type call order does not
    /// matter.
    pub fn with_body<B>(mut self, body: B) -> Self
    where
        B: Serialize + Send + Sync + 'static,
    {
        self.spec.set_body(body);
        self
    }

    /// Sets the `Accept` header.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the value is not a valid header value.
    pub fn accept(mut self, media_type: impl AsRef<str>) -> Result<Self> {
        let value = HeaderValue::try_from(media_type.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid accept value: {}", e)))?;
        self.spec.insert_header(ACCEPT, value);
        Ok(self)
    }

    /// Sets `Authorization: Basic <base64(username:password)>`.
    pub fn with_basic_authorization(
        mut self,
        username: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Self {
        let credentials = BASE64.encode(format!("{}:{}", username.as_ref(), password.as_ref()));
        // Base64 output is always a valid header value.
        if let Ok(value) = HeaderValue::try_from(format!("Basic {}", credentials)) {
            self.spec.insert_header(AUTHORIZATION, value);
        }
        self
    }

    /// Selects an arbitrary media type and advertises it via `Content-Type`.
    ///
    /// Marshal and unmarshal both follow this selection; a token with no
    /// codec entry fails at execute time rather than here.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is not a valid header value.
    pub fn with_content_type(mut self, media_type: impl AsRef<str>) -> Result<Self> {
        let value = HeaderValue::try_from(media_type.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid content type: {}", e)))?;
        self.spec.set_media_type(media_type.as_ref());
        self.spec.insert_header(CONTENT_TYPE, value);
        Ok(self)
    }

    /// Selects JSON as the media type and advertises it via `Content-Type`.
    pub fn with_json_content_type(mut self) -> Self {
        self.spec.set_media_type(APPLICATION_JSON);
        self.spec
            .insert_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        self
    }

    /// Selects XML as the media type and advertises it via `Content-Type`.
    pub fn with_xml_content_type(mut self) -> Self {
        self.spec.set_media_type(APPLICATION_XML);
        self.spec
            .insert_header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_XML));
        self
    }

    /// Replaces the JSON unmarshal function for this builder only.
    pub fn with_custom_json_unmarshal(
        mut self,
        unmarshal: impl Fn(&[u8], &mut T) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.codecs.override_entry(APPLICATION_JSON, Box::new(unmarshal));
        self
    }

    /// Replaces the XML unmarshal function for this builder only.
    pub fn with_custom_xml_unmarshal(
        mut self,
        unmarshal: impl Fn(&[u8], &mut T) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.codecs.override_entry(APPLICATION_XML, Box::new(unmarshal));
        self
    }

    /// Advertises `Accept-Encoding: gzip`. Responses that answer with
    /// `Content-Encoding: gzip` are inflated transparently.
    pub fn accept_gzip_encoding(mut self) -> Self {
        self.spec
            .insert_header(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        self
    }

    /// Logs the outgoing request verbatim, body included. Diagnostic only;
    /// never affects control flow.
    pub fn log_request_body(mut self) -> Self {
        self.log_request_body = true;
        self
    }

    /// Logs the raw response verbatim, body included. Diagnostic only;
    /// never affects control flow.
    pub fn log_response_body(mut self) -> Self {
        self.log_response_body = true;
        self
    }

    /// Executes the request, decoding a success-range body into `entity`.
    ///
    /// The pipeline: marshal the body with the configured media type, build
    /// the transport request, send it, and, for a 2xx status only, inflate
    /// the body per its `Content-Encoding` and unmarshal it in place. A
    /// non-2xx status is reported through
    /// [`CallResponse::status_code`](crate::CallResponse) with no error and
    /// `entity` untouched.
    pub async fn execute(&self, entity: &mut T) -> CallResponse {
        let body = match self.spec.marshal_body() {
            Ok(body) => body,
            Err(e) => return CallResponse::failure(e),
        };
        let request = match self.spec.transport_request(body) {
            Ok(request) => request,
            Err(e) => return CallResponse::failure(e),
        };

        if self.log_request_body {
            tracing::info!(
                method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                body = %String::from_utf8_lossy(&request.body),
                "outgoing request"
            );
        }
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "transport call failed");
                return CallResponse::failure(Error::Transport(e));
            }
        };

        let status_code = response.status.as_u16();
        tracing::debug!(status = status_code, "received response");
        if self.log_response_body {
            tracing::info!(
                status = status_code,
                headers = ?response.headers,
                body = %String::from_utf8_lossy(&response.body),
                "raw response"
            );
        }

        if !(200..300).contains(&status_code) {
            return CallResponse {
                status_code,
                error: None,
            };
        }

        let inflated = match self
            .compression
            .inflate(response.content_encoding(), &response.body)
        {
            Ok(inflated) => inflated,
            Err(e) => {
                return CallResponse {
                    status_code,
                    error: Some(e),
                }
            }
        };

        let error = self
            .codecs
            .unmarshal(self.spec.media_type(), &inflated, entity)
            .err();
        CallResponse { status_code, error }
    }
}
