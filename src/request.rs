//! The mutable description of a single request.

use std::collections::HashMap;
use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use url::Url;

use crate::codec::{self, APPLICATION_JSON};
use crate::transport::TransportRequest;
use crate::{Error, Result};

/// A deferred marshal of the request body: given the media type chosen at
/// execute time, produce the wire bytes.
type BodyMarshal = Box<dyn Fn(&str) -> Result<Vec<u8>> + Send + Sync>;

/// Everything that describes one HTTP request before it is serialized for
/// the transport: method, path, headers, query parameters, body, and the
/// media type driving marshal/unmarshal selection.
///
/// Mutated only through the builder; serialized once at execute time.
pub(crate) struct RequestSpec {
    method: Method,
    path: String,
    headers: HeaderMap,
    query_params: HashMap<String, String>,
    media_type: String,
    body: Option<BodyMarshal>,
}

impl RequestSpec {
    pub(crate) fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            query_params: HashMap::new(),
            media_type: APPLICATION_JSON.to_string(),
            body: None,
        }
    }

    pub(crate) fn media_type(&self) -> &str {
        &self.media_type
    }

    pub(crate) fn set_media_type(&mut self, media_type: impl Into<String>) {
        self.media_type = media_type.into();
    }

    /// Inserts a header; last write wins for a repeated name.
    pub(crate) fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Sets a query parameter; a repeated key overwrites the earlier value.
    pub(crate) fn set_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.insert(key.into(), value.into());
    }

    pub(crate) fn set_body<B>(&mut self, body: B)
    where
        B: Serialize + Send + Sync + 'static,
    {
        self.body = Some(Box::new(move |media_type| codec::marshal(media_type, &body)));
    }

    /// Marshals the body with the currently configured media type. A request
    /// without a body yields an empty payload.
    pub(crate) fn marshal_body(&self) -> Result<Vec<u8>> {
        match &self.body {
            Some(marshal) => marshal(&self.media_type),
            None => Ok(Vec::new()),
        }
    }

    /// Serializes the description into a transport-level request: parses the
    /// path as a URL and appends the URL-encoded query parameters.
    pub(crate) fn transport_request(&self, body: Vec<u8>) -> Result<TransportRequest> {
        let mut url = Url::parse(&self.path).map_err(Error::InvalidUrl)?;
        for (key, value) in &self.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(TransportRequest {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
            body,
        })
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("query_params", &self.query_params)
            .field("media_type", &self.media_type)
            .field("body", &self.body.is_some())
            .finish()
    }
}
