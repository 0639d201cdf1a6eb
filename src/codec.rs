//! Content codecs: marshal/unmarshal function pairs keyed by media type.
//!
//! JSON and XML are built in. The marshal half is fixed; the unmarshal half
//! lives in a [`CodecTable`] owned by each builder, so a per-call override
//! never leaks into other builders.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Error;

/// The JSON media type token.
pub const APPLICATION_JSON: &str = "application/json";

/// The XML media type token.
pub const APPLICATION_XML: &str = "application/xml";

/// An unmarshal function: decode bytes into the target entity in place.
pub type UnmarshalFn<T> = Box<dyn Fn(&[u8], &mut T) -> Result<(), Error> + Send + Sync>;

/// Serializes a body in the given media type.
///
/// This is the marshal half of the codec pair; it is deliberately not
/// overridable.
pub(crate) fn marshal<B: Serialize>(media_type: &str, body: &B) -> Result<Vec<u8>, Error> {
    match media_type {
        APPLICATION_JSON => serde_json::to_vec(body).map_err(|e| Error::Marshal {
            media_type: APPLICATION_JSON.to_string(),
            detail: e.to_string(),
        }),
        APPLICATION_XML => quick_xml::se::to_string(body)
            .map(String::into_bytes)
            .map_err(|e| Error::Marshal {
                media_type: APPLICATION_XML.to_string(),
                detail: e.to_string(),
            }),
        other => Err(Error::UnsupportedMediaType(other.to_string())),
    }
}

/// Per-builder table of unmarshal functions keyed by media-type token.
///
/// Constructed fresh for every builder with the JSON and XML entries present;
/// either entry may be replaced without affecting the marshal side or any
/// other builder.
pub struct CodecTable<T> {
    entries: HashMap<String, UnmarshalFn<T>>,
}

impl<T> CodecTable<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Builds the table with the two built-in entries.
    pub(crate) fn builtin() -> Self {
        let mut entries: HashMap<String, UnmarshalFn<T>> = HashMap::new();
        entries.insert(
            APPLICATION_JSON.to_string(),
            Box::new(|bytes, out| {
                *out = serde_json::from_slice(bytes)
                    .map_err(|e| Error::unmarshal(APPLICATION_JSON, e))?;
                Ok(())
            }),
        );
        entries.insert(
            APPLICATION_XML.to_string(),
            Box::new(|bytes, out| {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| Error::unmarshal(APPLICATION_XML, e))?;
                *out = quick_xml::de::from_str(text)
                    .map_err(|e| Error::unmarshal(APPLICATION_XML, e))?;
                Ok(())
            }),
        );
        Self { entries }
    }
}

impl<T> CodecTable<T> {
    /// Replaces the unmarshal entry for a media type.
    pub(crate) fn override_entry(&mut self, media_type: &str, unmarshal: UnmarshalFn<T>) {
        self.entries.insert(media_type.to_string(), unmarshal);
    }

    /// Decodes `bytes` into `out` with the entry registered for `media_type`.
    pub(crate) fn unmarshal(&self, media_type: &str, bytes: &[u8], out: &mut T) -> Result<(), Error> {
        let entry = self
            .entries
            .get(media_type)
            .ok_or_else(|| Error::UnsupportedMediaType(media_type.to_string()))?;
        entry(bytes, out)
    }
}
