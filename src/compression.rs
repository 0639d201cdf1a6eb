//! Transfer decompression keyed by the `Content-Encoding` response header.
//!
//! Exactly one non-identity entry exists: `gzip`. An absent or empty header
//! maps to the identity transform; any other token is an error rather than
//! a silent pass-through of bytes that would decode wrongly.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::GzDecoder;

use crate::Error;

/// A decompression function: raw body bytes in, inflated bytes out.
pub type InflateFn = fn(&[u8]) -> Result<Vec<u8>, Error>;

/// Maps a `Content-Encoding` token (exact string match) to its inflate
/// function.
pub struct CompressionRegistry {
    entries: HashMap<String, InflateFn>,
}

impl CompressionRegistry {
    /// Builds the registry with the built-in entries: `gzip` and the
    /// empty-token identity.
    pub(crate) fn builtin() -> Self {
        let mut entries: HashMap<String, InflateFn> = HashMap::new();
        entries.insert("gzip".to_string(), gzip_inflate);
        entries.insert(String::new(), identity);
        Self { entries }
    }

    /// Runs `body` through the function registered for `encoding`.
    pub(crate) fn inflate(&self, encoding: &str, body: &[u8]) -> Result<Vec<u8>, Error> {
        let entry = self
            .entries
            .get(encoding)
            .ok_or_else(|| Error::UnsupportedEncoding(encoding.to_string()))?;
        entry(body)
    }
}

fn gzip_inflate(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = GzDecoder::new(data);
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| Error::Decompress {
            encoding: "gzip".to_string(),
            detail: e.to_string(),
        })?;
    Ok(inflated)
}

fn identity(data: &[u8]) -> Result<Vec<u8>, Error> {
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn gzip_inflates() {
        let registry = CompressionRegistry::builtin();
        let inflated = registry.inflate("gzip", &gzip(b"hello")).unwrap();
        assert_eq!(inflated, b"hello");
    }

    #[test]
    fn empty_token_is_identity() {
        let registry = CompressionRegistry::builtin();
        let inflated = registry.inflate("", b"as-is").unwrap();
        assert_eq!(inflated, b"as-is");
    }

    #[test]
    fn unknown_token_is_an_error() {
        let registry = CompressionRegistry::builtin();
        let result = registry.inflate("br", b"whatever");
        assert!(matches!(result, Err(Error::UnsupportedEncoding(t)) if t == "br"));
    }

    #[test]
    fn corrupt_gzip_reports_decompress_error() {
        let registry = CompressionRegistry::builtin();
        let result = registry.inflate("gzip", b"definitely not gzip");
        assert!(matches!(result, Err(Error::Decompress { encoding, .. }) if encoding == "gzip"));
    }
}
