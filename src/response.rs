//! The uniform result value of one executed request.

use crate::Error;

/// What one execution of a request produced.
///
/// The decoded entity is written in place into the caller-supplied output
/// value passed to `execute`; this type only reports the status code and
/// whatever pipeline error occurred.
///
/// Two invariants hold:
///
/// * `status_code` is `0` exactly when the transport call itself failed
///   before any HTTP status was obtained; in that case it must not be
///   trusted as a status.
/// * A non-2xx status is not an error here: `error` stays `None` and the
///   body is not decoded. Interpreting such statuses is the response
///   handler's job.
#[derive(Debug)]
pub struct CallResponse {
    /// The HTTP status code, or `0` if the transport call failed.
    pub status_code: u16,
    /// The pipeline error, if the transport call, decompression, or
    /// unmarshalling failed.
    pub error: Option<Error>,
}

impl CallResponse {
    /// A response for a request that never produced an HTTP status.
    pub(crate) fn failure(error: Error) -> Self {
        Self {
            status_code: 0,
            error: Some(error),
        }
    }

    /// Returns `true` for a 2xx status with no pipeline error.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code) && self.error.is_none()
    }
}
