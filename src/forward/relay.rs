//! Response relay onto the caller's channel.
//!
//! Status, content type, body and `Location` are copied. `Location` is
//! kept so redirects and `201 Created` stay meaningful to the caller.

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::error::Result;
use crate::forward::client::DownstreamResponse;
use crate::forward::snapshot::DEFAULT_CONTENT_TYPE;

/// Response-writing side of the host exchange.
///
/// Each call may fail with [`crate::error::ForwardError::RelayWrite`], e.g.
/// when the caller has gone away or the response was already committed.
pub trait ResponseSink: Send {
    fn set_status(&mut self, status: StatusCode) -> Result<()>;

    fn set_content_type(&mut self, content_type: &str) -> Result<()>;

    fn set_location(&mut self, location: &str) -> Result<()>;

    fn write_body(&mut self, body: Bytes) -> Result<()>;
}

/// Copy status, content type, location and body of `response` onto `sink`.
pub fn relay(response: DownstreamResponse, sink: &mut dyn ResponseSink) -> Result<()> {
    sink.set_status(response.status)?;
    sink.set_content_type(response.content_type().unwrap_or(DEFAULT_CONTENT_TYPE))?;
    if let Some(location) = response.location() {
        sink.set_location(location)?;
    }
    sink.write_body(response.body)
}
