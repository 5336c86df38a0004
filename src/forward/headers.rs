//! Transport-level header filtering for the downstream hop.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers (RFC 9110 §7.6.1), including any named in
//!   `Connection`
//! - Drop `Host` and `Content-Length` so the client derives them from the
//!   target URL and the buffered body
//! - Drop `Accept-Encoding`: the relay copies only status, content type
//!   and body, so the downstream must answer with an identity encoding

use axum::http::{header, HeaderMap, HeaderName};

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove headers the HTTP client must compute itself.
pub fn strip_transport_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::ACCEPT_ENCODING);
}
