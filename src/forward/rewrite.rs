//! Forward target construction.
//!
//! # Responsibilities
//! - Strip the configured path prefix at a segment boundary
//! - Rebuild the query string from the parameter view (or pass the raw
//!   query through, per configuration)
//! - Join base URL, path and query into the downstream URL
//! - Resolve the method to a canonical HTTP verb

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};
use serde::{Deserialize, Serialize};

use crate::error::{ForwardError, Result};
use crate::forward::snapshot::RequestSnapshot;

const KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// Where the forwarded query string comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuerySource {
    /// Rebuild from the parameter view: every occurrence re-emitted as
    /// received, empty segments dropped.
    #[default]
    Decoded,
    /// Pass the inbound query string through untouched.
    Raw,
}

/// Fully constructed outbound request.
#[derive(Debug, Clone)]
pub struct ForwardTarget {
    pub url: String,
    pub method: Method,
    /// Never contains `Content-Length`.
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Derive the outbound request for `snapshot`.
pub fn build_forward_target(
    snapshot: &RequestSnapshot,
    base_url: &str,
    strip_prefix: &str,
    query_source: QuerySource,
) -> Result<ForwardTarget> {
    let method = normalize_method(snapshot.method())?;

    let path = strip_path_prefix(snapshot.original_path(), strip_prefix);
    let query = match query_source {
        QuerySource::Decoded => snapshot.parameters().to_query_string(),
        QuerySource::Raw => snapshot.raw_query().unwrap_or_default().to_string(),
    };

    let mut headers = snapshot.headers().clone();
    headers.remove(header::CONTENT_LENGTH);

    Ok(ForwardTarget {
        url: join_url(base_url, path, &query),
        method,
        headers,
        body: snapshot.body().clone(),
    })
}

/// Upper-case `method` and map it onto a standard verb.
pub fn normalize_method(method: &str) -> Result<Method> {
    let upper = method.to_ascii_uppercase();
    KNOWN_METHODS
        .iter()
        .find(|known| known.as_str() == upper)
        .cloned()
        .ok_or_else(|| ForwardError::UnsupportedMethod(method.to_string()))
}

/// Remove `prefix` from the start of `path`.
///
/// `/fhir/Patient` loses `/fhir`, `/fhirx` does not.
pub fn strip_path_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

fn join_url(base_url: &str, path: &str, query: &str) -> String {
    let mut url = String::with_capacity(base_url.len() + path.len() + query.len() + 1);
    url.push_str(base_url.trim_end_matches('/'));
    url.push_str(path);
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    url
}
