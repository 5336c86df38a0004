//! Inbound request capture.
//!
//! # Responsibilities
//! - Define the capability set the interceptor needs from a host request
//! - Reject exchanges that are not plain HTTP before touching the body
//! - Copy headers minus `Content-Length`, defaulting `Content-Type`
//! - Buffer the body exactly once, as raw bytes

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};

use crate::error::{ForwardError, Result};
use crate::forward::params::QueryParameters;

/// Content type assumed when the caller sent none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Kind of exchange the host handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Ordinary request/response exchange.
    Http,
    /// Protocol upgrade (WebSocket, h2c).
    Upgrade,
    /// `CONNECT` tunnel.
    Tunnel,
}

/// Host request as seen by the interceptor.
///
/// The body may be read once; a second read fails with
/// [`ForwardError::BodyRead`].
#[async_trait]
pub trait InboundRequest: Send {
    fn transport_kind(&self) -> TransportKind;

    fn method(&self) -> &str;

    fn path(&self) -> &str;

    fn raw_query(&self) -> Option<&str>;

    /// Decoded parameter view, repeated keys preserved.
    fn parameters(&self) -> QueryParameters;

    fn headers(&self) -> &HeaderMap;

    async fn read_body(&mut self) -> Result<Bytes>;
}

/// Fail with `BadRequestKind` unless the exchange is plain HTTP.
pub fn ensure_plain_http(request: &dyn InboundRequest) -> Result<()> {
    match request.transport_kind() {
        TransportKind::Http => Ok(()),
        TransportKind::Upgrade => Err(ForwardError::BadRequestKind(
            "protocol upgrade requests cannot be forwarded".into(),
        )),
        TransportKind::Tunnel => Err(ForwardError::BadRequestKind(
            "CONNECT tunnels cannot be forwarded".into(),
        )),
    }
}

/// Immutable, in-memory copy of one inbound request.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: String,
    original_path: String,
    raw_query: Option<String>,
    parameters: QueryParameters,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestSnapshot {
    /// Capture a snapshot from a live host request, consuming its body.
    pub async fn capture(request: &mut dyn InboundRequest) -> Result<Self> {
        ensure_plain_http(request)?;

        let method = request.method().to_string();
        let original_path = request.path().to_string();
        let raw_query = request.raw_query().map(str::to_string);
        let parameters = request.parameters();
        let headers = forwardable_headers(request.headers());
        let body = request.read_body().await?;

        Ok(Self {
            method,
            original_path,
            raw_query,
            parameters,
            headers,
            body,
        })
    }

    /// Build a snapshot from already-extracted parts.
    ///
    /// Applies the same header rules as [`RequestSnapshot::capture`].
    pub fn from_parts(
        method: impl Into<String>,
        path: impl Into<String>,
        raw_query: Option<String>,
        headers: &HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        let parameters = raw_query
            .as_deref()
            .map(QueryParameters::parse)
            .unwrap_or_default();
        Self {
            method: method.into(),
            original_path: path.into(),
            raw_query,
            parameters,
            headers: forwardable_headers(headers),
            body: body.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn parameters(&self) -> &QueryParameters {
        &self.parameters
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Copy every header except `Content-Length`; add a JSON content type if
/// the caller sent none.
fn forwardable_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if *name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(DEFAULT_CONTENT_TYPE),
        );
    }
    headers
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::http::HeaderName;

    /// In-memory host request for unit tests.
    pub(crate) struct StubRequest {
        pub kind: TransportKind,
        pub method: String,
        pub path: String,
        pub query: Option<String>,
        pub headers: HeaderMap,
        pub body: Option<Bytes>,
    }

    impl StubRequest {
        pub fn new(method: &str, path_and_query: &str) -> Self {
            let (path, query) = match path_and_query.split_once('?') {
                Some((path, query)) => (path.to_string(), Some(query.to_string())),
                None => (path_and_query.to_string(), None),
            };
            Self {
                kind: TransportKind::Http,
                method: method.to_string(),
                path,
                query,
                headers: HeaderMap::new(),
                body: Some(Bytes::new()),
            }
        }

        pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
            let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
            self.headers.append(name, HeaderValue::from_static(value));
            self
        }

        pub fn with_body(mut self, body: &'static [u8]) -> Self {
            self.body = Some(Bytes::from_static(body));
            self
        }
    }

    #[async_trait]
    impl InboundRequest for StubRequest {
        fn transport_kind(&self) -> TransportKind {
            self.kind
        }

        fn method(&self) -> &str {
            &self.method
        }

        fn path(&self) -> &str {
            &self.path
        }

        fn raw_query(&self) -> Option<&str> {
            self.query.as_deref()
        }

        fn parameters(&self) -> QueryParameters {
            self.query
                .as_deref()
                .map(QueryParameters::parse)
                .unwrap_or_default()
        }

        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        async fn read_body(&mut self) -> Result<Bytes> {
            self.body
                .take()
                .ok_or_else(|| ForwardError::BodyRead("request body already consumed".into()))
        }
    }

    #[tokio::test]
    async fn test_capture_copies_request() {
        let mut request = StubRequest::new("POST", "/fhir/Patient?name=Jo&name=Amy")
            .with_header("content-type", "application/fhir+json")
            .with_body(br#"{"resourceType":"Patient"}"#);

        let snapshot = RequestSnapshot::capture(&mut request).await.unwrap();

        assert_eq!(snapshot.method(), "POST");
        assert_eq!(snapshot.original_path(), "/fhir/Patient");
        assert_eq!(snapshot.raw_query(), Some("name=Jo&name=Amy"));
        assert_eq!(snapshot.parameters().get("name").unwrap(), ["Jo", "Amy"]);
        assert_eq!(snapshot.headers()["content-type"], "application/fhir+json");
        assert_eq!(snapshot.body().as_ref(), br#"{"resourceType":"Patient"}"#);
    }

    #[tokio::test]
    async fn test_content_length_is_dropped() {
        let mut request = StubRequest::new("POST", "/fhir/Patient")
            .with_header("Content-Length", "42")
            .with_header("X-Test", "v");

        let snapshot = RequestSnapshot::capture(&mut request).await.unwrap();

        assert!(!snapshot.headers().contains_key(header::CONTENT_LENGTH));
        assert_eq!(snapshot.headers()["x-test"], "v");
    }

    #[tokio::test]
    async fn test_content_type_defaults_to_json() {
        let mut request = StubRequest::new("DELETE", "/fhir/Patient/1");
        let snapshot = RequestSnapshot::capture(&mut request).await.unwrap();
        assert_eq!(snapshot.headers()[header::CONTENT_TYPE], "application/json");

        let mut request =
            StubRequest::new("POST", "/fhir/Binary").with_header("Content-Type", "text/plain");
        let snapshot = RequestSnapshot::capture(&mut request).await.unwrap();
        assert_eq!(snapshot.headers()[header::CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn test_repeated_headers_survive() {
        let mut request = StubRequest::new("GET", "/fhir/Patient")
            .with_header("accept", "application/fhir+json")
            .with_header("accept", "application/json");

        let snapshot = RequestSnapshot::capture(&mut request).await.unwrap();
        let accepts: Vec<_> = snapshot.headers().get_all(header::ACCEPT).iter().collect();

        assert_eq!(accepts.len(), 2);
    }

    #[tokio::test]
    async fn test_binary_body_is_kept_verbatim() {
        let mut request =
            StubRequest::new("PUT", "/fhir/Binary/1").with_body(&[0xff, 0x00, 0xfe, 0x80]);

        let snapshot = RequestSnapshot::capture(&mut request).await.unwrap();

        assert_eq!(snapshot.body().as_ref(), &[0xff, 0x00, 0xfe, 0x80]);
    }

    #[tokio::test]
    async fn test_body_is_read_once() {
        let mut request = StubRequest::new("POST", "/fhir/Patient").with_body(b"{}");

        RequestSnapshot::capture(&mut request).await.unwrap();
        let second = RequestSnapshot::capture(&mut request).await;

        assert!(matches!(second, Err(ForwardError::BodyRead(_))));
    }

    #[tokio::test]
    async fn test_upgrade_rejected_before_body_read() {
        let mut request = StubRequest::new("GET", "/fhir/Patient").with_body(b"payload");
        request.kind = TransportKind::Upgrade;

        let result = RequestSnapshot::capture(&mut request).await;

        assert!(matches!(result, Err(ForwardError::BadRequestKind(_))));
        assert!(request.body.is_some(), "body must stay unread");
    }
}
