//! Axum adapters for the forwarding core.
//!
//! # Responsibilities
//! - Expose an axum request as an `InboundRequest` without consuming the
//!   body until the interceptor asks for it
//! - Hand the untouched request back to the local pipeline on bypass
//! - Buffer the relayed status, content type and body into a `Response`

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{ForwardError, Result};
use crate::forward::params::QueryParameters;
use crate::forward::relay::ResponseSink;
use crate::forward::snapshot::{InboundRequest, TransportKind};

/// An axum request viewed through [`InboundRequest`].
pub struct AxumInbound {
    parts: Parts,
    body: Option<Body>,
    body_limit: usize,
}

impl AxumInbound {
    pub fn new(request: Request<Body>, body_limit: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body: Some(body),
            body_limit,
        }
    }

    /// Reassemble the request for the local pipeline.
    ///
    /// The body is empty if it was already read.
    pub fn into_request(self) -> Request<Body> {
        Request::from_parts(self.parts, self.body.unwrap_or_else(Body::empty))
    }
}

#[async_trait]
impl InboundRequest for AxumInbound {
    fn transport_kind(&self) -> TransportKind {
        if self.parts.method == Method::CONNECT {
            TransportKind::Tunnel
        } else if self.parts.headers.contains_key(header::UPGRADE) {
            TransportKind::Upgrade
        } else {
            TransportKind::Http
        }
    }

    fn method(&self) -> &str {
        self.parts.method.as_str()
    }

    fn path(&self) -> &str {
        self.parts.uri.path()
    }

    fn raw_query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    fn parameters(&self) -> QueryParameters {
        self.parts
            .uri
            .query()
            .map(QueryParameters::parse)
            .unwrap_or_default()
    }

    fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    async fn read_body(&mut self) -> Result<Bytes> {
        let body = self
            .body
            .take()
            .ok_or_else(|| ForwardError::BodyRead("request body already consumed".into()))?;
        axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| ForwardError::BodyRead(e.to_string()))
    }
}

/// [`ResponseSink`] that buffers the relayed response for axum.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    content_type: Option<HeaderValue>,
    location: Option<HeaderValue>,
    body: Option<Bytes>,
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: StatusCode) -> Result<()> {
        self.status = Some(status);
        Ok(())
    }

    fn set_content_type(&mut self, content_type: &str) -> Result<()> {
        let value = HeaderValue::from_str(content_type)
            .map_err(|e| ForwardError::RelayWrite(format!("invalid content type: {e}")))?;
        self.content_type = Some(value);
        Ok(())
    }

    fn set_location(&mut self, location: &str) -> Result<()> {
        let value = HeaderValue::from_str(location)
            .map_err(|e| ForwardError::RelayWrite(format!("invalid location: {e}")))?;
        self.location = Some(value);
        Ok(())
    }

    fn write_body(&mut self, body: Bytes) -> Result<()> {
        if self.body.is_some() {
            return Err(ForwardError::RelayWrite("response body already written".into()));
        }
        self.body = Some(body);
        Ok(())
    }
}

impl IntoResponse for BufferedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.unwrap_or_default()));
        // No status means the relay broke off before writing anything.
        *response.status_mut() = self.status.unwrap_or(StatusCode::BAD_GATEWAY);
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type);
        }
        if let Some(location) = self.location {
            response.headers_mut().insert(header::LOCATION, location);
        }
        response
    }
}
