//! Downstream HTTP client.
//!
//! # Responsibilities
//! - Issue exactly one request per forward target (no retries, no
//!   redirect following)
//! - Return any received status as a response, verbatim
//! - Report transport failures (connect, timeout, malformed response)
//!   without a status
//!
//! # Design Decisions
//! - One long-lived `reqwest::Client` shared by all requests; it pools
//!   connections internally and holds no per-call state
//! - Whether 4xx/5xx responses count as failures is decided by
//!   [`ErrorStatusPolicy`], not by the client

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::forward::headers::strip_transport_headers;
use crate::forward::rewrite::ForwardTarget;

/// Response received from the downstream, any status.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DownstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Failed downstream exchange.
#[derive(Debug, Error)]
pub enum DownstreamFailure {
    /// Downstream answered with a status treated as an error.
    #[error("Downstream responded with status {status}")]
    Http { status: StatusCode, raw_body: String },

    /// No usable response was received.
    #[error("Downstream transport error: {cause}")]
    Transport { cause: String },
}

impl DownstreamFailure {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

pub type DownstreamResult = Result<DownstreamResponse, DownstreamFailure>;

/// Outbound HTTP capability used by the interceptor.
#[async_trait]
pub trait Downstream: Send + Sync {
    async fn send(&self, target: ForwardTarget) -> DownstreamResult;
}

/// How downstream error statuses are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusPolicy {
    /// Relay every status to the caller unchanged.
    #[default]
    Relay,
    /// Turn 4xx/5xx responses into forwarding failures.
    Fail,
}

impl ErrorStatusPolicy {
    pub fn apply(self, response: DownstreamResponse) -> DownstreamResult {
        let rejected = response.status.is_client_error() || response.status.is_server_error();
        match self {
            Self::Fail if rejected => Err(DownstreamFailure::Http {
                status: response.status,
                raw_body: String::from_utf8_lossy(&response.body).into_owned(),
            }),
            _ => Ok(response),
        }
    }
}

/// [`Downstream`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpDownstream {
    client: reqwest::Client,
}

impl HttpDownstream {
    /// Build a client with the given connect and overall request timeouts.
    pub fn new(
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client. It must not follow redirects, or a 3xx would
    /// turn into a second request.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downstream for HttpDownstream {
    async fn send(&self, target: ForwardTarget) -> DownstreamResult {
        let ForwardTarget {
            url,
            method,
            mut headers,
            body,
        } = target;
        strip_transport_headers(&mut headers);

        let response = self
            .client
            .request(method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_failure(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| transport_failure(&e))?;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            body_len = body.len(),
            "Downstream responded"
        );

        Ok(DownstreamResponse {
            status,
            headers,
            body,
        })
    }
}

fn transport_failure(err: &reqwest::Error) -> DownstreamFailure {
    let cause = if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    DownstreamFailure::Transport { cause }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: StatusCode, body: &'static str) -> DownstreamResponse {
        DownstreamResponse {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn test_relay_policy_passes_errors_through() {
        let result = ErrorStatusPolicy::Relay.apply(response(StatusCode::NOT_FOUND, "missing"));
        assert_eq!(result.unwrap().status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_fail_policy_rejects_error_statuses() {
        let failed = response(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let result = ErrorStatusPolicy::Fail.apply(failed);
        match result {
            Err(DownstreamFailure::Http { status, raw_body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(raw_body, "boom");
            }
            other => panic!("expected http failure, got {other:?}"),
        }
    }

    #[test]
    fn test_fail_policy_keeps_success() {
        let result = ErrorStatusPolicy::Fail.apply(response(StatusCode::CREATED, "{}"));
        assert!(result.is_ok());

        let result = ErrorStatusPolicy::Fail.apply(response(StatusCode::NOT_MODIFIED, ""));
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_downstream_is_transport_failure() {
        let client = reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let downstream = HttpDownstream::from_client(client);
        let closed = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let target = ForwardTarget {
            url: format!("http://{closed}/Patient"),
            method: axum::http::Method::GET,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };

        let failure = downstream.send(target).await.unwrap_err();

        assert!(failure.status().is_none());
        assert!(matches!(failure, DownstreamFailure::Transport { .. }));
    }
}
