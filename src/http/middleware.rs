//! Forwarding middleware.
//!
//! Runs the interceptor in front of the local pipeline: bypassed requests
//! continue to the local routes, everything else is answered from the
//! downstream (or with an `OperationOutcome` when forwarding fails).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use crate::forward::{Disposition, ForwardingInterceptor};
use crate::http::inbound::{AxumInbound, BufferedResponse};
use crate::http::X_REQUEST_ID;

/// State shared by every request.
#[derive(Clone)]
pub struct ForwardState {
    pub interceptor: Arc<ForwardingInterceptor>,
    pub body_limit: usize,
}

pub async fn forwarding_middleware(
    State(state): State<ForwardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let span = tracing::info_span!(
        "intercept",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut inbound = AxumInbound::new(request, state.body_limit);
    let mut sink = BufferedResponse::default();

    let outcome = state
        .interceptor
        .handle(&mut inbound, &mut sink)
        .instrument(span)
        .await;

    match outcome {
        Ok(Disposition::Continue) => next.run(inbound.into_request()).await,
        Ok(Disposition::Handled) => sink.into_response(),
        Err(err) => err.into_response(),
    }
}
