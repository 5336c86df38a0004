//! FHIR `OperationOutcome` error responses.

use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ForwardError;

pub const FHIR_JSON: &str = "application/fhir+json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    resource_type: &'static str,
    issue: Vec<Issue>,
}

#[derive(Debug, Serialize)]
pub struct Issue {
    severity: &'static str,
    code: &'static str,
    diagnostics: String,
}

impl OperationOutcome {
    /// Single-issue outcome with `error` severity.
    pub fn error(code: &'static str, diagnostics: impl Into<String>) -> Self {
        Self {
            resource_type: "OperationOutcome",
            issue: vec![Issue {
                severity: "error",
                code,
                diagnostics: diagnostics.into(),
            }],
        }
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        let body = serde_json::to_vec(&self).unwrap_or_default();
        let mut response = (status, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
        response
    }
}

/// Every forwarding failure is a `400` with a `processing` issue.
impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        OperationOutcome::error("processing", self.to_string())
            .into_response_with(StatusCode::BAD_REQUEST)
    }
}

/// Local pipeline fallback for paths nothing serves.
pub async fn not_found(uri: Uri) -> Response {
    OperationOutcome::error("not-found", format!("Unknown resource path: {}", uri.path()))
        .into_response_with(StatusCode::NOT_FOUND)
}
