//! Locally served endpoints.
//!
//! Requests the bypass policy lets through land here: the server root, the
//! prefix root and the capability statement. Anything else that reaches the
//! local pipeline gets a 404 `OperationOutcome`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::config::ServerInfoConfig;
use crate::http::outcome::{not_found, FHIR_JSON};

#[derive(Debug, Clone)]
struct LocalInfo {
    software_name: String,
    software_version: &'static str,
    fhir_version: String,
    backend_url: String,
}

/// Router for the local pipeline under `prefix`.
pub fn router(prefix: &str, server: &ServerInfoConfig, backend_url: &str) -> Router {
    let info = Arc::new(LocalInfo {
        software_name: server.software_name.clone(),
        software_version: env!("CARGO_PKG_VERSION"),
        fhir_version: server.fhir_version.clone(),
        backend_url: backend_url.to_string(),
    });

    let mut router = Router::new().route("/", get(server_root));
    if !prefix.is_empty() {
        router = router
            .route(prefix, get(server_root))
            .route(&format!("{prefix}/"), get(server_root));
    }
    router
        .route(&format!("{prefix}/metadata"), get(capability_statement))
        .fallback(not_found)
        .with_state(info)
}

async fn server_root(State(info): State<Arc<LocalInfo>>) -> Json<Value> {
    Json(json!({
        "name": info.software_name,
        "version": info.software_version,
        "fhirVersion": info.fhir_version,
        "forwardingTo": info.backend_url,
    }))
}

async fn capability_statement(State(info): State<Arc<LocalInfo>>) -> Response {
    let statement = json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "kind": "instance",
        "software": {
            "name": info.software_name,
            "version": info.software_version,
        },
        "fhirVersion": info.fhir_version,
        "format": ["json"],
        "rest": [{ "mode": "server" }],
    });

    let mut response = Json(statement).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn local() -> Router {
        router("/fhir", &ServerInfoConfig::default(), "https://backend.example")
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_roots_are_served() {
        for uri in ["/", "/fhir", "/fhir/"] {
            let (status, body) = get_json(local(), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["name"], "fhir-relay");
        }
    }

    #[tokio::test]
    async fn test_capability_statement() {
        let (status, body) = get_json(local(), "/fhir/metadata").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resourceType"], "CapabilityStatement");
        assert_eq!(body["fhirVersion"], "4.0.1");
        assert_eq!(body["kind"], "instance");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (status, body) = get_json(local(), "/fhir/Patient").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["resourceType"], "OperationOutcome");
    }

    #[tokio::test]
    async fn test_empty_prefix() {
        let app = router("", &ServerInfoConfig::default(), "https://backend.example");
        let (status, body) = get_json(app, "/metadata").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["resourceType"], "CapabilityStatement");
    }
}
