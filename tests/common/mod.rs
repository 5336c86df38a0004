//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use fhir_relay::config::{ForwardingConfig, ProxyConfig};
use fhir_relay::forward::HttpDownstream;
use fhir_relay::http::HttpServer;
use fhir_relay::lifecycle::Shutdown;

/// A request as received by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Canned reply of the mock backend.
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub location: Option<&'static str>,
    pub body: &'static str,
}

#[derive(Clone)]
struct BackendState {
    reply: Reply,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

/// Handle to a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }
}

/// Start a mock backend that records requests and answers with `reply`.
pub async fn start_mock_backend(reply: Reply) -> MockBackend {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        reply,
        recorded: recorded.clone(),
    };
    let app = Router::new().fallback(record_and_reply).with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, recorded }
}

async fn record_and_reply(State(state): State<BackendState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.recorded.lock().unwrap().push(Recorded {
        method: parts.method.to_string(),
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body,
    });

    let mut response = Response::new(Body::from(state.reply.body));
    *response.status_mut() = StatusCode::from_u16(state.reply.status).unwrap();
    if let Some(content_type) = state.reply.content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    if let Some(location) = state.reply.location {
        response
            .headers_mut()
            .insert(header::LOCATION, HeaderValue::from_static(location));
    }
    response
}

/// Address on loopback with nothing listening.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config forwarding `/fhir` to `backend_url`.
pub fn relay_config(backend_url: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.forwarding.backend_url = backend_url.into();
    config.timeouts.connect_secs = 1;
    config.timeouts.downstream_secs = 5;
    config
}

/// Handle to a running relay.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<ForwardingConfig>,
    pub shutdown: Shutdown,
}

impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the relay with `config` on an ephemeral port.
pub async fn start_relay(config: ProxyConfig) -> RunningRelay {
    let downstream = HttpDownstream::from_client(
        reqwest::Client::builder()
            .no_proxy()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.downstream_secs))
            .build()
            .unwrap(),
    );
    let server = HttpServer::with_downstream(config, Arc::new(downstream));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningRelay {
        addr,
        updates,
        shutdown,
    }
}

/// Caller-side client. Redirects are not followed so relayed 3xx responses
/// can be inspected.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
