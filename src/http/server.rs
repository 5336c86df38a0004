//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: local endpoints behind the forwarding middleware
//! - Wire up middleware (request ID, tracing, timeout)
//! - Build the shared downstream client
//! - Apply forwarding settings from config reloads
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ForwardingConfig, ProxyConfig};
use crate::forward::{Downstream, ForwardSettings, ForwardingInterceptor, HttpDownstream};
use crate::http::local;
use crate::http::middleware::{forwarding_middleware, ForwardState};

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    interceptor: Arc<ForwardingInterceptor>,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server forwarding through a `reqwest` client built from the
    /// configured timeouts.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let downstream = HttpDownstream::new(
            Duration::from_secs(config.timeouts.connect_secs),
            Duration::from_secs(config.timeouts.downstream_secs),
        )?;
        Ok(Self::with_downstream(config, Arc::new(downstream)))
    }

    /// Create a server forwarding through the given downstream.
    pub fn with_downstream(config: ProxyConfig, downstream: Arc<dyn Downstream>) -> Self {
        let settings = ForwardSettings::from_config(&config.forwarding);
        let interceptor = Arc::new(ForwardingInterceptor::new(settings, downstream));

        let state = ForwardState {
            interceptor: interceptor.clone(),
            body_limit: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            interceptor,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: ForwardState) -> Router {
        local::router(
            &config.forwarding.strip_prefix,
            &config.server,
            &config.forwarding.backend_url,
        )
        .layer(middleware::from_fn_with_state(state, forwarding_middleware))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Router with all layers, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn interceptor(&self) -> Arc<ForwardingInterceptor> {
        self.interceptor.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Sections received on `config_updates` replace the forwarding settings.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ForwardingConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend_url = %self.config.forwarding.backend_url,
            strip_prefix = %self.config.forwarding.strip_prefix,
            "HTTP server starting"
        );

        let interceptor = self.interceptor.clone();
        tokio::spawn(async move {
            while let Some(forwarding) = config_updates.recv().await {
                interceptor.update_settings(ForwardSettings::from_config(&forwarding));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
