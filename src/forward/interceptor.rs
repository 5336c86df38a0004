//! Request interceptor.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → transport kind check (BadRequestKind)
//!     → bypass policy ──────────────▶ Disposition::Continue
//!     → snapshot (body consumed)
//!     → rewrite (UnsupportedMethod)
//!     → downstream send ── failure ─▶ classify → ForwardError::Failed
//!     → status policy
//!     → relay onto ResponseSink ────▶ Disposition::Handled
//! ```

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;

use crate::config::ForwardingConfig;
use crate::error::{ForwardError, Result};
use crate::forward::bypass::BypassPolicy;
use crate::forward::client::{Downstream, ErrorStatusPolicy};
use crate::forward::relay::{relay, ResponseSink};
use crate::forward::rewrite::{build_forward_target, QuerySource};
use crate::forward::snapshot::{ensure_plain_http, InboundRequest, RequestSnapshot};
use crate::observability::metrics;

/// What the host should do after the interceptor ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Bypassed: the host pipeline handles the request.
    Continue,
    /// Forwarded and relayed: the host must not handle the request further.
    Handled,
}

impl Disposition {
    pub fn should_continue(self) -> bool {
        matches!(self, Self::Continue)
    }

    fn label(self) -> &'static str {
        match self {
            Self::Continue => "bypass",
            Self::Handled => "forward",
        }
    }
}

/// Forwarding settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct ForwardSettings {
    pub backend_url: String,
    pub strip_prefix: String,
    pub bypass: BypassPolicy,
    pub query_source: QuerySource,
    pub error_status_policy: ErrorStatusPolicy,
}

impl ForwardSettings {
    pub fn from_config(config: &ForwardingConfig) -> Self {
        Self {
            backend_url: config.backend_url.clone(),
            strip_prefix: config.strip_prefix.clone(),
            bypass: BypassPolicy::new(config.effective_bypass_paths()),
            query_source: config.query_source,
            error_status_policy: config.error_status_policy,
        }
    }
}

/// Forwards intercepted requests to the configured downstream.
///
/// Settings can be swapped at runtime; each request works against the
/// snapshot it loaded first.
pub struct ForwardingInterceptor {
    settings: ArcSwap<ForwardSettings>,
    downstream: Arc<dyn Downstream>,
}

impl ForwardingInterceptor {
    pub fn new(settings: ForwardSettings, downstream: Arc<dyn Downstream>) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            downstream,
        }
    }

    pub fn settings(&self) -> Arc<ForwardSettings> {
        self.settings.load_full()
    }

    pub fn update_settings(&self, settings: ForwardSettings) {
        tracing::info!(
            backend_url = %settings.backend_url,
            strip_prefix = %settings.strip_prefix,
            "Forwarding settings updated"
        );
        self.settings.store(Arc::new(settings));
    }

    /// Run the interceptor for one request.
    ///
    /// On error nothing has been written to `sink`; the returned error is
    /// always [`ForwardError::Failed`].
    pub async fn handle(
        &self,
        request: &mut dyn InboundRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<Disposition> {
        let settings = self.settings.load_full();
        match self.forward(&settings, request, sink).await {
            Ok(disposition) => {
                metrics::record_disposition(disposition.label());
                Ok(disposition)
            }
            Err(err) => {
                tracing::error!(error = %err, kind = err.kind(), "Forwarding failed");
                metrics::record_forward_error(err.kind());
                Err(err.into_forwarding_failure())
            }
        }
    }

    async fn forward(
        &self,
        settings: &ForwardSettings,
        request: &mut dyn InboundRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<Disposition> {
        ensure_plain_http(request)?;

        if settings.bypass.should_bypass(request.method(), request.path()) {
            tracing::debug!(path = %request.path(), "Bypassing forwarding");
            return Ok(Disposition::Continue);
        }

        let snapshot = RequestSnapshot::capture(request).await?;
        tracing::trace!(
            body = %String::from_utf8_lossy(snapshot.body()),
            "Captured request body"
        );

        let target = build_forward_target(
            &snapshot,
            &settings.backend_url,
            &settings.strip_prefix,
            settings.query_source,
        )?;
        tracing::info!(
            method = %target.method,
            original_path = %snapshot.original_path(),
            target_url = %target.url,
            "Forwarding request"
        );

        let started = Instant::now();
        let result = self.downstream.send(target).await;
        metrics::record_downstream(result.as_ref().ok().map(|r| r.status.as_u16()), started);

        let response = settings.error_status_policy.apply(result?)?;
        tracing::info!(
            status = response.status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Downstream response relayed"
        );

        if let Err(err) = relay(response, sink) {
            // The caller is gone or the response is already committed.
            tracing::warn!(error = %err, "Failed to relay downstream response");
            metrics::record_forward_error(err.kind());
        }

        Ok(Disposition::Handled)
    }
}
